use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::detection::DEFAULT_SPEED_LIMIT_KMH;
use crate::geo::{Coordinate, Landmark};
use crate::routing::RouteProviderKind;

/// Default service-area center: MG Road, central Bengaluru.
const DEFAULT_CENTER_LNG: f64 = 77.6093;
const DEFAULT_CENTER_LAT: f64 = 12.9750;

/// Default bounding range around the center, ±0.15 degrees (~17 km radius).
const DEFAULT_LAT_RANGE: f64 = 0.15;
const DEFAULT_LNG_RANGE: f64 = 0.15;

pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 5_000;
const DEFAULT_VEHICLE_COUNT: usize = 3;
const DEFAULT_MAX_VEHICLES: usize = 6;
const DEFAULT_HISTORY_CAPACITY: usize = 10_000;

/// Recognizable Bengaluru locations used as route endpoints.
pub fn default_landmarks() -> Vec<Landmark> {
    vec![
        Landmark::new("MG Road", 77.6093, 12.9750),
        Landmark::new("Electronic City", 77.6633, 12.8456),
        Landmark::new("Whitefield", 77.7499, 12.9698),
        Landmark::new("Koramangala", 77.6245, 12.9352),
        Landmark::new("Indiranagar", 77.6408, 12.9784),
        Landmark::new("Marathahalli", 77.6974, 12.9592),
        Landmark::new("JP Nagar", 77.5852, 12.9078),
        Landmark::new("Hebbal", 77.5970, 13.0355),
    ]
}

/// Parameters for one simulation run.
#[derive(Debug, Clone)]
pub struct FleetParams {
    /// Number of vehicles to simulate. Rejected at start when above
    /// `max_vehicles`.
    pub vehicle_count: usize,
    pub max_vehicles: usize,
    /// Tick interval of the periodic driver.
    pub update_interval_ms: u64,
    /// Fallback speed limit when the settings store has none configured.
    pub overspeeding_limit_kmh: f64,
    pub center: Coordinate,
    pub lat_range: f64,
    pub lng_range: f64,
    pub landmarks: Vec<Landmark>,
    /// Seed for every stochastic component. `None` seeds from entropy.
    pub seed: Option<u64>,
    pub route_provider_kind: RouteProviderKind,
    pub history_capacity: usize,
}

impl Default for FleetParams {
    fn default() -> Self {
        Self {
            vehicle_count: DEFAULT_VEHICLE_COUNT,
            max_vehicles: DEFAULT_MAX_VEHICLES,
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            overspeeding_limit_kmh: DEFAULT_SPEED_LIMIT_KMH,
            center: Coordinate::new(DEFAULT_CENTER_LNG, DEFAULT_CENTER_LAT),
            lat_range: DEFAULT_LAT_RANGE,
            lng_range: DEFAULT_LNG_RANGE,
            landmarks: default_landmarks(),
            seed: None,
            route_provider_kind: RouteProviderKind::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl FleetParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_vehicle_count(mut self, count: usize) -> Self {
        self.vehicle_count = count;
        self
    }

    pub fn with_update_interval_ms(mut self, interval_ms: u64) -> Self {
        self.update_interval_ms = interval_ms;
        self
    }

    pub fn with_overspeeding_limit_kmh(mut self, limit: f64) -> Self {
        self.overspeeding_limit_kmh = limit;
        self
    }

    pub fn with_landmarks(mut self, landmarks: Vec<Landmark>) -> Self {
        self.landmarks = landmarks;
        self
    }

    pub fn with_route_provider(mut self, kind: RouteProviderKind) -> Self {
        self.route_provider_kind = kind;
        self
    }
}

/// The shared landmark list plus the RNG used to pick destinations, so
/// retargeting stays reproducible under a fixed seed.
#[derive(Resource)]
pub struct LandmarkSet {
    landmarks: Vec<Landmark>,
    rng: StdRng,
}

impl LandmarkSet {
    pub fn new(landmarks: Vec<Landmark>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { landmarks, rng }
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Uniformly random landmark whose name differs from `exclude`. `None`
    /// when no such landmark exists (single-landmark sets keep their
    /// current destination).
    pub fn pick_excluding(&mut self, exclude: &str) -> Option<Landmark> {
        let candidates: Vec<&Landmark> = self
            .landmarks
            .iter()
            .filter(|l| l.name != exclude)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..candidates.len());
        Some(candidates[index].clone())
    }
}

/// Fallback speed limit used when the settings store has none configured.
#[derive(Debug, Clone, Copy, Resource)]
pub struct DefaultSpeedLimit(pub f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_match_demo_configuration() {
        let params = FleetParams::default();
        assert_eq!(params.vehicle_count, 3);
        assert_eq!(params.max_vehicles, 6);
        assert_eq!(params.update_interval_ms, 5_000);
        assert_eq!(params.overspeeding_limit_kmh, 60.0);
        assert_eq!(params.landmarks.len(), 8);
    }

    #[test]
    fn pick_excluding_never_returns_excluded_landmark() {
        let mut set = LandmarkSet::new(default_landmarks(), Some(42));
        for _ in 0..50 {
            let picked = set.pick_excluding("MG Road").expect("candidate");
            assert_ne!(picked.name, "MG Road");
        }
    }

    #[test]
    fn pick_excluding_exhausted_set_returns_none() {
        let mut set = LandmarkSet::new(vec![Landmark::new("Only", 77.6, 12.9)], Some(1));
        assert!(set.pick_excluding("Only").is_none());
    }
}
