//! Geographic primitives: WGS84 coordinates, haversine distance, bearings,
//! and the bounding box that keeps simulated vehicles inside the service area.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 point in degrees. Longitude first to match the common
/// GeoJSON-style `[lng, lat]` ordering used by routing backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// A named point of interest. Vehicles start at landmarks and drive between
/// them; the landmark name labels the active route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub name: String,
    pub position: Coordinate,
}

impl Landmark {
    pub fn new(name: impl Into<String>, lng: f64, lat: f64) -> Self {
        Self {
            name: name.into(),
            position: Coordinate::new(lng, lat),
        }
    }
}

/// Great-circle distance in metres (haversine).
///
/// Symmetric, zero for identical points, and total over antipodal input.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lng.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lng.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Initial great-circle bearing from `from` to `to`, in degrees clockwise
/// from geographic north, normalized to `[0, 360)`.
///
/// All heading values in this crate use this convention, for both the
/// straight-line fallback and route-following movement.
pub fn bearing_deg(from: Coordinate, to: Coordinate) -> f64 {
    let (lat1, lat2) = (from.lat.to_radians(), to.lat.to_radians());
    let dlon = (to.lng - from.lng).to_radians();
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let deg = y.atan2(x).to_degrees();
    (deg + 360.0) % 360.0
}

/// Euclidean distance in degree space. Only meaningful against other
/// degree-based thresholds (arrival detection, nearest-vertex search), not
/// as a physical distance.
pub fn planar_distance_deg(a: Coordinate, b: Coordinate) -> f64 {
    let dlng = a.lng - b.lng;
    let dlat = a.lat - b.lat;
    (dlng * dlng + dlat * dlat).sqrt()
}

/// Service-area bounds. Vehicle positions are clamped into this box after
/// every movement update so interpolation can never run away.
#[derive(Debug, Clone, Copy, PartialEq, Resource, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl BoundingBox {
    pub fn from_center(center: Coordinate, lat_range: f64, lng_range: f64) -> Self {
        Self {
            lat_min: center.lat - lat_range,
            lat_max: center.lat + lat_range,
            lng_min: center.lng - lng_range,
            lng_max: center.lng + lng_range,
        }
    }

    pub fn clamp(&self, position: Coordinate) -> Coordinate {
        Coordinate {
            lng: position.lng.clamp(self.lng_min, self.lng_max),
            lat: position.lat.clamp(self.lat_min, self.lat_max),
        }
    }

    pub fn contains(&self, position: Coordinate) -> bool {
        position.lat >= self.lat_min
            && position.lat <= self.lat_max
            && position.lng >= self.lng_min
            && position.lng <= self.lng_max
    }
}
