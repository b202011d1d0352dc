use bevy_ecs::prelude::World;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

use crate::clock::TickClock;
use crate::ecs::{
    DrivingScenario, GeoPosition, Kinematics, RouteAssignment, RouteState, Vehicle, VehicleId,
    VehicleStatus,
};
use crate::fetch::RouteFetchQueue;
use crate::geo::{bearing_deg, BoundingBox, Coordinate, Landmark};
use crate::routing::{RouteProvider, RouteProviderResource};
use crate::scenario::generator::ScenarioModel;
use crate::scenario::params::{DefaultSpeedLimit, FleetParams, LandmarkSet};
use crate::sinks::FleetSinks;
use crate::telemetry::{IngestStats, TelemetryHistory};

/// Populate `world` with one vehicle entity per configured vehicle and every
/// resource the tick systems need. `now_ms` becomes the clock's starting
/// timestamp; vehicles begin at landmarks with a random destination
/// assigned, so the first tick immediately requests routes.
pub fn build_fleet(
    world: &mut World,
    params: &FleetParams,
    sinks: FleetSinks,
    provider: Arc<dyn RouteProvider>,
    now_ms: i64,
) {
    world.insert_resource(TickClock::starting_at(now_ms));
    world.insert_resource(TelemetryHistory::with_capacity(params.history_capacity));
    world.insert_resource(IngestStats::default());
    world.insert_resource(ScenarioModel::new(params.seed));
    world.insert_resource(LandmarkSet::new(
        params.landmarks.clone(),
        params.seed.map(|seed| seed ^ 0x5eed_cafe),
    ));
    world.insert_resource(RouteProviderResource(provider));
    world.insert_resource(RouteFetchQueue::new());
    world.insert_resource(BoundingBox::from_center(
        params.center,
        params.lat_range,
        params.lng_range,
    ));
    world.insert_resource(DefaultSpeedLimit(params.overspeeding_limit_kmh));
    world.insert_resource(sinks);

    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(0xcafe_babe)),
        None => StdRng::from_entropy(),
    };

    for index in 0..params.vehicle_count {
        let origin = spawn_landmark(params, &mut rng, index);
        let target = initial_target(&params.landmarks, &mut rng, &origin);
        let assignment = RouteAssignment::new(origin.clone(), target.clone());

        let speed_kmh = rng.gen_range(30.0..60.0);
        let direction_deg = if target.position == origin.position {
            rng.gen_range(0.0..360.0)
        } else {
            bearing_deg(origin.position, target.position)
        };

        world.spawn((
            VehicleId(format!("V{:03}", index + 1)),
            GeoPosition(origin.position),
            Kinematics {
                speed_kmh,
                direction_deg,
            },
            Vehicle {
                status: VehicleStatus::Normal,
                scenario: DrivingScenario::NormalDriving,
            },
            assignment,
            RouteState::default(),
        ));
    }
}

/// Starting landmark for the vehicle at `index`: landmarks are assigned
/// round-robin; with no landmarks configured, vehicles spread randomly
/// around the center.
fn spawn_landmark(params: &FleetParams, rng: &mut StdRng, index: usize) -> Landmark {
    if params.landmarks.is_empty() {
        let lat = params.center.lat + (rng.gen::<f64>() - 0.5) * params.lat_range;
        let lng = params.center.lng + (rng.gen::<f64>() - 0.5) * params.lng_range;
        Landmark {
            name: format!("Route {}", index + 1),
            position: Coordinate::new(lng, lat),
        }
    } else {
        params.landmarks[index % params.landmarks.len()].clone()
    }
}

/// Uniformly random destination differing from the origin; falls back to the
/// origin itself when the landmark set offers no alternative.
fn initial_target(landmarks: &[Landmark], rng: &mut StdRng, origin: &Landmark) -> Landmark {
    let candidates: Vec<&Landmark> = landmarks.iter().filter(|l| l.name != origin.name).collect();
    if candidates.is_empty() {
        origin.clone()
    } else {
        candidates[rng.gen_range(0..candidates.len())].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::StraightLineProvider;

    #[test]
    fn build_fleet_spawns_configured_vehicle_count() {
        let mut world = World::new();
        let (sinks, _store) = FleetSinks::in_memory();
        let params = FleetParams::default().with_seed(42).with_vehicle_count(5);
        build_fleet(
            &mut world,
            &params,
            sinks,
            Arc::new(StraightLineProvider),
            1_000,
        );

        let mut ids: Vec<String> = world
            .query::<&VehicleId>()
            .iter(&world)
            .map(|id| id.0.clone())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["V001", "V002", "V003", "V004", "V005"]);

        for (assignment, position) in world
            .query::<(&RouteAssignment, &GeoPosition)>()
            .iter(&world)
        {
            assert_ne!(assignment.origin.name, assignment.target.name);
            assert_eq!(position.0, assignment.origin.position);
            assert!(assignment
                .route_name
                .contains(assignment.target.name.as_str()));
        }
    }

    #[test]
    fn build_fleet_inserts_all_tick_resources() {
        let mut world = World::new();
        let (sinks, _store) = FleetSinks::in_memory();
        let params = FleetParams::default().with_seed(1);
        build_fleet(
            &mut world,
            &params,
            sinks,
            Arc::new(StraightLineProvider),
            0,
        );

        assert!(world.get_resource::<TickClock>().is_some());
        assert!(world.get_resource::<TelemetryHistory>().is_some());
        assert!(world.get_resource::<ScenarioModel>().is_some());
        assert!(world.get_resource::<LandmarkSet>().is_some());
        assert!(world.get_resource::<RouteFetchQueue>().is_some());
        assert!(world.get_resource::<BoundingBox>().is_some());
        assert!(world.get_resource::<FleetSinks>().is_some());
        assert_eq!(
            world.resource::<DefaultSpeedLimit>().0,
            params.overspeeding_limit_kmh
        );
    }
}
