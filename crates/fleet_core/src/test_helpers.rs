//! Test helpers for common test setup and utilities.
//!
//! This module provides shared fixtures to reduce duplication across test
//! files. Enabled by the default `test-helpers` feature.

use std::sync::Arc;

use bevy_ecs::prelude::World;

use crate::ecs::VehicleStatus;
use crate::geo::{Coordinate, Landmark};
use crate::routing::StraightLineProvider;
use crate::scenario::{build_fleet, FleetParams};
use crate::sinks::{FleetSinks, InMemoryFleetStore};
use crate::telemetry::{StoredVehicle, TelemetrySample};

/// Three landmarks a few kilometres apart, enough for retargeting.
pub fn test_landmarks() -> Vec<Landmark> {
    vec![
        Landmark::new("MG Road", 77.6093, 12.9750),
        Landmark::new("Koramangala", 77.6245, 12.9352),
        Landmark::new("Indiranagar", 77.6408, 12.9784),
    ]
}

pub fn test_params() -> FleetParams {
    FleetParams::default()
        .with_seed(42)
        .with_landmarks(test_landmarks())
}

/// A world built from `params` with in-memory sinks and a straight-line
/// route provider, plus the store handle for inspecting writes.
pub fn create_test_world(params: &FleetParams, now_ms: i64) -> (World, Arc<InMemoryFleetStore>) {
    let mut world = World::new();
    let (sinks, store) = FleetSinks::in_memory();
    build_fleet(
        &mut world,
        params,
        sinks,
        Arc::new(StraightLineProvider),
        now_ms,
    );
    (world, store)
}

pub fn sample(
    vehicle_id: &str,
    speed_kmh: f64,
    status: VehicleStatus,
    timestamp_ms: i64,
) -> TelemetrySample {
    TelemetrySample {
        vehicle_id: vehicle_id.to_string(),
        position: Coordinate::new(77.6093, 12.9750),
        speed_kmh,
        status,
        route_name: "MG Road to Koramangala".to_string(),
        timestamp_ms,
    }
}

pub fn stored(
    vehicle_id: &str,
    speed_kmh: f64,
    status: VehicleStatus,
    timestamp_ms: i64,
) -> StoredVehicle {
    StoredVehicle {
        vehicle_id: vehicle_id.to_string(),
        position: Coordinate::new(77.6093, 12.9750),
        speed_kmh,
        status,
        route_name: "MG Road to Koramangala".to_string(),
        timestamp_ms,
    }
}
