//! ECS components: one entity per tracked vehicle, created by the scenario
//! builder at run start and discarded when the run stops.

use std::fmt;

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

use crate::geo::{Coordinate, Landmark};
use crate::route::Polyline;

/// Persisted safety status of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Normal,
    Overspeeding,
    Accident,
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::Overspeeding => "overspeeding",
            Self::Accident => "accident",
        };
        f.write_str(s)
    }
}

/// Driving scenario assigned by the generator. `Accident` is absorbing: the
/// generator never leaves it; only an external [`crate::runner::SimulatorCommand`]
/// reset does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrivingScenario {
    NormalDriving,
    Overspeeding,
    Accident,
    Stationary,
}

/// Stable external identifier, unique among tracked vehicles.
#[derive(Debug, Clone, PartialEq, Eq, Component)]
pub struct VehicleId(pub String);

/// Current position in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct GeoPosition(pub Coordinate);

/// Velocity magnitude and heading (degrees clockwise from north).
#[derive(Debug, Clone, Copy, Component)]
pub struct Kinematics {
    pub speed_kmh: f64,
    pub direction_deg: f64,
}

/// Safety status and driving scenario of one vehicle.
#[derive(Debug, Clone, Copy, Component)]
pub struct Vehicle {
    pub status: VehicleStatus,
    pub scenario: DrivingScenario,
}

/// The landmark pair the vehicle is currently driving between, and the
/// human-readable label of that route.
#[derive(Debug, Clone, Component)]
pub struct RouteAssignment {
    pub origin: Landmark,
    pub target: Landmark,
    pub route_name: String,
}

impl RouteAssignment {
    pub fn new(origin: Landmark, target: Landmark) -> Self {
        let route_name = format!("{} to {}", origin.name, target.name);
        Self {
            origin,
            target,
            route_name,
        }
    }
}

/// A fetched polyline the vehicle is following. `started_at_ms` marks when
/// traversal began; `progress` is recomputed from position every tick
/// (nearest-vertex approximation), never advanced on its own.
#[derive(Debug, Clone)]
pub struct ActiveRoute {
    pub polyline: Polyline,
    pub started_at_ms: i64,
    pub progress: f64,
}

/// Motion-driver route state. `active` absent means the vehicle is either
/// waiting on a route fetch or about to request one; while absent, movement
/// falls back to straight-line bearing steps.
#[derive(Debug, Clone, Default, Component)]
pub struct RouteState {
    pub active: Option<ActiveRoute>,
}
