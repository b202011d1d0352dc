//! Shared setup for integration tests.

use bevy_ecs::prelude::{Schedule, World};

use fleet_core::ecs::{Kinematics, Vehicle, VehicleId, VehicleStatus};
use fleet_core::systems::ingest::ingest_system;
use fleet_core::systems::movement::movement_system;

/// A schedule running only the ingest system, so tests can pin vehicle
/// speed and status instead of sampling the scenario generator.
pub fn ingest_only_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(ingest_system);
    schedule
}

/// A schedule running only the motion driver.
pub fn movement_only_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(movement_system);
    schedule
}

/// Pin one vehicle's reported speed and status.
pub fn set_vehicle(world: &mut World, vehicle_id: &str, speed_kmh: f64, status: VehicleStatus) {
    let mut query = world.query::<(&VehicleId, &mut Kinematics, &mut Vehicle)>();
    for (id, mut kinematics, mut vehicle) in query.iter_mut(world) {
        if id.0 == vehicle_id {
            kinematics.speed_kmh = speed_kmh;
            vehicle.status = status;
            return;
        }
    }
    panic!("no vehicle {vehicle_id} in test world");
}
