use bevy_ecs::prelude::Schedule;

use fleet_core::ecs::{DrivingScenario, Kinematics, Vehicle, VehicleId, VehicleStatus};
use fleet_core::runner::{apply_command, run_tick, SimulatorCommand};
use fleet_core::systems::scenario_step::scenario_step_system;
use fleet_core::test_helpers::{create_test_world, test_params};

fn scenario_only_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(scenario_step_system);
    schedule
}

#[test]
fn every_tick_assigns_speed_consistent_with_status() {
    let params = test_params();
    let (mut world, _store) = create_test_world(&params, 0);
    let mut schedule = scenario_only_schedule();

    for tick in 1..=100 {
        run_tick(&mut world, &mut schedule, tick * 5_000);
        for (vehicle, kinematics) in world
            .query::<(&Vehicle, &Kinematics)>()
            .iter(&world)
        {
            match vehicle.scenario {
                DrivingScenario::NormalDriving => {
                    assert_eq!(vehicle.status, VehicleStatus::Normal);
                    assert!((30.0..60.0).contains(&kinematics.speed_kmh));
                }
                DrivingScenario::Overspeeding => {
                    assert_eq!(vehicle.status, VehicleStatus::Overspeeding);
                    assert!((70.0..90.0).contains(&kinematics.speed_kmh));
                }
                DrivingScenario::Accident => {
                    assert_eq!(vehicle.status, VehicleStatus::Accident);
                    assert_eq!(kinematics.speed_kmh, 0.0);
                }
                DrivingScenario::Stationary => {
                    assert_eq!(vehicle.status, VehicleStatus::Normal);
                    assert_eq!(kinematics.speed_kmh, 0.0);
                }
            }
        }
    }
}

#[test]
fn accident_scenario_never_resolves_on_its_own() {
    let params = test_params();
    let (mut world, _store) = create_test_world(&params, 0);
    let mut schedule = scenario_only_schedule();

    apply_command(
        &mut world,
        SimulatorCommand::SetScenario {
            vehicle_id: "V002".to_string(),
            scenario: DrivingScenario::Accident,
        },
    );

    for tick in 1..=50 {
        run_tick(&mut world, &mut schedule, tick * 5_000);
        let (vehicle, kinematics) = world
            .query::<(&VehicleId, &Vehicle, &Kinematics)>()
            .iter(&world)
            .find_map(|(id, v, k)| (id.0 == "V002").then_some((v, k)))
            .expect("V002");
        assert_eq!(vehicle.scenario, DrivingScenario::Accident);
        assert_eq!(vehicle.status, VehicleStatus::Accident);
        assert_eq!(kinematics.speed_kmh, 0.0);
    }
}

#[test]
fn external_reset_releases_an_accident_vehicle() {
    let params = test_params();
    let (mut world, _store) = create_test_world(&params, 0);
    let mut schedule = scenario_only_schedule();

    apply_command(
        &mut world,
        SimulatorCommand::SetScenario {
            vehicle_id: "V001".to_string(),
            scenario: DrivingScenario::Accident,
        },
    );
    run_tick(&mut world, &mut schedule, 5_000);

    apply_command(
        &mut world,
        SimulatorCommand::SetScenario {
            vehicle_id: "V001".to_string(),
            scenario: DrivingScenario::NormalDriving,
        },
    );
    run_tick(&mut world, &mut schedule, 10_000);

    let vehicle = world
        .query::<(&VehicleId, &Vehicle)>()
        .iter(&world)
        .find_map(|(id, v)| (id.0 == "V001").then_some(*v))
        .expect("V001");
    assert_ne!(vehicle.scenario, DrivingScenario::Accident);
}

#[test]
fn fleet_eventually_produces_an_overspeeding_tick() {
    let params = test_params();
    let (mut world, _store) = create_test_world(&params, 0);
    let mut schedule = scenario_only_schedule();

    let mut saw_overspeeding = false;
    for tick in 1..=200 {
        run_tick(&mut world, &mut schedule, tick * 5_000);
        saw_overspeeding |= world
            .query::<&Vehicle>()
            .iter(&world)
            .any(|v| v.scenario == DrivingScenario::Overspeeding);
        if saw_overspeeding {
            break;
        }
    }
    assert!(
        saw_overspeeding,
        "three vehicles at 10% per tick never overspeed in 200 ticks"
    );
}
