mod support;

use fleet_core::detection::process_sample;
use fleet_core::ecs::VehicleStatus;
use fleet_core::runner::run_tick;
use fleet_core::sinks::{InMemoryFleetStore, VehicleStore};
use fleet_core::telemetry::{AlertType, VehicleEventType};
use fleet_core::test_helpers::{create_test_world, sample, test_params};

use support::{ingest_only_schedule, set_vehicle};

/// Feed one sample through detection and the store the way the ingest
/// system does: read previous, classify, persist resolved status.
fn ingest_one(store: &InMemoryFleetStore, speed_kmh: f64, status: VehicleStatus, ts_ms: i64) {
    let current = sample("V001", speed_kmh, status, ts_ms);
    let previous = store.get("V001").expect("get");
    let outcome = process_sample(&current, previous.as_ref(), 60.0);
    store.upsert(&current, outcome.status).expect("upsert");
    if let Some(alert) = outcome.alert {
        use fleet_core::sinks::AlertSink;
        store.insert_alert(&alert).expect("alert");
    }
}

#[test]
fn one_alert_per_overspeeding_episode() {
    let store = InMemoryFleetStore::new();

    // Five consecutive overspeeding ticks: exactly one alert.
    for tick in 0..5 {
        ingest_one(
            &store,
            85.0,
            VehicleStatus::Overspeeding,
            (tick + 1) * 5_000,
        );
    }
    assert_eq!(store.alerts().len(), 1);
    assert_eq!(store.alerts()[0].alert_type, AlertType::Overspeeding);

    // Recovery tick clears the stored status.
    ingest_one(&store, 40.0, VehicleStatus::Normal, 30_000);
    let record = store.get("V001").expect("get").expect("record");
    assert_eq!(record.status, VehicleStatus::Normal);

    // A fresh episode alerts again.
    ingest_one(&store, 88.0, VehicleStatus::Overspeeding, 35_000);
    assert_eq!(store.alerts().len(), 2);
}

#[test]
fn overspeeding_pipeline_through_ingest_system() {
    let params = test_params();
    let (mut world, store) = create_test_world(&params, 0);
    let mut schedule = ingest_only_schedule();

    // Three ticks over the limit: one alert, an informational event per tick.
    let mut now_ms = 0;
    for _ in 0..3 {
        now_ms += 5_000;
        set_vehicle(&mut world, "V001", 85.0, VehicleStatus::Overspeeding);
        run_tick(&mut world, &mut schedule, now_ms);
    }

    let alerts = store.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].vehicle_id, "V001");
    assert_eq!(alerts[0].speed_at_alert, 85.0);

    let overspeeding_events = store
        .events()
        .iter()
        .filter(|e| e.vehicle_id == "V001" && e.event_type == VehicleEventType::Overspeeding)
        .count();
    assert_eq!(overspeeding_events, 3);

    // Untouched vehicles never alert: the builder assigns normal speeds.
    assert!(alerts.iter().all(|a| a.vehicle_id == "V001"));

    // Recovery resets the stored status without an alert.
    now_ms += 5_000;
    set_vehicle(&mut world, "V001", 40.0, VehicleStatus::Normal);
    run_tick(&mut world, &mut schedule, now_ms);
    let record = store
        .vehicles()
        .into_iter()
        .find(|v| v.vehicle_id == "V001")
        .expect("record");
    assert_eq!(record.status, VehicleStatus::Normal);
    assert_eq!(store.alerts().len(), 1);
}

#[test]
fn accident_pipeline_alerts_once_and_stays_terminal() {
    let params = test_params();
    let (mut world, store) = create_test_world(&params, 0);
    let mut schedule = ingest_only_schedule();

    // Establish a fast-moving record.
    set_vehicle(&mut world, "V001", 80.0, VehicleStatus::Overspeeding);
    run_tick(&mut world, &mut schedule, 5_000);

    // Sudden stop two seconds later: 80 -> 0 trips both accident rules.
    set_vehicle(&mut world, "V001", 0.0, VehicleStatus::Accident);
    run_tick(&mut world, &mut schedule, 7_000);

    let accident_alerts: Vec<_> = store
        .alerts()
        .into_iter()
        .filter(|a| a.alert_type == AlertType::Accident)
        .collect();
    assert_eq!(accident_alerts.len(), 1);
    assert_eq!(accident_alerts[0].vehicle_id, "V001");

    // The vehicle stays stopped; no further accident alerts.
    for tick in 0..3 {
        run_tick(&mut world, &mut schedule, 9_000 + tick * 2_000);
    }
    let accident_alerts = store
        .alerts()
        .into_iter()
        .filter(|a| a.alert_type == AlertType::Accident)
        .count();
    assert_eq!(accident_alerts, 1);

    let record = store
        .vehicles()
        .into_iter()
        .find(|v| v.vehicle_id == "V001")
        .expect("record");
    assert_eq!(record.status, VehicleStatus::Accident);
}

#[test]
fn configured_speed_limit_overrides_default() {
    let params = test_params();
    let (mut world, store) = create_test_world(&params, 0);
    let mut schedule = ingest_only_schedule();

    // Raise the limit above the vehicle's speed: no alert.
    store.set_overspeeding_limit(100.0);
    set_vehicle(&mut world, "V001", 85.0, VehicleStatus::Overspeeding);
    run_tick(&mut world, &mut schedule, 5_000);
    assert!(store.alerts().is_empty());

    // Drop it below: the same speed now alerts. Other vehicles may cross a
    // 50 km/h limit too, so only V001's alerts are counted.
    store.set_overspeeding_limit(50.0);
    set_vehicle(&mut world, "V001", 85.0, VehicleStatus::Overspeeding);
    run_tick(&mut world, &mut schedule, 10_000);
    let v001_alerts = store
        .alerts()
        .iter()
        .filter(|a| a.vehicle_id == "V001")
        .count();
    assert_eq!(v001_alerts, 1);
}

#[test]
fn history_records_every_sample() {
    let params = test_params();
    let (mut world, _store) = create_test_world(&params, 0);
    let mut schedule = ingest_only_schedule();

    for tick in 1..=4 {
        run_tick(&mut world, &mut schedule, tick * 5_000);
    }

    let history = world.resource::<fleet_core::telemetry::TelemetryHistory>();
    // Three vehicles, four ticks.
    assert_eq!(history.len(), 12);

    let stats = world.resource::<fleet_core::telemetry::IngestStats>();
    assert_eq!(stats.ticks, 4);
    assert_eq!(stats.samples_ingested, 12);
    assert_eq!(stats.store_failures, 0);
}
