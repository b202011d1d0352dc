use std::fs::File;
use std::path::Path;

use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use fleet_core::ecs::VehicleStatus;
use fleet_core::geo::Coordinate;
use fleet_core::telemetry::{
    AlertEvent, AlertType, Severity, TelemetryHistory, VehicleEvent, VehicleEventType,
};
use fleet_core::telemetry_export::{
    write_alerts_parquet, write_events_parquet, write_samples_parquet,
};
use fleet_core::test_helpers::sample;

fn read_rows_and_columns(path: &Path) -> (usize, Vec<String>) {
    let file = File::open(path).expect("parquet file should exist");
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).expect("parquet reader should build");
    let columns = builder
        .schema()
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect();
    let reader = builder.build().expect("reader");
    let rows = reader
        .map(|batch| batch.expect("batch").num_rows())
        .sum();
    (rows, columns)
}

#[test]
fn samples_export_round_trips_row_count() {
    let mut history = TelemetryHistory::with_capacity(100);
    for tick in 1..=6 {
        history.record(sample("V001", 42.0, VehicleStatus::Normal, tick * 5_000));
        history.record(sample("V002", 85.0, VehicleStatus::Overspeeding, tick * 5_000));
    }

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("samples.parquet");
    write_samples_parquet(&path, &history).expect("write");

    let (rows, columns) = read_rows_and_columns(&path);
    assert_eq!(rows, 12);
    assert_eq!(
        columns,
        vec![
            "timestamp_ms",
            "vehicle_id",
            "lng",
            "lat",
            "speed_kmh",
            "status",
            "route_name"
        ]
    );
}

#[test]
fn alerts_export_round_trips_row_count() {
    let alerts = vec![
        AlertEvent {
            vehicle_id: "V001".to_string(),
            alert_type: AlertType::Overspeeding,
            position: Coordinate::new(77.6093, 12.9750),
            speed_at_alert: 85.0,
            severity: Severity::Medium,
            created_at_ms: 5_000,
        },
        AlertEvent {
            vehicle_id: "V002".to_string(),
            alert_type: AlertType::Accident,
            position: Coordinate::new(77.6245, 12.9352),
            speed_at_alert: 0.0,
            severity: Severity::High,
            created_at_ms: 10_000,
        },
    ];

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("alerts.parquet");
    write_alerts_parquet(&path, &alerts).expect("write");

    let (rows, columns) = read_rows_and_columns(&path);
    assert_eq!(rows, 2);
    assert!(columns.contains(&"alert_type".to_string()));
    assert!(columns.contains(&"severity".to_string()));
}

#[test]
fn events_export_handles_missing_values() {
    let events = vec![VehicleEvent {
        vehicle_id: "V001".to_string(),
        event_type: VehicleEventType::RouteChange,
        position: Coordinate::new(77.6093, 12.9750),
        speed_kmh: 40.0,
        previous_value: None,
        new_value: Some("MG Road to Whitefield".to_string()),
        description: "Route changed to MG Road to Whitefield".to_string(),
        timestamp_ms: 5_000,
    }];

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("events.parquet");
    write_events_parquet(&path, &events).expect("write");

    let (rows, columns) = read_rows_and_columns(&path);
    assert_eq!(rows, 1);
    assert!(columns.contains(&"previous_value".to_string()));
    assert!(columns.contains(&"description".to_string()));
}

#[test]
fn empty_history_exports_an_empty_file() {
    let history = TelemetryHistory::default();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("empty.parquet");
    write_samples_parquet(&path, &history).expect("write");

    let (rows, _columns) = read_rows_and_columns(&path);
    assert_eq!(rows, 0);
}
