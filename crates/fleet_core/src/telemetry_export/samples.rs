use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, UInt8Array};
use arrow::datatypes::Schema;

use crate::telemetry::TelemetryHistory;

use super::utils::{f64_field, i64_field, status_code, u8_field, utf8_field, write_record_batch};

/// Write every sample in the history buffer, one row per vehicle per tick.
pub fn write_samples_parquet<P: AsRef<Path>>(
    path: P,
    history: &TelemetryHistory,
) -> Result<(), Box<dyn Error>> {
    let mut timestamp_ms = Vec::with_capacity(history.len());
    let mut vehicle_id = Vec::with_capacity(history.len());
    let mut lng = Vec::with_capacity(history.len());
    let mut lat = Vec::with_capacity(history.len());
    let mut speed_kmh = Vec::with_capacity(history.len());
    let mut status = Vec::with_capacity(history.len());
    let mut route_name = Vec::with_capacity(history.len());

    for sample in history.samples() {
        timestamp_ms.push(sample.timestamp_ms);
        vehicle_id.push(sample.vehicle_id.clone());
        lng.push(sample.position.lng);
        lat.push(sample.position.lat);
        speed_kmh.push(sample.speed_kmh);
        status.push(status_code(sample.status));
        route_name.push(sample.route_name.clone());
    }

    let schema = Schema::new(vec![
        i64_field("timestamp_ms"),
        utf8_field("vehicle_id"),
        f64_field("lng"),
        f64_field("lat"),
        f64_field("speed_kmh"),
        u8_field("status"),
        utf8_field("route_name"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(timestamp_ms)),
        Arc::new(StringArray::from(vehicle_id)),
        Arc::new(Float64Array::from(lng)),
        Arc::new(Float64Array::from(lat)),
        Arc::new(Float64Array::from(speed_kmh)),
        Arc::new(UInt8Array::from(status)),
        Arc::new(StringArray::from(route_name)),
    ];

    write_record_batch(path, schema, arrays)
}
