use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, UInt8Array};
use arrow::datatypes::Schema;

use crate::telemetry::VehicleEvent;

use super::utils::{
    event_type_code, f64_field, i64_field, nullable_utf8_field, u8_field, utf8_field,
    write_record_batch,
};

pub fn write_events_parquet<P: AsRef<Path>>(
    path: P,
    events: &[VehicleEvent],
) -> Result<(), Box<dyn Error>> {
    let mut timestamp_ms = Vec::with_capacity(events.len());
    let mut vehicle_id = Vec::with_capacity(events.len());
    let mut event_type = Vec::with_capacity(events.len());
    let mut lng = Vec::with_capacity(events.len());
    let mut lat = Vec::with_capacity(events.len());
    let mut speed_kmh = Vec::with_capacity(events.len());
    let mut previous_value = Vec::with_capacity(events.len());
    let mut new_value = Vec::with_capacity(events.len());
    let mut description = Vec::with_capacity(events.len());

    for event in events {
        timestamp_ms.push(event.timestamp_ms);
        vehicle_id.push(event.vehicle_id.clone());
        event_type.push(event_type_code(event.event_type));
        lng.push(event.position.lng);
        lat.push(event.position.lat);
        speed_kmh.push(event.speed_kmh);
        previous_value.push(event.previous_value.clone());
        new_value.push(event.new_value.clone());
        description.push(event.description.clone());
    }

    let schema = Schema::new(vec![
        i64_field("timestamp_ms"),
        utf8_field("vehicle_id"),
        u8_field("event_type"),
        f64_field("lng"),
        f64_field("lat"),
        f64_field("speed_kmh"),
        nullable_utf8_field("previous_value"),
        nullable_utf8_field("new_value"),
        utf8_field("description"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(timestamp_ms)),
        Arc::new(StringArray::from(vehicle_id)),
        Arc::new(UInt8Array::from(event_type)),
        Arc::new(Float64Array::from(lng)),
        Arc::new(Float64Array::from(lat)),
        Arc::new(Float64Array::from(speed_kmh)),
        Arc::new(StringArray::from(previous_value)),
        Arc::new(StringArray::from(new_value)),
        Arc::new(StringArray::from(description)),
    ];

    write_record_batch(path, schema, arrays)
}
