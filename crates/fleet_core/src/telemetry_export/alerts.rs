use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, UInt8Array};
use arrow::datatypes::Schema;

use crate::telemetry::AlertEvent;

use super::utils::{
    alert_type_code, f64_field, i64_field, severity_code, u8_field, utf8_field, write_record_batch,
};

pub fn write_alerts_parquet<P: AsRef<Path>>(
    path: P,
    alerts: &[AlertEvent],
) -> Result<(), Box<dyn Error>> {
    let mut created_at_ms = Vec::with_capacity(alerts.len());
    let mut vehicle_id = Vec::with_capacity(alerts.len());
    let mut alert_type = Vec::with_capacity(alerts.len());
    let mut severity = Vec::with_capacity(alerts.len());
    let mut lng = Vec::with_capacity(alerts.len());
    let mut lat = Vec::with_capacity(alerts.len());
    let mut speed_at_alert = Vec::with_capacity(alerts.len());

    for alert in alerts {
        created_at_ms.push(alert.created_at_ms);
        vehicle_id.push(alert.vehicle_id.clone());
        alert_type.push(alert_type_code(alert.alert_type));
        severity.push(severity_code(alert.severity));
        lng.push(alert.position.lng);
        lat.push(alert.position.lat);
        speed_at_alert.push(alert.speed_at_alert);
    }

    let schema = Schema::new(vec![
        i64_field("created_at_ms"),
        utf8_field("vehicle_id"),
        u8_field("alert_type"),
        u8_field("severity"),
        f64_field("lng"),
        f64_field("lat"),
        f64_field("speed_at_alert"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(created_at_ms)),
        Arc::new(StringArray::from(vehicle_id)),
        Arc::new(UInt8Array::from(alert_type)),
        Arc::new(UInt8Array::from(severity)),
        Arc::new(Float64Array::from(lng)),
        Arc::new(Float64Array::from(lat)),
        Arc::new(Float64Array::from(speed_at_alert)),
    ];

    write_record_batch(path, schema, arrays)
}
