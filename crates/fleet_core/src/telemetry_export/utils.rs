use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::ecs::VehicleStatus;
use crate::telemetry::{AlertType, Severity, VehicleEventType};

pub(super) fn i64_field(name: &'static str) -> Field {
    Field::new(name, DataType::Int64, false)
}

pub(super) fn f64_field(name: &'static str) -> Field {
    Field::new(name, DataType::Float64, false)
}

pub(super) fn u8_field(name: &'static str) -> Field {
    Field::new(name, DataType::UInt8, false)
}

pub(super) fn utf8_field(name: &'static str) -> Field {
    Field::new(name, DataType::Utf8, false)
}

pub(super) fn nullable_utf8_field(name: &'static str) -> Field {
    Field::new(name, DataType::Utf8, true)
}

pub(super) fn write_record_batch<P: AsRef<Path>>(
    path: P,
    schema: Schema,
    arrays: Vec<ArrayRef>,
) -> Result<(), Box<dyn Error>> {
    let schema = Arc::new(schema);
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

pub(super) fn status_code(status: VehicleStatus) -> u8 {
    match status {
        VehicleStatus::Normal => 0,
        VehicleStatus::Overspeeding => 1,
        VehicleStatus::Accident => 2,
    }
}

pub(super) fn alert_type_code(alert_type: AlertType) -> u8 {
    match alert_type {
        AlertType::Overspeeding => 0,
        AlertType::Accident => 1,
    }
}

pub(super) fn severity_code(severity: Severity) -> u8 {
    match severity {
        Severity::Low => 0,
        Severity::Medium => 1,
        Severity::High => 2,
    }
}

pub(super) fn event_type_code(event_type: VehicleEventType) -> u8 {
    match event_type {
        VehicleEventType::Overspeeding => 0,
        VehicleEventType::Accident => 1,
        VehicleEventType::StatusChange => 2,
        VehicleEventType::RouteChange => 3,
    }
}
