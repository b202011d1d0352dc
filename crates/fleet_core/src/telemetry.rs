//! Telemetry records exchanged with the persistence collaborators, plus the
//! in-memory history buffer and per-run ingest counters.

use std::collections::VecDeque;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::ecs::VehicleStatus;
use crate::geo::Coordinate;

/// One vehicle reading, produced once per vehicle per tick and consumed by
/// the alert detector before being handed to the vehicle store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub vehicle_id: String,
    pub position: Coordinate,
    pub speed_kmh: f64,
    pub status: VehicleStatus,
    pub route_name: String,
    pub timestamp_ms: i64,
}

/// The persisted record the vehicle store returns. Shape matches the sample,
/// but `status` is the detector-resolved status rather than the reported one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredVehicle {
    pub vehicle_id: String,
    pub position: Coordinate,
    pub speed_kmh: f64,
    pub status: VehicleStatus,
    pub route_name: String,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Overspeeding,
    Accident,
}

/// `Low` is reserved; the detector only ever produces `Medium` (overspeeding)
/// and `High` (accident).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn for_alert(alert_type: AlertType) -> Self {
        match alert_type {
            AlertType::Overspeeding => Self::Medium,
            AlertType::Accident => Self::High,
        }
    }
}

/// A raised safety alert, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub vehicle_id: String,
    pub alert_type: AlertType,
    pub position: Coordinate,
    pub speed_at_alert: f64,
    pub severity: Severity,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleEventType {
    Overspeeding,
    Accident,
    StatusChange,
    RouteChange,
}

/// Informational event log entry. Delivery is best-effort and never blocks
/// the alert or status-update path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleEvent {
    pub vehicle_id: String,
    pub event_type: VehicleEventType,
    pub position: Coordinate,
    pub speed_kmh: f64,
    pub previous_value: Option<String>,
    pub new_value: Option<String>,
    pub description: String,
    pub timestamp_ms: i64,
}

/// Rolling buffer of every sample produced during the run, capacity-bounded.
#[derive(Debug, Resource)]
pub struct TelemetryHistory {
    samples: VecDeque<TelemetrySample>,
    capacity: usize,
}

impl TelemetryHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, sample: TelemetrySample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn samples(&self) -> impl Iterator<Item = &TelemetrySample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for TelemetryHistory {
    fn default() -> Self {
        Self::with_capacity(10_000)
    }
}

/// Counters updated by the ingest system; reported in the run summary.
#[derive(Debug, Default, Clone, Copy, Resource)]
pub struct IngestStats {
    pub ticks: u64,
    pub samples_ingested: u64,
    pub alerts_emitted: u64,
    pub events_emitted: u64,
    pub store_failures: u64,
    pub sink_failures: u64,
}
