//! Collaborator interfaces the pipeline writes through: vehicle store,
//! alert sink, event sink, and the settings lookup for the configured speed
//! limit. The hosted implementations (database tables, message queues) live
//! outside this crate; an in-memory implementation ships here for the CLI
//! and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bevy_ecs::prelude::Resource;
use thiserror::Error;

use crate::ecs::VehicleStatus;
use crate::telemetry::{AlertEvent, StoredVehicle, TelemetrySample, VehicleEvent};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("storage error: {0}")]
    Storage(String),
}

/// Vehicle record of truth. `get` must return the previously stored record
/// so the detector can compare current against previous; that retrieval is
/// a correctness dependency, not an optimization.
pub trait VehicleStore: Send + Sync {
    /// Persist the sample under the detector-resolved status, replacing any
    /// prior record for the vehicle.
    fn upsert(&self, sample: &TelemetrySample, status: VehicleStatus)
        -> Result<StoredVehicle, SinkError>;

    fn get(&self, vehicle_id: &str) -> Result<Option<StoredVehicle>, SinkError>;
}

pub trait AlertSink: Send + Sync {
    fn insert_alert(&self, alert: &AlertEvent) -> Result<(), SinkError>;
}

/// Informational event log. Failures are logged and swallowed by the caller;
/// event delivery never blocks the status-update or alert path.
pub trait EventSink: Send + Sync {
    fn insert_event(&self, event: &VehicleEvent) -> Result<(), SinkError>;
}

/// Most recent runtime-configured settings.
pub trait SettingsStore: Send + Sync {
    /// Configured overspeeding limit, if any. Callers fall back to the
    /// default when absent.
    fn overspeeding_limit_kmh(&self) -> Option<f64>;
}

/// The collaborator bundle the ingest system writes through, shared with the
/// tick thread.
#[derive(Resource, Clone)]
pub struct FleetSinks {
    pub vehicles: Arc<dyn VehicleStore>,
    pub alerts: Arc<dyn AlertSink>,
    pub events: Arc<dyn EventSink>,
    pub settings: Arc<dyn SettingsStore>,
}

impl FleetSinks {
    /// One in-memory store backing all four interfaces. Returns the bundle
    /// plus a handle for inspecting what was written.
    pub fn in_memory() -> (Self, Arc<InMemoryFleetStore>) {
        let store = Arc::new(InMemoryFleetStore::new());
        let sinks = Self {
            vehicles: Arc::clone(&store) as Arc<dyn VehicleStore>,
            alerts: Arc::clone(&store) as Arc<dyn AlertSink>,
            events: Arc::clone(&store) as Arc<dyn EventSink>,
            settings: Arc::clone(&store) as Arc<dyn SettingsStore>,
        };
        (sinks, store)
    }
}

/// In-memory stand-in for the hosted tables: vehicles keyed by id, plus
/// append-only alert and event logs and an optional configured speed limit.
#[derive(Debug, Default)]
pub struct InMemoryFleetStore {
    vehicles: Mutex<HashMap<String, StoredVehicle>>,
    alerts: Mutex<Vec<AlertEvent>>,
    events: Mutex<Vec<VehicleEvent>>,
    overspeeding_limit: Mutex<Option<f64>>,
}

impl InMemoryFleetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_overspeeding_limit(&self, limit_kmh: f64) {
        if let Ok(mut guard) = self.overspeeding_limit.lock() {
            *guard = Some(limit_kmh);
        }
    }

    pub fn alerts(&self) -> Vec<AlertEvent> {
        self.alerts.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn events(&self) -> Vec<VehicleEvent> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn vehicles(&self) -> Vec<StoredVehicle> {
        self.vehicles
            .lock()
            .map(|g| g.values().cloned().collect())
            .unwrap_or_default()
    }
}

fn poisoned(what: &str) -> SinkError {
    SinkError::Storage(format!("{what} lock poisoned"))
}

impl VehicleStore for InMemoryFleetStore {
    fn upsert(
        &self,
        sample: &TelemetrySample,
        status: VehicleStatus,
    ) -> Result<StoredVehicle, SinkError> {
        let record = StoredVehicle {
            vehicle_id: sample.vehicle_id.clone(),
            position: sample.position,
            speed_kmh: sample.speed_kmh,
            status,
            route_name: sample.route_name.clone(),
            timestamp_ms: sample.timestamp_ms,
        };
        let mut vehicles = self.vehicles.lock().map_err(|_| poisoned("vehicles"))?;
        vehicles.insert(record.vehicle_id.clone(), record.clone());
        Ok(record)
    }

    fn get(&self, vehicle_id: &str) -> Result<Option<StoredVehicle>, SinkError> {
        let vehicles = self.vehicles.lock().map_err(|_| poisoned("vehicles"))?;
        Ok(vehicles.get(vehicle_id).cloned())
    }
}

impl AlertSink for InMemoryFleetStore {
    fn insert_alert(&self, alert: &AlertEvent) -> Result<(), SinkError> {
        let mut alerts = self.alerts.lock().map_err(|_| poisoned("alerts"))?;
        alerts.push(alert.clone());
        Ok(())
    }
}

impl EventSink for InMemoryFleetStore {
    fn insert_event(&self, event: &VehicleEvent) -> Result<(), SinkError> {
        let mut events = self.events.lock().map_err(|_| poisoned("events"))?;
        events.push(event.clone());
        Ok(())
    }
}

impl SettingsStore for InMemoryFleetStore {
    fn overspeeding_limit_kmh(&self) -> Option<f64> {
        self.overspeeding_limit.lock().ok().and_then(|g| *g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    fn sample(id: &str, speed: f64, ts: i64) -> TelemetrySample {
        TelemetrySample {
            vehicle_id: id.to_string(),
            position: Coordinate::new(77.6, 12.97),
            speed_kmh: speed,
            status: VehicleStatus::Normal,
            route_name: "MG Road to Whitefield".to_string(),
            timestamp_ms: ts,
        }
    }

    #[test]
    fn upsert_replaces_previous_record() {
        let store = InMemoryFleetStore::new();
        assert!(store.get("V001").expect("get").is_none());

        store
            .upsert(&sample("V001", 40.0, 1_000), VehicleStatus::Normal)
            .expect("upsert");
        store
            .upsert(&sample("V001", 80.0, 6_000), VehicleStatus::Overspeeding)
            .expect("upsert");

        let record = store.get("V001").expect("get").expect("record");
        assert_eq!(record.speed_kmh, 80.0);
        assert_eq!(record.status, VehicleStatus::Overspeeding);
        assert_eq!(store.vehicles().len(), 1);
    }

    #[test]
    fn settings_default_to_unconfigured() {
        let store = InMemoryFleetStore::new();
        assert_eq!(store.overspeeding_limit_kmh(), None);
        store.set_overspeeding_limit(75.0);
        assert_eq!(store.overspeeding_limit_kmh(), Some(75.0));
    }
}
