//! Ingestion: builds one telemetry sample per vehicle, runs alert detection
//! against the previously stored record, and applies the outcome through the
//! collaborator sinks.
//!
//! A failure for one vehicle never aborts the others. The vehicle store is
//! the record of truth, so a store failure skips that vehicle's alert and
//! event delivery; alert and event writes themselves are best-effort.

use bevy_ecs::prelude::{Query, Res, ResMut};
use tracing::{debug, error, info, warn};

use crate::clock::TickClock;
use crate::detection;
use crate::ecs::{GeoPosition, Kinematics, RouteAssignment, Vehicle, VehicleId};
use crate::scenario::DefaultSpeedLimit;
use crate::sinks::FleetSinks;
use crate::telemetry::{IngestStats, TelemetryHistory, TelemetrySample};

pub fn ingest_system(
    clock: Res<TickClock>,
    sinks: Res<FleetSinks>,
    fallback_limit: Res<DefaultSpeedLimit>,
    mut history: ResMut<TelemetryHistory>,
    mut stats: ResMut<IngestStats>,
    vehicles: Query<(&VehicleId, &GeoPosition, &Kinematics, &Vehicle, &RouteAssignment)>,
) {
    let speed_limit_kmh = sinks
        .settings
        .overspeeding_limit_kmh()
        .unwrap_or(fallback_limit.0);

    for (vehicle_id, position, kinematics, vehicle, assignment) in &vehicles {
        let sample = TelemetrySample {
            vehicle_id: vehicle_id.0.clone(),
            position: position.0,
            speed_kmh: kinematics.speed_kmh,
            status: vehicle.status,
            route_name: assignment.route_name.clone(),
            timestamp_ms: clock.now_ms(),
        };
        history.record(sample.clone());
        stats.samples_ingested += 1;

        let previous = match sinks.vehicles.get(&sample.vehicle_id) {
            Ok(previous) => previous,
            Err(err) => {
                error!(vehicle = %sample.vehicle_id, %err, "vehicle lookup failed, skipping vehicle this tick");
                stats.store_failures += 1;
                continue;
            }
        };

        let outcome = detection::process_sample(&sample, previous.as_ref(), speed_limit_kmh);

        if let Err(err) = sinks.vehicles.upsert(&sample, outcome.status) {
            error!(vehicle = %sample.vehicle_id, %err, "vehicle upsert failed, skipping alert delivery");
            stats.store_failures += 1;
            continue;
        }

        if let Some(alert) = outcome.alert {
            info!(
                vehicle = %alert.vehicle_id,
                alert_type = ?alert.alert_type,
                speed_kmh = alert.speed_at_alert,
                "alert raised"
            );
            match sinks.alerts.insert_alert(&alert) {
                Ok(()) => stats.alerts_emitted += 1,
                Err(err) => {
                    warn!(vehicle = %alert.vehicle_id, %err, "alert insert failed");
                    stats.sink_failures += 1;
                }
            }
        }

        for event in &outcome.events {
            match sinks.events.insert_event(event) {
                Ok(()) => stats.events_emitted += 1,
                Err(err) => {
                    // Event logging is best-effort.
                    debug!(vehicle = %event.vehicle_id, %err, "event insert failed");
                    stats.sink_failures += 1;
                }
            }
        }
    }

    stats.ticks += 1;
}
