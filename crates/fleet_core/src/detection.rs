//! Alert detection: pure classification of a telemetry sample against the
//! previously stored record.
//!
//! Nothing here touches a sink. [`process_sample`] returns the resolved
//! status plus any alert and informational events; the ingest system applies
//! them, which keeps every rule in this module directly testable.

use crate::ecs::VehicleStatus;
use crate::telemetry::{
    AlertEvent, AlertType, Severity, StoredVehicle, TelemetrySample, VehicleEvent,
    VehicleEventType,
};

/// Speed limit used when no configured limit is available.
pub const DEFAULT_SPEED_LIMIT_KMH: f64 = 60.0;

/// Sudden stop: previous speed at or above this, current speed zero.
const SUDDEN_STOP_MIN_PREV_KMH: f64 = 30.0;
/// Sudden stop must happen within this many seconds.
const SUDDEN_STOP_WINDOW_SECS: f64 = 3.0;
/// Extreme deceleration: speed drop strictly greater than this.
const DECELERATION_DROP_KMH: f64 = 40.0;
/// Extreme deceleration must happen within this many seconds.
const DECELERATION_WINDOW_SECS: f64 = 2.0;

/// True when the sample exceeds the speed limit (strictly greater; driving
/// exactly at the limit is legal).
pub fn check_overspeed(sample: &TelemetrySample, speed_limit_kmh: f64) -> bool {
    sample.speed_kmh > speed_limit_kmh
}

/// True when the sample pair looks like a crash. Two independent rules,
/// either sufficient:
///
/// (a) sudden stop: 30+ km/h to 0 within 3 seconds;
/// (b) extreme deceleration: a drop of more than 40 km/h within 2 seconds.
///
/// Without a previous record there is nothing to compare against.
pub fn detect_accident(current: &TelemetrySample, previous: &StoredVehicle) -> bool {
    let dt_secs = (current.timestamp_ms - previous.timestamp_ms) as f64 / 1000.0;

    if previous.speed_kmh >= SUDDEN_STOP_MIN_PREV_KMH
        && current.speed_kmh == 0.0
        && dt_secs <= SUDDEN_STOP_WINDOW_SECS
    {
        return true;
    }

    if previous.speed_kmh - current.speed_kmh > DECELERATION_DROP_KMH
        && dt_secs <= DECELERATION_WINDOW_SECS
    {
        return true;
    }

    false
}

/// Everything one sample's classification decided: the status to persist,
/// at most one alert, and any informational events.
#[derive(Debug, Clone)]
pub struct SampleOutcome {
    pub status: VehicleStatus,
    pub alert: Option<AlertEvent>,
    pub events: Vec<VehicleEvent>,
}

fn make_alert(sample: &TelemetrySample, alert_type: AlertType) -> AlertEvent {
    AlertEvent {
        vehicle_id: sample.vehicle_id.clone(),
        alert_type,
        position: sample.position,
        speed_at_alert: sample.speed_kmh,
        severity: Severity::for_alert(alert_type),
        created_at_ms: sample.timestamp_ms,
    }
}

fn make_event(
    sample: &TelemetrySample,
    event_type: VehicleEventType,
    previous_value: Option<String>,
    new_value: Option<String>,
    description: String,
) -> VehicleEvent {
    VehicleEvent {
        vehicle_id: sample.vehicle_id.clone(),
        event_type,
        position: sample.position,
        speed_kmh: sample.speed_kmh,
        previous_value,
        new_value,
        description,
        timestamp_ms: sample.timestamp_ms,
    }
}

/// Classify one sample against the previously stored record.
///
/// Rules, in order:
///
/// 1. Over the limit: status becomes `Overspeeding`. An alert fires only on
///    the transition into the episode (previous record absent or not already
///    overspeeding) so a vehicle holding 80 km/h raises exactly one alert;
///    an informational overspeeding event fires every tick the condition
///    holds.
/// 2. Accident: status becomes `Accident` and a high-severity alert always
///    fires. Detection is skipped entirely once the stored status is already
///    `Accident` (terminal state), so a crashed vehicle cannot re-alert.
/// 3. A `StatusChange` event whenever the reported status differs from the
///    stored one.
/// 4. Recovery: a stored `Overspeeding` status with the speed back under the
///    limit resets to `Normal`, with no event.
/// 5. A `RouteChange` event whenever the route name differs from the stored
///    one.
pub fn process_sample(
    current: &TelemetrySample,
    previous: Option<&StoredVehicle>,
    speed_limit_kmh: f64,
) -> SampleOutcome {
    let mut status = current.status;
    let mut alert = None;
    let mut events = Vec::new();

    let overspeed = check_overspeed(current, speed_limit_kmh);
    if overspeed {
        status = VehicleStatus::Overspeeding;
        let entering_episode =
            previous.map_or(true, |p| p.status != VehicleStatus::Overspeeding);
        if entering_episode {
            alert = Some(make_alert(current, AlertType::Overspeeding));
        }
        events.push(make_event(
            current,
            VehicleEventType::Overspeeding,
            Some(
                previous
                    .map(|p| p.status.to_string())
                    .unwrap_or_else(|| VehicleStatus::Normal.to_string()),
            ),
            Some(VehicleStatus::Overspeeding.to_string()),
            format!(
                "Vehicle exceeded speed limit of {speed_limit_kmh} km/h (current speed: {} km/h)",
                current.speed_kmh
            ),
        ));
    }

    if let Some(prev) = previous {
        if prev.status != VehicleStatus::Accident && detect_accident(current, prev) {
            status = VehicleStatus::Accident;
            alert = Some(make_alert(current, AlertType::Accident));
            events.push(make_event(
                current,
                VehicleEventType::Accident,
                Some(prev.status.to_string()),
                Some(VehicleStatus::Accident.to_string()),
                format!(
                    "Accident detected - speed dropped from {} km/h to {} km/h",
                    prev.speed_kmh, current.speed_kmh
                ),
            ));
        }

        if prev.status != current.status {
            events.push(make_event(
                current,
                VehicleEventType::StatusChange,
                Some(prev.status.to_string()),
                Some(current.status.to_string()),
                format!("Status changed from {} to {}", prev.status, current.status),
            ));
        }
    }

    // Recovery: back under the limit clears a lingering overspeeding status.
    // Runs after the accident rule so an accident this tick wins.
    if !overspeed && status == VehicleStatus::Overspeeding {
        status = VehicleStatus::Normal;
    }

    if let Some(prev) = previous {
        if prev.route_name != current.route_name {
            events.push(make_event(
                current,
                VehicleEventType::RouteChange,
                Some(prev.route_name.clone()),
                Some(current.route_name.clone()),
                format!("Route changed to {}", current.route_name),
            ));
        }
    }

    SampleOutcome {
        status,
        alert,
        events,
    }
}
