//! Motion driver: advances every vehicle along its assigned route each tick.
//!
//! Per-vehicle states are implicit in the data: no active route and no
//! in-flight fetch means "no route" (a fetch is requested); no active route
//! with an in-flight fetch means "awaiting fetch" (straight-line fallback
//! movement keeps the tick from blocking); an active route means
//! "following" (walker interpolation). Completed fetches are drained at the
//! start of the tick and applied only if the vehicle still targets the same
//! destination.

use std::sync::Arc;

use bevy_ecs::prelude::{Entity, Query, Res, ResMut};
use tracing::debug;

use crate::clock::TickClock;
use crate::ecs::{ActiveRoute, GeoPosition, Kinematics, RouteAssignment, RouteState};
use crate::fetch::RouteFetchQueue;
use crate::geo::{bearing_deg, planar_distance_deg, BoundingBox};
use crate::route::{heading_at_progress, nearest_vertex_progress, position_along_route};
use crate::routing::RouteProviderResource;
use crate::scenario::LandmarkSet;

/// Arrival when the planar distance to the final route vertex drops below
/// this (degrees; roughly 100 m at city latitudes). Deliberately compared in
/// degree space to match the straight-line fallback's angular steps.
const ARRIVAL_THRESHOLD_DEG: f64 = 0.001;

/// Angular step of the straight-line fallback: degrees travelled per km/h of
/// speed per second.
const DEG_PER_KMH_SECOND: f64 = 0.000_277;

pub fn movement_system(
    clock: Res<TickClock>,
    bounds: Res<BoundingBox>,
    provider: Res<RouteProviderResource>,
    mut fetches: ResMut<RouteFetchQueue>,
    mut landmarks: ResMut<LandmarkSet>,
    mut vehicles: Query<(
        Entity,
        &mut GeoPosition,
        &mut Kinematics,
        &mut RouteAssignment,
        &mut RouteState,
    )>,
) {
    // Apply completed route fetches before moving anyone.
    for outcome in fetches.drain() {
        let Ok((_, _, _, assignment, mut route_state)) = vehicles.get_mut(outcome.entity) else {
            // Vehicle no longer part of the run; drop the stale result.
            continue;
        };
        if route_state.active.is_some() {
            continue;
        }
        if assignment.target.position != outcome.destination {
            debug!(route = %assignment.route_name, "discarding stale route fetch");
            continue;
        }
        let polyline = match outcome.result {
            Some(result) if result.polyline.len() >= 2 => result.polyline,
            _ => {
                // Fetch failed: degrade to the straight origin-target line
                // rather than failing the tick.
                debug!(
                    route = %assignment.route_name,
                    error = outcome.error.as_deref().unwrap_or("empty polyline"),
                    "route fetch failed, using straight line"
                );
                vec![outcome.origin, outcome.destination]
            }
        };
        route_state.active = Some(ActiveRoute {
            polyline,
            started_at_ms: clock.now_ms(),
            progress: 0.0,
        });
    }

    for (entity, mut position, mut kinematics, mut assignment, mut route_state) in &mut vehicles {
        let mut arrived = false;

        if let Some(route) = route_state.active.as_mut() {
            let elapsed_secs = clock.elapsed_secs_since(route.started_at_ms);
            let new_position =
                position_along_route(&route.polyline, kinematics.speed_kmh, elapsed_secs);
            position.0 = new_position;
            route.progress = nearest_vertex_progress(&route.polyline, new_position);
            if let Some(heading) = heading_at_progress(&route.polyline, route.progress) {
                kinematics.direction_deg = heading;
            }
            if let Some(&end) = route.polyline.last() {
                arrived = planar_distance_deg(new_position, end) < ARRIVAL_THRESHOLD_DEG;
            }
        } else {
            if !fetches.is_inflight(entity) {
                fetches.request(
                    entity,
                    position.0,
                    assignment.target.position,
                    Arc::clone(&provider.0),
                );
            }
            // Straight-line fallback toward the target while the fetch is
            // out, at a constant angular step.
            let step_deg = kinematics.speed_kmh.max(0.0) * DEG_PER_KMH_SECOND * clock.delta_secs();
            if step_deg > 0.0 && position.0 != assignment.target.position {
                kinematics.direction_deg = bearing_deg(position.0, assignment.target.position);
                let heading_rad = kinematics.direction_deg.to_radians();
                position.0.lat += heading_rad.cos() * step_deg;
                position.0.lng += heading_rad.sin() * step_deg;
            }
        }

        if arrived {
            if let Some(next) = landmarks.pick_excluding(&assignment.target.name) {
                let origin = assignment.target.clone();
                *assignment = RouteAssignment::new(origin, next);
                route_state.active = None;
            }
        }

        position.0 = bounds.clamp(position.0);
    }
}
