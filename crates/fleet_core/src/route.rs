//! Route walking: interpolated position along a polyline given a speed and
//! the time elapsed since traversal began.
//!
//! Segment interpolation is planar over geodesic coordinates. At city scale
//! (segments of tens to hundreds of metres) the error is far below the
//! arrival threshold, so this is a deliberate approximation rather than a
//! geodesic computation.

use crate::geo::{bearing_deg, distance_meters, planar_distance_deg, Coordinate};

/// An ordered road-following path, length >= 1. First vertex is the origin,
/// last vertex is the destination.
pub type Polyline = Vec<Coordinate>;

/// Position after travelling at `speed_kmh` for `elapsed_secs` from the
/// start of `route`.
///
/// Degenerate routes (fewer than two vertices) pin the vehicle to the first
/// vertex. Once the travelled distance exceeds the route length the result
/// clamps to the final vertex; the vehicle waits there until it is
/// reassigned. Negative speed or elapsed time is treated as zero, so the
/// walker never moves backwards.
pub fn position_along_route(route: &[Coordinate], speed_kmh: f64, elapsed_secs: f64) -> Coordinate {
    let Some(&first) = route.first() else {
        return Coordinate::default();
    };
    if route.len() < 2 {
        return first;
    }

    let speed_kmh = speed_kmh.max(0.0);
    let elapsed_secs = elapsed_secs.max(0.0);
    // km/h over seconds, converted to metres.
    let target_m = (speed_kmh / 3600.0) * elapsed_secs * 1000.0;

    let mut cumulative_m = 0.0;
    for window in route.windows(2) {
        let (p1, p2) = (window[0], window[1]);
        let segment_m = distance_meters(p1, p2);
        if cumulative_m + segment_m >= target_m {
            let remaining_m = target_m - cumulative_m;
            let ratio = if segment_m > 0.0 {
                remaining_m / segment_m
            } else {
                0.0
            };
            return Coordinate {
                lng: p1.lng + (p2.lng - p1.lng) * ratio,
                lat: p1.lat + (p2.lat - p1.lat) * ratio,
            };
        }
        cumulative_m += segment_m;
    }

    *route.last().expect("route has at least two vertices")
}

/// Fraction of the route traversed, as `nearest vertex index / (len - 1)`.
///
/// A nearest-vertex approximation: with ticks frequent relative to vehicle
/// speed it tracks true arclength progress closely enough for marker
/// rotation and progress display. Not suitable for safety decisions.
pub fn nearest_vertex_progress(route: &[Coordinate], position: Coordinate) -> f64 {
    if route.len() < 2 {
        return 0.0;
    }
    let mut nearest = 0usize;
    let mut best = f64::INFINITY;
    for (i, &vertex) in route.iter().enumerate() {
        let d = planar_distance_deg(vertex, position);
        if d < best {
            best = d;
            nearest = i;
        }
    }
    nearest as f64 / (route.len() - 1) as f64
}

/// Heading at the given progress fraction: the bearing from the vertex at
/// `floor(progress * (len - 1))` to the next vertex. `None` for degenerate
/// routes.
pub fn heading_at_progress(route: &[Coordinate], progress: f64) -> Option<f64> {
    if route.len() < 2 {
        return None;
    }
    let last = route.len() - 1;
    let index = ((progress.clamp(0.0, 1.0) * last as f64).floor() as usize).min(last - 1);
    Some(bearing_deg(route[index], route[index + 1]))
}

/// Total route length in metres.
pub fn total_length_meters(route: &[Coordinate]) -> f64 {
    route
        .windows(2)
        .map(|w| distance_meters(w[0], w[1]))
        .sum()
}
