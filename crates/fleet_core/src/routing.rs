//! Pluggable route providers: trait abstraction for routing backends.
//!
//! Three implementations, selectable via [`RouteProviderKind`]:
//!
//! - **`StraightLineProvider`**: two-point origin-to-destination polyline.
//!   Zero dependencies; also the universal fallback when a backend fails.
//! - **`OsrmRouteProvider`** (feature `osrm`): calls a local/remote
//!   OSRM-compatible HTTP endpoint.
//! - **`PrecomputedRouteProvider`** (feature `precomputed`): loads a
//!   serialized route table from disk.
//!
//! The provider is stored as an `Arc<dyn RouteProvider>` ECS resource so the
//! background fetch threads can hold clones of it.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::geo::{distance_meters, Coordinate};
use crate::route::Polyline;

/// Free-flow speed used to estimate a duration when the backend does not
/// report one.
const ESTIMATED_CITY_SPEED_KMH: f64 = 40.0;

/// Result of a route query between two coordinates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteResult {
    /// Road-following waypoints from origin to destination, length >= 2.
    pub polyline: Polyline,
    /// Road-network distance in metres.
    pub distance_m: f64,
    /// Free-flow travel time in seconds (from the backend or estimated).
    pub duration_secs: f64,
}

/// Which routing backend to use. Serializes into run configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub enum RouteProviderKind {
    /// Straight origin-to-destination line, zero external dependencies.
    #[default]
    StraightLine,
    /// OSRM-compatible HTTP endpoint (e.g. `"http://localhost:5000"`).
    #[cfg(feature = "osrm")]
    Osrm { endpoint: String },
    /// Pre-computed route table loaded from a binary file at startup.
    #[cfg(feature = "precomputed")]
    Precomputed { path: String },
}

/// Trait for routing backends. Implementations must be `Send + Sync` so the
/// provider can be shared with background fetch threads.
pub trait RouteProvider: Send + Sync {
    /// Compute a route between two coordinates. Returns `None` if no route
    /// could be produced; callers substitute the straight line.
    fn route(&self, origin: Coordinate, destination: Coordinate) -> Option<RouteResult>;
}

/// ECS resource wrapping a shared route provider.
#[derive(Resource, Clone)]
pub struct RouteProviderResource(pub Arc<dyn RouteProvider>);

/// Directional cache key for an origin-destination pair, quantized to 1e-5
/// degrees (about a metre) so float jitter does not defeat the cache.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoutePairKey(i64, i64, i64, i64);

impl RoutePairKey {
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        const SCALE: f64 = 1e5;
        Self(
            (origin.lng * SCALE).round() as i64,
            (origin.lat * SCALE).round() as i64,
            (destination.lng * SCALE).round() as i64,
            (destination.lat * SCALE).round() as i64,
        )
    }
}

// ---------------------------------------------------------------------------
// Straight-line provider (always available)
// ---------------------------------------------------------------------------

/// Routes as the two-point straight line between origin and destination.
/// Degrades route fidelity but always succeeds, which keeps the simulation
/// live when no road-network backend is configured or reachable.
pub struct StraightLineProvider;

impl RouteProvider for StraightLineProvider {
    fn route(&self, origin: Coordinate, destination: Coordinate) -> Option<RouteResult> {
        let distance_m = distance_meters(origin, destination);
        let duration_secs = if distance_m > 0.0 {
            (distance_m / 1000.0 / ESTIMATED_CITY_SPEED_KMH) * 3600.0
        } else {
            0.0
        };
        Some(RouteResult {
            polyline: vec![origin, destination],
            distance_m,
            duration_secs,
        })
    }
}

// ---------------------------------------------------------------------------
// OSRM provider (behind `osrm` feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "osrm")]
pub mod osrm {
    use super::*;
    use reqwest::blocking::Client;
    use std::time::Duration;

    /// Routes via an OSRM-compatible HTTP endpoint. The 5 s client timeout
    /// doubles as the route-fetch timeout: a slow backend reads as a failed
    /// fetch and the caller falls back to the straight line.
    pub struct OsrmRouteProvider {
        client: Client,
        endpoint: String,
    }

    impl OsrmRouteProvider {
        pub fn new(endpoint: &str) -> Self {
            let client = Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("failed to build HTTP client");
            Self {
                client,
                endpoint: endpoint.trim_end_matches('/').to_string(),
            }
        }
    }

    /// Minimal OSRM JSON response structures.
    #[derive(Deserialize)]
    struct OsrmResponse {
        code: String,
        routes: Option<Vec<OsrmRoute>>,
    }

    #[derive(Deserialize)]
    struct OsrmRoute {
        distance: f64, // metres
        duration: f64, // seconds
        geometry: OsrmGeometry,
    }

    #[derive(Deserialize)]
    struct OsrmGeometry {
        coordinates: Vec<Vec<f64>>, // [lng, lat]
    }

    impl RouteProvider for OsrmRouteProvider {
        fn route(&self, origin: Coordinate, destination: Coordinate) -> Option<RouteResult> {
            let url = format!(
                "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson",
                self.endpoint, origin.lng, origin.lat, destination.lng, destination.lat,
            );

            let resp: OsrmResponse = match self.client.get(&url).send() {
                Ok(r) => match r.json() {
                    Ok(j) => j,
                    Err(_) => return None,
                },
                Err(_) => return None,
            };

            if resp.code != "Ok" {
                return None;
            }

            let route = resp.routes?.into_iter().next()?;

            let polyline: Polyline = route
                .geometry
                .coordinates
                .iter()
                .filter(|c| c.len() >= 2)
                .map(|c| Coordinate::new(c[0], c[1]))
                .collect();
            if polyline.len() < 2 {
                return None;
            }

            Some(RouteResult {
                polyline,
                distance_m: route.distance,
                duration_secs: route.duration,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Pre-computed provider (behind `precomputed` feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "precomputed")]
pub mod precomputed {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    /// Pre-computed route table: origin-destination pair to route, loaded
    /// from disk. Lets a demo replay real road geometry with no network.
    pub struct PrecomputedRouteProvider {
        table: HashMap<RoutePairKey, RouteResult>,
    }

    impl PrecomputedRouteProvider {
        /// Load from a bincode-serialized file.
        pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
            let data = fs::read(path)?;
            let table: HashMap<RoutePairKey, RouteResult> = bincode::deserialize(&data)?;
            Ok(Self { table })
        }

        /// Create from an in-memory table (useful for tests).
        pub fn from_table(table: HashMap<RoutePairKey, RouteResult>) -> Self {
            Self { table }
        }

        /// Serialize a table to a file.
        pub fn save_to_file(
            table: &HashMap<RoutePairKey, RouteResult>,
            path: &str,
        ) -> Result<(), Box<dyn std::error::Error>> {
            let data = bincode::serialize(table)?;
            fs::write(path, data)?;
            Ok(())
        }
    }

    impl RouteProvider for PrecomputedRouteProvider {
        fn route(&self, origin: Coordinate, destination: Coordinate) -> Option<RouteResult> {
            self.table.get(&RoutePairKey::new(origin, destination)).cloned()
        }
    }
}

// ---------------------------------------------------------------------------
// Caching wrapper
// ---------------------------------------------------------------------------

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// LRU-cached wrapper around any [`RouteProvider`].
///
/// Cache key is the directional [`RoutePairKey`]. On cache miss the inner
/// provider is queried; on inner failure the optional straight-line fallback
/// is tried before returning `None`. Concurrent population of the same key
/// is tolerated as last-writer-wins.
pub struct CachedRouteProvider {
    inner: Box<dyn RouteProvider>,
    cache: Mutex<LruCache<RoutePairKey, RouteResult>>,
    fallback_to_straight_line: bool,
}

impl CachedRouteProvider {
    pub fn new(
        inner: Box<dyn RouteProvider>,
        capacity: usize,
        fallback_to_straight_line: bool,
    ) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity.max(1)).expect("cache capacity must be > 0"),
            )),
            fallback_to_straight_line,
        }
    }
}

impl RouteProvider for CachedRouteProvider {
    fn route(&self, origin: Coordinate, destination: Coordinate) -> Option<RouteResult> {
        let key = RoutePairKey::new(origin, destination);

        // Fast path: cache hit
        {
            let mut cache = self.cache.lock().ok()?;
            if let Some(cached) = cache.get(&key) {
                return Some(cached.clone());
            }
        }

        // Slow path: query inner provider
        let result = self.inner.route(origin, destination).or_else(|| {
            if self.fallback_to_straight_line {
                StraightLineProvider.route(origin, destination)
            } else {
                None
            }
        });

        // Store in cache
        if let Some(ref route) = result {
            if let Ok(mut cache) = self.cache.lock() {
                cache.put(key, route.clone());
            }
        }

        result
    }
}

// ---------------------------------------------------------------------------
// Factory: build a provider from RouteProviderKind
// ---------------------------------------------------------------------------

/// Default route cache capacity. The landmark set yields at most a few dozen
/// origin-destination pairs, so this is generous.
#[cfg(any(feature = "osrm", feature = "precomputed"))]
const DEFAULT_ROUTE_CACHE_CAPACITY: usize = 1_024;

/// Construct a shared [`RouteProvider`] from a [`RouteProviderKind`].
///
/// - `StraightLine` is returned without caching (it is pure arithmetic).
/// - `Osrm` and `Precomputed` providers are wrapped in a
///   [`CachedRouteProvider`] with straight-line fallback on failure.
pub fn build_route_provider(kind: &RouteProviderKind) -> Arc<dyn RouteProvider> {
    match kind {
        RouteProviderKind::StraightLine => Arc::new(StraightLineProvider),

        #[cfg(feature = "osrm")]
        RouteProviderKind::Osrm { endpoint } => {
            let inner = Box::new(osrm::OsrmRouteProvider::new(endpoint));
            Arc::new(CachedRouteProvider::new(
                inner,
                DEFAULT_ROUTE_CACHE_CAPACITY,
                true,
            ))
        }

        #[cfg(feature = "precomputed")]
        RouteProviderKind::Precomputed { path } => {
            match precomputed::PrecomputedRouteProvider::from_file(path) {
                Ok(provider) => {
                    let inner = Box::new(provider);
                    Arc::new(CachedRouteProvider::new(
                        inner,
                        DEFAULT_ROUTE_CACHE_CAPACITY,
                        true,
                    ))
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path,
                        error = %e,
                        "failed to load pre-computed route table, falling back to straight lines"
                    );
                    Arc::new(StraightLineProvider)
                }
            }
        }
    }
}
