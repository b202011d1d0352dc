pub mod clock;
pub mod detection;
pub mod ecs;
pub mod fetch;
pub mod geo;
pub mod route;
pub mod routing;
pub mod runner;
pub mod scenario;
pub mod sinks;
pub mod systems;
pub mod telemetry;
pub mod telemetry_export;
#[cfg(feature = "test-helpers")]
pub mod test_helpers;
