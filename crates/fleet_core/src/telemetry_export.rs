//! Parquet export of the run's telemetry for offline analysis: samples,
//! alerts, and vehicle events, one file each.

mod alerts;
mod events;
mod samples;
mod utils;

pub use alerts::write_alerts_parquet;
pub use events::write_events_parquet;
pub use samples::write_samples_parquet;
