//! Command-line harness: wires the fleet core to in-memory collaborators,
//! runs a timed simulation, and optionally exports the telemetry to parquet.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fleet_core::runner::SimulatorRunner;
use fleet_core::scenario::FleetParams;
use fleet_core::sinks::FleetSinks;
use fleet_core::telemetry_export::{
    write_alerts_parquet, write_events_parquet, write_samples_parquet,
};

#[derive(Parser, Debug)]
#[command(about = "Run the fleet telemetry simulator against in-memory sinks")]
struct Args {
    /// Number of vehicles to simulate
    #[arg(long, default_value_t = 3)]
    vehicles: usize,

    /// Tick interval in milliseconds
    #[arg(long, default_value_t = 5000)]
    interval_ms: u64,

    /// How long to run before stopping, in seconds
    #[arg(long, default_value_t = 60)]
    duration_secs: u64,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// JSON settings file overriding max vehicles, speed limit and interval
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Directory to write parquet exports (samples, alerts, events) into
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// OSRM-compatible routing endpoint
    #[cfg(feature = "osrm")]
    #[arg(long, env = "OSRM_ENDPOINT")]
    osrm_endpoint: Option<String>,
}

/// Runtime settings, same shape the hosted settings table carries.
#[derive(Debug, Deserialize)]
struct Settings {
    max_vehicles: Option<usize>,
    overspeeding_limit: Option<f64>,
    update_interval_ms: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut params = FleetParams::default()
        .with_vehicle_count(args.vehicles)
        .with_update_interval_ms(args.interval_ms);
    if let Some(seed) = args.seed {
        params = params.with_seed(seed);
    }

    let settings = match &args.settings {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Some(serde_json::from_str::<Settings>(&raw)?)
        }
        None => None,
    };
    if let Some(settings) = &settings {
        if let Some(max) = settings.max_vehicles {
            params.max_vehicles = max;
        }
        if let Some(interval) = settings.update_interval_ms {
            params.update_interval_ms = interval;
        }
    }

    #[cfg(feature = "osrm")]
    if let Some(endpoint) = &args.osrm_endpoint {
        params = params.with_route_provider(fleet_core::routing::RouteProviderKind::Osrm {
            endpoint: endpoint.clone(),
        });
    }

    let (sinks, store) = FleetSinks::in_memory();
    if let Some(limit) = settings.as_ref().and_then(|s| s.overspeeding_limit) {
        store.set_overspeeding_limit(limit);
    }

    let mut runner = SimulatorRunner::new(params, sinks);
    runner.start()?;
    info!(duration_secs = args.duration_secs, "simulation running");
    std::thread::sleep(Duration::from_secs(args.duration_secs));

    let status = runner.status();
    let summary = runner.stop()?;

    println!(
        "Ran {} vehicles for {} s: {} ticks",
        status.vehicle_count, summary.runtime_secs, summary.ticks
    );
    println!(
        "Alerts: {}   Events: {}",
        store.alerts().len(),
        store.events().len()
    );
    for alert in store.alerts() {
        println!(
            "  {}  {:?}  {:?}  {:.0} km/h",
            alert.vehicle_id, alert.alert_type, alert.severity, alert.speed_at_alert
        );
    }

    if let Some(dir) = &args.export_dir {
        std::fs::create_dir_all(dir)?;
        if let Some(history) = runner.take_history() {
            write_samples_parquet(dir.join("samples.parquet"), &history)?;
        }
        write_alerts_parquet(dir.join("alerts.parquet"), &store.alerts())?;
        write_events_parquet(dir.join("events.parquet"), &store.events())?;
        info!(dir = %dir.display(), "telemetry exported");
    }

    Ok(())
}
