//! Drive the fleet deterministically for a simulated hour and print what the
//! pipeline produced.
//!
//! Run with: cargo run -p fleet_core --example fleet_run

use fleet_core::runner::{fleet_schedule, run_tick};
use fleet_core::telemetry::IngestStats;
use fleet_core::test_helpers::create_test_world;
use fleet_core::scenario::FleetParams;

fn main() {
    const TICKS: i64 = 720; // one hour at 5 s per tick
    const INTERVAL_MS: i64 = 5_000;

    let params = FleetParams::default().with_seed(123);
    let (mut world, store) = create_test_world(&params, 0);
    let mut schedule = fleet_schedule();

    for tick in 1..=TICKS {
        run_tick(&mut world, &mut schedule, tick * INTERVAL_MS);
    }

    let stats = *world.resource::<IngestStats>();
    println!(
        "--- Fleet run ({} vehicles, {} ticks, seed 123) ---",
        params.vehicle_count, TICKS
    );
    println!("Samples ingested: {}", stats.samples_ingested);
    println!("Alerts emitted:   {}", stats.alerts_emitted);
    println!("Events emitted:   {}", stats.events_emitted);

    println!("\nAlerts:");
    for alert in store.alerts() {
        println!(
            "  {}  {:?}  {:?}  {:.0} km/h  at ({:.4}, {:.4})  t={}s",
            alert.vehicle_id,
            alert.alert_type,
            alert.severity,
            alert.speed_at_alert,
            alert.position.lat,
            alert.position.lng,
            alert.created_at_ms / 1000,
        );
    }

    println!("\nFinal vehicle records:");
    for vehicle in store.vehicles() {
        println!(
            "  {}  {}  {:.0} km/h  {}",
            vehicle.vehicle_id, vehicle.status, vehicle.speed_kmh, vehicle.route_name,
        );
    }
}
