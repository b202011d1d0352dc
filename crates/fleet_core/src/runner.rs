//! Simulation runner: owns the tick thread, the vehicle world, and the
//! start/stop/status control surface the hosting process uses.
//!
//! One `SimulatorRunner` is one run. The hosting process is responsible for
//! holding at most one instance; the runner itself only guards against
//! double-start and double-stop. Stopping cancels the periodic timer with no
//! pending tick; in-flight route fetches are not awaited and their late
//! results die with the world.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use bevy_ecs::prelude::World;
use bevy_ecs::schedule::{IntoSystemConfigs, Schedule};
use thiserror::Error;
use tracing::{info, warn};

use crate::clock::TickClock;
use crate::ecs::{DrivingScenario, Vehicle, VehicleId};
use crate::routing::{build_route_provider, RouteProvider};
use crate::scenario::{build_fleet, FleetParams};
use crate::sinks::FleetSinks;
use crate::telemetry::TelemetryHistory;
use crate::systems::ingest::ingest_system;
use crate::systems::movement::movement_system;
use crate::systems::scenario_step::scenario_step_system;

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("simulator is already running")]
    AlreadyRunning,

    #[error("simulator is not running")]
    NotRunning,

    #[error("vehicle count {requested} exceeds configured maximum {max}")]
    TooManyVehicles { requested: usize, max: usize },

    #[error("failed to spawn tick thread: {0}")]
    Spawn(String),
}

/// Control messages applied at the start of the next tick.
#[derive(Debug, Clone)]
pub enum SimulatorCommand {
    /// Overwrite a vehicle's driving scenario. This is the external reset
    /// path out of the absorbing `Accident` scenario.
    SetScenario {
        vehicle_id: String,
        scenario: DrivingScenario,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorStatus {
    pub is_running: bool,
    pub vehicle_count: usize,
    pub started_at_ms: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub runtime_secs: u64,
    pub ticks: u64,
}

/// The tick schedule: motion, then scenario generation, then ingestion, in a
/// fixed chain so each tick's sample reflects that tick's movement and
/// freshly assigned speed.
pub fn fleet_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((movement_system, scenario_step_system, ingest_system).chain());
    schedule
}

/// Advance the clock to `now_ms` and run one tick of the schedule.
pub fn run_tick(world: &mut World, schedule: &mut Schedule, now_ms: i64) {
    world.resource_mut::<TickClock>().advance_to(now_ms);
    schedule.run(world);
}

/// Apply a control command to the world. Unknown vehicle ids are logged and
/// ignored.
pub fn apply_command(world: &mut World, command: SimulatorCommand) {
    match command {
        SimulatorCommand::SetScenario {
            vehicle_id,
            scenario,
        } => {
            let mut found = false;
            let mut query = world.query::<(&VehicleId, &mut Vehicle)>();
            for (id, mut vehicle) in query.iter_mut(world) {
                if id.0 == vehicle_id {
                    vehicle.scenario = scenario;
                    found = true;
                    break;
                }
            }
            if !found {
                warn!(vehicle = %vehicle_id, "set-scenario command for unknown vehicle");
            }
        }
    }
}

#[derive(Default)]
struct RunnerShared {
    ticks: AtomicU64,
}

/// What the tick thread hands back when it exits.
struct RunArtifacts {
    ticks: u64,
    history: TelemetryHistory,
}

pub struct SimulatorRunner {
    params: FleetParams,
    sinks: FleetSinks,
    provider_override: Option<Arc<dyn RouteProvider>>,
    handle: Option<JoinHandle<RunArtifacts>>,
    stop_tx: Option<Sender<()>>,
    command_tx: Option<Sender<SimulatorCommand>>,
    shared: Arc<RunnerShared>,
    started_at_ms: Option<i64>,
    vehicle_count: usize,
    last_history: Option<TelemetryHistory>,
}

impl SimulatorRunner {
    pub fn new(params: FleetParams, sinks: FleetSinks) -> Self {
        Self {
            params,
            sinks,
            provider_override: None,
            handle: None,
            stop_tx: None,
            command_tx: None,
            shared: Arc::new(RunnerShared::default()),
            started_at_ms: None,
            vehicle_count: 0,
            last_history: None,
        }
    }

    /// Use the given provider instead of building one from
    /// `params.route_provider_kind`. Mainly for tests and embedding.
    pub fn with_route_provider(mut self, provider: Arc<dyn RouteProvider>) -> Self {
        self.provider_override = Some(provider);
        self
    }

    /// Spawn the tick thread. Errors when already running or when the
    /// configured vehicle count exceeds the maximum.
    pub fn start(&mut self) -> Result<(), SimulatorError> {
        if self.handle.is_some() {
            return Err(SimulatorError::AlreadyRunning);
        }
        if self.params.vehicle_count > self.params.max_vehicles {
            return Err(SimulatorError::TooManyVehicles {
                requested: self.params.vehicle_count,
                max: self.params.max_vehicles,
            });
        }

        let provider = self
            .provider_override
            .clone()
            .unwrap_or_else(|| build_route_provider(&self.params.route_provider_kind));
        let (stop_tx, stop_rx) = channel();
        let (command_tx, command_rx) = channel();
        let params = self.params.clone();
        let sinks = self.sinks.clone();
        let shared = Arc::clone(&self.shared);

        self.shared.ticks.store(0, Ordering::Relaxed);
        let handle = std::thread::Builder::new()
            .name("fleet-sim-tick".to_string())
            .spawn(move || tick_loop(params, sinks, provider, stop_rx, command_rx, shared))
            .map_err(|e| SimulatorError::Spawn(e.to_string()))?;

        self.handle = Some(handle);
        self.stop_tx = Some(stop_tx);
        self.command_tx = Some(command_tx);
        self.started_at_ms = Some(TickClock::wall_clock_ms());
        self.vehicle_count = self.params.vehicle_count;
        info!(
            vehicles = self.vehicle_count,
            interval_ms = self.params.update_interval_ms,
            "simulator started"
        );
        Ok(())
    }

    /// Cancel the periodic timer and join the tick thread.
    pub fn stop(&mut self) -> Result<RunSummary, SimulatorError> {
        let handle = self.handle.take().ok_or(SimulatorError::NotRunning)?;
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        self.command_tx = None;
        let artifacts = handle.join().unwrap_or_else(|_| {
            warn!("tick thread panicked");
            RunArtifacts {
                ticks: self.shared.ticks.load(Ordering::Relaxed),
                history: TelemetryHistory::default(),
            }
        });
        let ticks = artifacts.ticks;
        self.last_history = Some(artifacts.history);
        let runtime_secs = self
            .started_at_ms
            .take()
            .map(|started| ((TickClock::wall_clock_ms() - started).max(0) / 1000) as u64)
            .unwrap_or(0);
        info!(runtime_secs, ticks, "simulator stopped");
        Ok(RunSummary {
            runtime_secs,
            ticks,
        })
    }

    pub fn status(&self) -> SimulatorStatus {
        SimulatorStatus {
            is_running: self.handle.is_some(),
            vehicle_count: self.vehicle_count,
            started_at_ms: self.started_at_ms,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::Relaxed)
    }

    /// Enqueue a control command for the next tick.
    pub fn send_command(&self, command: SimulatorCommand) -> Result<(), SimulatorError> {
        let command_tx = self.command_tx.as_ref().ok_or(SimulatorError::NotRunning)?;
        command_tx
            .send(command)
            .map_err(|_| SimulatorError::NotRunning)
    }

    /// The telemetry history of the most recently stopped run, if any.
    pub fn take_history(&mut self) -> Option<TelemetryHistory> {
        self.last_history.take()
    }
}

impl Drop for SimulatorRunner {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.stop();
        }
    }
}

fn tick_loop(
    params: FleetParams,
    sinks: FleetSinks,
    provider: Arc<dyn RouteProvider>,
    stop_rx: Receiver<()>,
    command_rx: Receiver<SimulatorCommand>,
    shared: Arc<RunnerShared>,
) -> RunArtifacts {
    let mut world = World::new();
    build_fleet(
        &mut world,
        &params,
        sinks,
        provider,
        TickClock::wall_clock_ms(),
    );
    let mut schedule = fleet_schedule();
    let interval = Duration::from_millis(params.update_interval_ms.max(1));
    let mut ticks = 0u64;

    loop {
        match stop_rx.recv_timeout(interval) {
            // Stop requested, or the runner was dropped.
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
        while let Ok(command) = command_rx.try_recv() {
            apply_command(&mut world, command);
        }
        run_tick(&mut world, &mut schedule, TickClock::wall_clock_ms());
        ticks += 1;
        shared.ticks.store(ticks, Ordering::Relaxed);
    }

    let history = world.remove_resource::<TelemetryHistory>().unwrap_or_default();
    RunArtifacts { ticks, history }
}
