//! Scenario setup: run parameters, the per-vehicle driving-scenario
//! generator, and the builder that populates a world with vehicles and
//! resources for a simulation run.

mod build;
mod generator;
mod params;

pub use build::build_fleet;
pub use generator::{ScenarioConfig, ScenarioModel, ScenarioStep};
pub use params::{
    default_landmarks, DefaultSpeedLimit, FleetParams, LandmarkSet, DEFAULT_UPDATE_INTERVAL_MS,
};
