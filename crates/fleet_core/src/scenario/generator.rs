use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ecs::{DrivingScenario, VehicleStatus};

/// Transition probabilities and speed ranges of the scenario state machine.
/// Probabilities are evaluated once per vehicle per tick, independently
/// across vehicles and ticks.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioConfig {
    pub p_normal_to_overspeeding: f64,
    pub p_overspeeding_to_normal: f64,
    pub p_overspeeding_to_accident: f64,
    pub p_stationary_to_normal: f64,
    /// Normal city speed range, km/h.
    pub normal_speed_kmh: (f64, f64),
    /// Over-the-limit speed range, km/h.
    pub overspeeding_speed_kmh: (f64, f64),
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            p_normal_to_overspeeding: 0.10,
            p_overspeeding_to_normal: 0.20,
            p_overspeeding_to_accident: 0.02,
            p_stationary_to_normal: 0.30,
            normal_speed_kmh: (30.0, 60.0),
            overspeeding_speed_kmh: (70.0, 90.0),
        }
    }
}

/// One generator decision: the scenario to carry forward and the speed and
/// status the tick's telemetry sample reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioStep {
    pub scenario: DrivingScenario,
    pub speed_kmh: f64,
    pub status: VehicleStatus,
}

/// Per-run scenario generator. Owns its RNG so runs are reproducible under
/// a fixed seed.
#[derive(Resource)]
pub struct ScenarioModel {
    rng: StdRng,
    config: ScenarioConfig,
}

impl ScenarioModel {
    pub fn new(seed: Option<u64>) -> Self {
        Self::with_config(seed, ScenarioConfig::default())
    }

    pub fn with_config(seed: Option<u64>, config: ScenarioConfig) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, config }
    }

    fn normal_step(&mut self) -> ScenarioStep {
        let (min, max) = self.config.normal_speed_kmh;
        ScenarioStep {
            scenario: DrivingScenario::NormalDriving,
            speed_kmh: self.rng.gen_range(min..max),
            status: VehicleStatus::Normal,
        }
    }

    fn overspeeding_step(&mut self) -> ScenarioStep {
        let (min, max) = self.config.overspeeding_speed_kmh;
        ScenarioStep {
            scenario: DrivingScenario::Overspeeding,
            speed_kmh: self.rng.gen_range(min..max),
            status: VehicleStatus::Overspeeding,
        }
    }

    fn accident_step(&mut self) -> ScenarioStep {
        ScenarioStep {
            scenario: DrivingScenario::Accident,
            speed_kmh: 0.0,
            status: VehicleStatus::Accident,
        }
    }

    fn stationary_step(&mut self) -> ScenarioStep {
        ScenarioStep {
            scenario: DrivingScenario::Stationary,
            speed_kmh: 0.0,
            status: VehicleStatus::Normal,
        }
    }

    /// Advance one vehicle's scenario by one tick.
    ///
    /// Speeds are drawn fresh on every call. `Accident` is absorbing: the
    /// generator never transitions away from it; only an external scenario
    /// reset does. An overspeeding vehicle rolls the accident chance after
    /// the possible return to normal, so a vehicle can slow down and still
    /// crash in the same tick.
    pub fn step(&mut self, current: DrivingScenario) -> ScenarioStep {
        match current {
            DrivingScenario::NormalDriving => {
                let mut step = self.normal_step();
                if self.rng.gen_bool(self.config.p_normal_to_overspeeding) {
                    step = self.overspeeding_step();
                }
                step
            }
            DrivingScenario::Overspeeding => {
                let mut step = self.overspeeding_step();
                if self.rng.gen_bool(self.config.p_overspeeding_to_normal) {
                    step = self.normal_step();
                }
                if self.rng.gen_bool(self.config.p_overspeeding_to_accident) {
                    step = self.accident_step();
                }
                step
            }
            DrivingScenario::Accident => self.accident_step(),
            DrivingScenario::Stationary => {
                let mut step = self.stationary_step();
                if self.rng.gen_bool(self.config.p_stationary_to_normal) {
                    step = self.normal_step();
                }
                step
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accident_is_absorbing() {
        let mut model = ScenarioModel::new(Some(7));
        for _ in 0..200 {
            let step = model.step(DrivingScenario::Accident);
            assert_eq!(step.scenario, DrivingScenario::Accident);
            assert_eq!(step.speed_kmh, 0.0);
            assert_eq!(step.status, VehicleStatus::Accident);
        }
    }

    #[test]
    fn speeds_stay_within_configured_ranges() {
        let mut model = ScenarioModel::new(Some(11));
        for _ in 0..500 {
            let step = model.step(DrivingScenario::NormalDriving);
            match step.scenario {
                DrivingScenario::NormalDriving => {
                    assert!((30.0..60.0).contains(&step.speed_kmh));
                    assert_eq!(step.status, VehicleStatus::Normal);
                }
                DrivingScenario::Overspeeding => {
                    assert!((70.0..90.0).contains(&step.speed_kmh));
                    assert_eq!(step.status, VehicleStatus::Overspeeding);
                }
                other => panic!("unexpected transition from normal driving: {other:?}"),
            }
        }
    }

    #[test]
    fn normal_driving_eventually_overspeeds() {
        let mut model = ScenarioModel::new(Some(3));
        let saw_overspeeding = (0..200)
            .map(|_| model.step(DrivingScenario::NormalDriving))
            .any(|s| s.scenario == DrivingScenario::Overspeeding);
        assert!(saw_overspeeding, "10% transition never fired in 200 ticks");
    }

    #[test]
    fn stationary_reports_zero_speed_and_normal_status() {
        let config = ScenarioConfig {
            p_stationary_to_normal: 0.0,
            ..Default::default()
        };
        let mut model = ScenarioModel::with_config(Some(5), config);
        let step = model.step(DrivingScenario::Stationary);
        assert_eq!(step.scenario, DrivingScenario::Stationary);
        assert_eq!(step.speed_kmh, 0.0);
        assert_eq!(step.status, VehicleStatus::Normal);
    }

    #[test]
    fn overspeeding_can_crash_in_the_tick_it_slows_down() {
        // Force both the return-to-normal and the accident roll to fire.
        let config = ScenarioConfig {
            p_overspeeding_to_normal: 1.0,
            p_overspeeding_to_accident: 1.0,
            ..Default::default()
        };
        let mut model = ScenarioModel::with_config(Some(5), config);
        let step = model.step(DrivingScenario::Overspeeding);
        assert_eq!(step.scenario, DrivingScenario::Accident);
    }
}
