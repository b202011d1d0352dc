//! Scenario step: one generator decision per vehicle per tick, writing the
//! resulting speed and status back onto the entity.

use bevy_ecs::prelude::{Query, ResMut};

use crate::ecs::{Kinematics, Vehicle};
use crate::scenario::ScenarioModel;

pub fn scenario_step_system(
    mut model: ResMut<ScenarioModel>,
    mut vehicles: Query<(&mut Vehicle, &mut Kinematics)>,
) {
    for (mut vehicle, mut kinematics) in &mut vehicles {
        let step = model.step(vehicle.scenario);
        vehicle.scenario = step.scenario;
        vehicle.status = step.status;
        kinematics.speed_kmh = step.speed_kmh;
    }
}
