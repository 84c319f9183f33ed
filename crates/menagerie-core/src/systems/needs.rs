//! Need Decay System
//!
//! Drains every non-dragging agent's needs at fixed per-resource rates.
//! Replenishment happens station-side in the encounter phase.

use bevy_ecs::prelude::*;

use menagerie_events::NeedKind;

use crate::components::agent::{Dragging, Needs};
use crate::components::arena::SimClock;
use crate::config::Config;

/// System to drain needs linearly, clamped to [0, 100].
pub fn decay_needs(
    clock: Res<SimClock>,
    config: Res<Config>,
    mut query: Query<(&Dragging, &mut Needs)>,
) {
    let dt = clock.dt;
    for (dragging, mut needs) in query.iter_mut() {
        if dragging.0 {
            continue;
        }
        let food = needs.food - config.needs.food_decay * dt;
        let water = needs.water - config.needs.water_decay * dt;
        let play = needs.play - config.needs.play_decay * dt;
        needs.set(NeedKind::Food, food);
        needs.set(NeedKind::Water, water);
        needs.set(NeedKind::Play, play);
    }
}
