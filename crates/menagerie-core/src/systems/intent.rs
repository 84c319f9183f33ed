//! Intent Scheduler
//!
//! Periodically re-rolls each agent's behavioral goal. Agents under the
//! post-interaction event gate are pinned to wandering regardless of the roll.

use bevy_ecs::prelude::*;
use rand::Rng;

use crate::components::agent::{Behavior, Dragging, EventCooldown, Intent, IntentGoal};
use crate::components::arena::{AgentRoster, SimClock};
use crate::config::Config;
use crate::SimRng;

/// System to refresh intents on their jittered schedule.
pub fn refresh_intents(
    clock: Res<SimClock>,
    config: Res<Config>,
    roster: Res<AgentRoster>,
    mut rng: ResMut<SimRng>,
    mut query: Query<(&Dragging, &Behavior, &EventCooldown, &mut Intent)>,
) {
    let now = clock.now_ms;
    for entity in roster.iter() {
        let Ok((dragging, behavior, gate, mut intent)) = query.get_mut(entity) else {
            continue;
        };
        if dragging.0 {
            continue;
        }
        if gate.blocks(now) {
            intent.goal = IntentGoal::Wander;
        }
        if now >= intent.until_ms && !behavior.is_engaged() {
            intent.goal = if rng.0.gen::<f32>() < config.intent.station_share {
                IntentGoal::Station
            } else {
                IntentGoal::Wander
            };
            if gate.blocks(now) {
                intent.goal = IntentGoal::Wander;
            }
            intent.until_ms =
                now + rng.0.gen_range(config.intent.refresh_min_ms..config.intent.refresh_max_ms);
        }
    }
}
