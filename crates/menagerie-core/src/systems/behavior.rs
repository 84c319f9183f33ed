//! Engagement State Machine & Navigator
//!
//! Runs once per tick for every non-dragging agent, in roster order: holds
//! locked poses, fires timed releases, drifts cooldowns to a stop, and then
//! steers by intent (station approach or wander perturbation).

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::components::agent::{
    Behavior, Dragging, Engagement, EventCooldown, Intent, IntentGoal, Needs, Position,
    StationTarget, Velocity,
};
use crate::components::arena::{AgentRoster, SimClock, Station, StationRegistry};
use crate::config::Config;
use crate::systems::encounter;
use crate::SimRng;

/// System: per-agent state transitions and navigation for one tick.
pub fn update_behavior(world: &mut World) {
    let now = world.resource::<SimClock>().now_ms;
    let config = world.resource::<Config>().clone();
    let stations: Vec<Station> = world.resource::<StationRegistry>().all().to_vec();
    let roster = world.resource::<AgentRoster>().entities();

    world.resource_scope(|world, mut rng: Mut<SimRng>| {
        for entity in roster {
            if world.get::<Dragging>(entity).map_or(true, |d| d.0) {
                continue;
            }
            let Some(behavior) = world.get::<Behavior>(entity).cloned() else {
                continue;
            };

            // Locked engagements hold pose until the timer hands the pair over
            // to separation; everything else about the agent waits.
            if let Behavior::Engaged(engagement) = &behavior {
                hold_lock_pose(world, entity, engagement);
                if now >= engagement.ends_at_ms {
                    resolve_engagement_end(world, &mut rng.0, entity, engagement, now, &config);
                }
                continue;
            }

            match behavior {
                Behavior::Separate { until_ms } if now >= until_ms => {
                    set_behavior(world, entity, Behavior::Cooldown);
                }
                Behavior::Flee { until_ms } if now >= until_ms => {
                    set_behavior(world, entity, Behavior::Cooldown);
                }
                Behavior::Idle { until_ms } if now >= until_ms => {
                    set_behavior(world, entity, Behavior::Wander);
                }
                _ => {}
            }

            // Cooldown drifts to a stop, waking at random once the gate passes.
            if matches!(world.get::<Behavior>(entity), Some(Behavior::Cooldown)) {
                if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
                    vel.x *= config.movement.cooldown_damping;
                    vel.y *= config.movement.cooldown_damping;
                }
                let gated = world
                    .get::<EventCooldown>(entity)
                    .is_some_and(|gate| gate.blocks(now));
                if rng.0.gen::<f32>() < config.movement.cooldown_wake_chance && !gated {
                    set_behavior(world, entity, Behavior::Wander);
                }
            }

            navigate(world, &mut rng.0, entity, now, &config, &stations);
        }
    });
}

/// Pins an engaged agent to its lock snapshot with zero velocity.
fn hold_lock_pose(world: &mut World, entity: Entity, engagement: &Engagement) {
    if let Some(mut pos) = world.get_mut::<Position>(entity) {
        pos.x = engagement.lock_x;
        pos.y = engagement.lock_y;
    }
    if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
        *vel = Velocity::zero();
    }
}

/// The engagement timer elapsed: separate the pair, or just this agent if the
/// partner has vanished or already left the engagement.
fn resolve_engagement_end(
    world: &mut World,
    rng: &mut SmallRng,
    entity: Entity,
    engagement: &Engagement,
    now: f64,
    config: &Config,
) {
    let partner_engaged_back = world
        .get::<Behavior>(engagement.partner)
        .and_then(|b| b.engagement())
        .is_some_and(|back| back.partner == entity);
    if partner_engaged_back {
        encounter::separate_pair(world, rng, entity, engagement.partner, now, config, false);
    } else {
        encounter::self_separate(world, rng, entity, now, config);
    }
}

fn set_behavior(world: &mut World, entity: Entity, behavior: Behavior) {
    if let Some(mut current) = world.get_mut::<Behavior>(entity) {
        *current = behavior;
    }
}

/// Steers by intent: approach the lowest-need station, or wander.
fn navigate(
    world: &mut World,
    rng: &mut SmallRng,
    entity: Entity,
    now: f64,
    config: &Config,
    stations: &[Station],
) {
    let Some(behavior) = world.get::<Behavior>(entity).cloned() else {
        return;
    };
    // Idle holds still until its timer releases it.
    if matches!(behavior, Behavior::Idle { .. }) {
        return;
    }
    let Some(intent) = world.get::<Intent>(entity).cloned() else {
        return;
    };
    let gated = world
        .get::<EventCooldown>(entity)
        .is_some_and(|gate| gate.blocks(now));

    if intent.goal == IntentGoal::Station && !gated {
        let Some(lowest) = world.get::<Needs>(entity).map(|n| n.lowest()) else {
            return;
        };
        let Some(station) = stations.iter().find(|s| s.kind == lowest) else {
            return;
        };
        if let Some(mut target) = world.get_mut::<StationTarget>(entity) {
            target.0 = Some(lowest);
        }
        if !matches!(behavior, Behavior::Separate { .. }) {
            set_behavior(world, entity, Behavior::GoingStation);
        }
        let Some(pos) = world.get::<Position>(entity).copied() else {
            return;
        };
        let dx = station.x - pos.x;
        let dy = station.y - pos.y;
        let mut d = dx.hypot(dy);
        if d == 0.0 {
            d = 1.0;
        }
        let speed = config.movement.nominal_speed * config.movement.station_approach_factor;
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.x = dx / d * speed;
            vel.y = dy / d * speed;
        }
        // Occasional pause on the way.
        if rng.gen::<f32>() < config.movement.idle_chance {
            set_behavior(world, entity, Behavior::Idle {
                until_ms: now
                    + rng.gen_range(config.movement.idle_min_ms..config.movement.idle_max_ms),
            });
            if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
                *vel = Velocity::zero();
            }
        }
    } else if rng.gen::<f32>() < config.movement.wander_nudge_chance {
        let nudge = config.movement.wander_nudge;
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.x += rng.gen_range(-nudge..nudge);
            vel.y += rng.gen_range(-nudge..nudge);
        }
    }
}
