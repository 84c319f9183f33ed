//! Motion Integration & Boundary Handling
//!
//! Clamps velocities, integrates positions, and warps agents that stray into
//! the edge margin back to a random interior point aimed at the arena center.

use bevy_ecs::prelude::*;
use rand::Rng;

use menagerie_events::SimEvent;

use crate::components::agent::{AgentId, Behavior, Dragging, Position, Velocity};
use crate::components::arena::{AgentRoster, ArenaBounds, SimClock};
use crate::config::Config;
use crate::events::TickEvents;
use crate::SimRng;

/// System: integrate motion and handle the arena boundary.
pub fn integrate_motion(
    clock: Res<SimClock>,
    config: Res<Config>,
    bounds: Res<ArenaBounds>,
    roster: Res<AgentRoster>,
    mut rng: ResMut<SimRng>,
    mut tick_events: ResMut<TickEvents>,
    mut query: Query<(&AgentId, &Dragging, &mut Behavior, &mut Position, &mut Velocity)>,
) {
    let dt = clock.dt;
    let speed = config.movement.nominal_speed;
    let limit = speed * config.movement.speed_limit_factor;
    let margin = config.arena.edge_margin;

    for entity in roster.iter() {
        let Ok((id, dragging, mut behavior, mut pos, mut vel)) = query.get_mut(entity) else {
            continue;
        };
        if dragging.0 {
            continue;
        }

        vel.x = vel.x.clamp(-limit, limit);
        vel.y = vel.y.clamp(-limit, limit);
        if !behavior.is_engaged() {
            pos.x += vel.x * dt;
            pos.y += vel.y * dt;
        }

        let outside = pos.x < margin
            || pos.x > bounds.width - margin
            || pos.y < margin
            || pos.y > bounds.height - margin;
        if outside {
            // Warp inward. Any engagement is dropped; the partner finds out
            // through the timeout fallback or the symmetry sweep.
            *behavior = Behavior::Cooldown;
            pos.x = rng
                .0
                .gen_range(config.arena.respawn_margin_x..bounds.width - config.arena.respawn_margin_x);
            pos.y = rng
                .0
                .gen_range(config.arena.respawn_margin_y..bounds.height - config.arena.respawn_margin_y);
            let (cx, cy) = bounds.center();
            let dx = cx - pos.x;
            let dy = cy - pos.y;
            let mut d = dx.hypot(dy);
            if d == 0.0 {
                d = 1.0;
            }
            vel.x = dx / d * speed;
            vel.y = dy / d * speed;
            tracing::debug!(agent = %id.0, "edge warp");
            tick_events.push(SimEvent::EdgeWarped {
                agent: id.0.clone(),
            });
        }
    }
}
