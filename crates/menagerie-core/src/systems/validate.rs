//! Engagement Symmetry Sweep
//!
//! Engagements are stored as mutual per-agent references, which a bug could
//! leave pointing in only one direction. This sweep detects true asymmetry —
//! a partner that is itself locked onto some other agent — and heals the
//! affected side to cooldown instead of letting the tick loop crash or the
//! stale lock linger. Orphans whose partner simply left the engagement are
//! deliberately skipped: the timeout fallback resolves those.

use bevy_ecs::prelude::*;

use crate::components::agent::{AgentId, Behavior};
use crate::components::arena::AgentRoster;

/// System: detect and heal asymmetric engagements.
pub fn enforce_engagement_symmetry(world: &mut World) {
    let roster = world.resource::<AgentRoster>().entities();
    let mut broken: Vec<Entity> = Vec::new();

    for entity in roster {
        let Some(Behavior::Engaged(engagement)) = world.get::<Behavior>(entity) else {
            continue;
        };
        let violation = match world.get::<Behavior>(engagement.partner) {
            Some(Behavior::Engaged(back)) => {
                back.partner != entity || back.kind != engagement.kind
            }
            Some(Behavior::Drag {
                interrupted: Some(back),
            }) => back.partner != entity || back.kind != engagement.kind,
            // Partner gone or no longer engaged: an orphan, resolved when this
            // agent's engagement timer elapses.
            _ => false,
        };
        if violation {
            broken.push(entity);
        }
    }

    for entity in broken {
        let label = world
            .get::<AgentId>(entity)
            .map(|id| id.0.clone())
            .unwrap_or_else(|| format!("{entity:?}"));
        tracing::warn!(agent = %label, "asymmetric engagement; healing to cooldown");
        if let Some(mut behavior) = world.get_mut::<Behavior>(entity) {
            *behavior = Behavior::Cooldown;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::agent::{Agent, Dragging, Engagement, Position, Velocity};
    use menagerie_events::EncounterKind;

    fn test_world() -> World {
        let mut world = World::new();
        world.insert_resource(AgentRoster::new());
        world
    }

    fn spawn(world: &mut World) -> Entity {
        let id = world.resource_mut::<AgentRoster>().allocate_id();
        let entity = world
            .spawn((
                Agent,
                AgentId(id),
                Position::new(0.0, 0.0),
                Velocity::zero(),
                Behavior::Wander,
                Dragging(false),
            ))
            .id();
        world.resource_mut::<AgentRoster>().push(entity);
        entity
    }

    fn engage(partner: Entity, kind: EncounterKind) -> Behavior {
        Behavior::Engaged(Engagement {
            kind,
            partner,
            partner_id: String::new(),
            lock_x: 0.0,
            lock_y: 0.0,
            ends_at_ms: 8_000.0,
        })
    }

    #[test]
    fn test_mutual_engagement_passes() {
        let mut world = test_world();
        let a = spawn(&mut world);
        let b = spawn(&mut world);
        *world.get_mut::<Behavior>(a).unwrap() = engage(b, EncounterKind::Friendly);
        *world.get_mut::<Behavior>(b).unwrap() = engage(a, EncounterKind::Friendly);

        enforce_engagement_symmetry(&mut world);

        assert!(world.get::<Behavior>(a).unwrap().is_engaged());
        assert!(world.get::<Behavior>(b).unwrap().is_engaged());
    }

    #[test]
    fn test_partner_engaged_elsewhere_is_healed() {
        let mut world = test_world();
        let a = spawn(&mut world);
        let b = spawn(&mut world);
        let c = spawn(&mut world);
        *world.get_mut::<Behavior>(a).unwrap() = engage(b, EncounterKind::Fight);
        *world.get_mut::<Behavior>(b).unwrap() = engage(c, EncounterKind::Fight);
        *world.get_mut::<Behavior>(c).unwrap() = engage(b, EncounterKind::Fight);

        enforce_engagement_symmetry(&mut world);

        // Only the stale reference is healed; the live pair keeps going.
        assert!(matches!(
            world.get::<Behavior>(a).unwrap(),
            Behavior::Cooldown
        ));
        assert!(world.get::<Behavior>(b).unwrap().is_engaged());
        assert!(world.get::<Behavior>(c).unwrap().is_engaged());
    }

    #[test]
    fn test_kind_mismatch_heals_both() {
        let mut world = test_world();
        let a = spawn(&mut world);
        let b = spawn(&mut world);
        *world.get_mut::<Behavior>(a).unwrap() = engage(b, EncounterKind::Friendly);
        *world.get_mut::<Behavior>(b).unwrap() = engage(a, EncounterKind::Fight);

        enforce_engagement_symmetry(&mut world);

        assert!(matches!(
            world.get::<Behavior>(a).unwrap(),
            Behavior::Cooldown
        ));
        assert!(matches!(
            world.get::<Behavior>(b).unwrap(),
            Behavior::Cooldown
        ));
    }

    #[test]
    fn test_orphan_is_left_for_timeout_fallback() {
        let mut world = test_world();
        let a = spawn(&mut world);
        let b = spawn(&mut world);
        *world.get_mut::<Behavior>(a).unwrap() = engage(b, EncounterKind::Friendly);
        // b already cooled down (e.g. after an edge warp).
        *world.get_mut::<Behavior>(b).unwrap() = Behavior::Cooldown;

        enforce_engagement_symmetry(&mut world);

        assert!(world.get::<Behavior>(a).unwrap().is_engaged());
    }

    #[test]
    fn test_dragged_partner_carrying_engagement_passes() {
        let mut world = test_world();
        let a = spawn(&mut world);
        let b = spawn(&mut world);
        *world.get_mut::<Behavior>(a).unwrap() = engage(b, EncounterKind::Friendly);
        let carried = match engage(a, EncounterKind::Friendly) {
            Behavior::Engaged(e) => e,
            _ => unreachable!(),
        };
        *world.get_mut::<Behavior>(b).unwrap() = Behavior::Drag {
            interrupted: Some(carried),
        };

        enforce_engagement_symmetry(&mut world);

        assert!(world.get::<Behavior>(a).unwrap().is_engaged());
    }
}
