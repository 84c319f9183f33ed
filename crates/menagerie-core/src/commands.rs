//! World Commands
//!
//! The external control surface: pause/resume, population changes, speed
//! adjustment, and the drag protocol. The UI layer calls these directly; the
//! serde-tagged [`Command`] enum exists so commands can also be injected from
//! files or pipes.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use menagerie_events::SimEvent;

use crate::components::agent::{AgentId, Behavior, Dragging, Position};
use crate::components::arena::{AgentRoster, SimClock};
use crate::components::relations::RelationLedger;
use crate::config::Config;
use crate::events::TickEvents;
use crate::setup;
use crate::systems::encounter;
use crate::SimRng;

/// A world command, serializable for external injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Pause,
    Resume,
    AddAgent,
    RemoveAgent,
    Reset,
    SetSpeed { px_per_s: f32 },
}

/// Applies a command to the world.
pub fn apply(world: &mut World, command: &Command) {
    match command {
        Command::Pause => pause(world),
        Command::Resume => resume(world),
        Command::AddAgent => {
            add_agent(world);
        }
        Command::RemoveAgent => {
            remove_agent(world);
        }
        Command::Reset => reset(world),
        Command::SetSpeed { px_per_s } => {
            set_speed(world, *px_per_s);
        }
    }
}

pub fn pause(world: &mut World) {
    world.resource_mut::<SimClock>().running = false;
}

pub fn resume(world: &mut World) {
    world.resource_mut::<SimClock>().running = true;
}

/// Flips the running flag, returning the new value.
pub fn toggle_running(world: &mut World) -> bool {
    let mut clock = world.resource_mut::<SimClock>();
    clock.running = !clock.running;
    clock.running
}

/// Spawns a new agent unless the population cap is reached. Returns its id.
pub fn add_agent(world: &mut World) -> Option<String> {
    let max_agents = world.resource::<Config>().arena.max_agents;
    if world.resource::<AgentRoster>().len() >= max_agents {
        return None;
    }
    let entity = setup::spawn_agent(world);
    let id = world.get::<AgentId>(entity).map(|id| id.0.clone())?;
    world.resource_mut::<TickEvents>().push(SimEvent::AgentAdded {
        agent: id.clone(),
    });
    Some(id)
}

/// Removes the most recently added agent. Returns its id.
pub fn remove_agent(world: &mut World) -> Option<String> {
    let entity = world.resource_mut::<AgentRoster>().pop_newest()?;
    let id = world.get::<AgentId>(entity).map(|id| id.0.clone());
    world.despawn(entity);
    if let Some(agent) = id.clone() {
        world
            .resource_mut::<TickEvents>()
            .push(SimEvent::AgentRemoved { agent });
    }
    id
}

/// Discards the whole population and seeds a fresh one.
pub fn reset(world: &mut World) {
    let entities = world.resource::<AgentRoster>().entities();
    for entity in entities {
        world.despawn(entity);
    }
    world.resource_mut::<AgentRoster>().clear();
    world.resource_mut::<RelationLedger>().clear();
    let count = world.resource::<Config>().arena.agent_count;
    setup::seed_agents(world, count);
}

/// Adjusts the nominal speed, clamped to the configured range. Returns the
/// applied value.
pub fn set_speed(world: &mut World, px_per_s: f32) -> f32 {
    let mut config = world.resource_mut::<Config>();
    let clamped = px_per_s.clamp(config.movement.min_speed, config.movement.max_speed);
    config.movement.nominal_speed = clamped;
    clamped
}

/// Resolves an agent id to its entity.
pub fn find_agent(world: &World, agent_id: &str) -> Option<Entity> {
    world
        .resource::<AgentRoster>()
        .iter()
        .find(|&entity| {
            world
                .get::<AgentId>(entity)
                .is_some_and(|id| id.0 == agent_id)
        })
}

/// Starts an external drag. An active engagement is preserved inside the drag
/// state so release can resolve it.
pub fn begin_drag(world: &mut World, agent_id: &str) -> bool {
    let Some(entity) = find_agent(world, agent_id) else {
        return false;
    };
    let Some(mut dragging) = world.get_mut::<Dragging>(entity) else {
        return false;
    };
    dragging.0 = true;
    if let Some(mut behavior) = world.get_mut::<Behavior>(entity) {
        let interrupted = match &*behavior {
            Behavior::Engaged(engagement) => Some(engagement.clone()),
            Behavior::Drag { interrupted } => interrupted.clone(),
            _ => None,
        };
        *behavior = Behavior::Drag { interrupted };
    }
    true
}

/// Applies an external position delta to a held agent.
pub fn drag_move(world: &mut World, agent_id: &str, dx: f32, dy: f32) -> bool {
    let Some(entity) = find_agent(world, agent_id) else {
        return false;
    };
    if !world.get::<Dragging>(entity).is_some_and(|d| d.0) {
        return false;
    }
    let Some(mut pos) = world.get_mut::<Position>(entity) else {
        return false;
    };
    pos.x += dx;
    pos.y += dy;
    true
}

/// Ends a drag: forced separation if the interrupted engagement is still
/// mutual, otherwise a plain cooldown.
pub fn release_drag(world: &mut World, agent_id: &str) -> bool {
    let Some(entity) = find_agent(world, agent_id) else {
        return false;
    };
    let Some(mut dragging) = world.get_mut::<Dragging>(entity) else {
        return false;
    };
    dragging.0 = false;

    let Some(Behavior::Drag { interrupted }) = world.get::<Behavior>(entity).cloned() else {
        return true;
    };
    let still_mutual = interrupted.as_ref().is_some_and(|engagement| {
        world
            .get::<Behavior>(engagement.partner)
            .and_then(|b| b.engagement())
            .is_some_and(|back| back.partner == entity)
    });

    if let Some(engagement) = interrupted.filter(|_| still_mutual) {
        // Restore the lock so separation sees a symmetric pair.
        if let Some(mut behavior) = world.get_mut::<Behavior>(entity) {
            *behavior = Behavior::Engaged(engagement.clone());
        }
        let now = world.resource::<SimClock>().now_ms;
        let config = world.resource::<Config>().clone();
        world.resource_scope(|world, mut rng: Mut<SimRng>| {
            encounter::separate_pair(
                world,
                &mut rng.0,
                entity,
                engagement.partner,
                now,
                &config,
                true,
            );
        });
    } else if let Some(mut behavior) = world.get_mut::<Behavior>(entity) {
        *behavior = Behavior::Cooldown;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Simulation;
    use menagerie_events::EncounterKind;

    #[test]
    fn test_command_serialization() {
        let command = Command::SetSpeed { px_per_s: 95.0 };
        let json = serde_json::to_string(&command).unwrap();
        assert!(json.contains(r#""command":"set_speed""#));
        let parsed: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, command);
    }

    #[test]
    fn test_add_agent_respects_cap() {
        let mut sim = Simulation::from_seed(1);
        let max = sim.world().resource::<Config>().arena.max_agents;
        while sim.population() < max {
            assert!(add_agent(sim.world_mut()).is_some());
        }
        assert!(add_agent(sim.world_mut()).is_none());
        assert_eq!(sim.population(), max);
    }

    #[test]
    fn test_remove_agent_pops_newest() {
        let mut sim = Simulation::from_seed(1);
        let added = add_agent(sim.world_mut()).unwrap();
        let removed = remove_agent(sim.world_mut()).unwrap();
        assert_eq!(added, removed);
    }

    #[test]
    fn test_reset_reseeds_and_clears_relations() {
        let mut sim = Simulation::from_seed(1);
        sim.world_mut()
            .resource_mut::<RelationLedger>()
            .record_mutual("agent_000", "agent_001", crate::Standing::Friend);

        reset(sim.world_mut());

        assert_eq!(sim.population(), 8);
        assert!(sim.world().resource::<RelationLedger>().is_empty());
        // Fresh agents carry fresh ids.
        let roster = sim.world().resource::<AgentRoster>().entities();
        let first = sim.world().get::<AgentId>(roster[0]).unwrap();
        assert_eq!(first.0, "agent_008");
    }

    #[test]
    fn test_set_speed_clamps() {
        let mut sim = Simulation::from_seed(1);
        assert_eq!(set_speed(sim.world_mut(), 200.0), 120.0);
        assert_eq!(set_speed(sim.world_mut(), 10.0), 60.0);
        assert_eq!(set_speed(sim.world_mut(), 95.0), 95.0);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut sim = Simulation::from_seed(1);
        apply(sim.world_mut(), &Command::Pause);
        assert!(!sim.world().resource::<SimClock>().running);
        apply(sim.world_mut(), &Command::Resume);
        assert!(sim.world().resource::<SimClock>().running);
    }

    #[test]
    fn test_drag_round_trip() {
        let mut sim = Simulation::from_seed(1);
        let id = add_agent(sim.world_mut()).unwrap();
        let entity = find_agent(sim.world(), &id).unwrap();
        let before = *sim.world().get::<Position>(entity).unwrap();

        assert!(begin_drag(sim.world_mut(), &id));
        assert!(drag_move(sim.world_mut(), &id, 25.0, -10.0));
        let held = *sim.world().get::<Position>(entity).unwrap();
        assert_eq!((held.x, held.y), (before.x + 25.0, before.y - 10.0));

        assert!(release_drag(sim.world_mut(), &id));
        assert!(matches!(
            sim.world().get::<Behavior>(entity).unwrap(),
            Behavior::Cooldown
        ));
        assert!(!sim.world().get::<Dragging>(entity).unwrap().0);
    }

    #[test]
    fn test_drag_move_requires_active_drag() {
        let mut sim = Simulation::from_seed(1);
        let id = add_agent(sim.world_mut()).unwrap();
        assert!(!drag_move(sim.world_mut(), &id, 5.0, 5.0));
        assert!(!drag_move(sim.world_mut(), "no_such_agent", 5.0, 5.0));
    }

    #[test]
    fn test_release_of_engaged_drag_separates_pair() {
        let mut sim = Simulation::from_seed(1);
        let a_id = add_agent(sim.world_mut()).unwrap();
        let b_id = add_agent(sim.world_mut()).unwrap();
        let a = find_agent(sim.world(), &a_id).unwrap();
        let b = find_agent(sim.world(), &b_id).unwrap();
        let config = sim.world().resource::<Config>().clone();
        encounter::lock_pair(
            sim.world_mut(),
            a,
            b,
            EncounterKind::Friendly,
            None,
            0.0,
            &config,
        );

        assert!(begin_drag(sim.world_mut(), &a_id));
        // Partner stays locked onto the held agent for the duration.
        assert!(sim.world().get::<Behavior>(b).unwrap().is_engaged());

        assert!(release_drag(sim.world_mut(), &a_id));
        for entity in [a, b] {
            assert!(matches!(
                sim.world().get::<Behavior>(entity).unwrap(),
                Behavior::Separate { .. }
            ));
        }
    }
}
