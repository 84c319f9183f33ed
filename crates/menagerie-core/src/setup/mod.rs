//! World Setup
//!
//! Station placement and agent spawning with randomized appearance, position,
//! needs, and starting intent.

use bevy_ecs::prelude::*;
use rand::Rng;

use menagerie_events::NeedKind;

use crate::components::agent::{
    Agent, AgentId, Behavior, Dragging, EventCooldown, Glyph, Intent, IntentGoal, Needs, Position,
    Radius, StationTarget, Velocity,
};
use crate::components::arena::{AgentRoster, ArenaBounds, SimClock, Station, StationRegistry};
use crate::config::Config;
use crate::SimRng;

/// Glyph pool for newly spawned agents.
pub const ANIMALS: &[&str] = &[
    "🦊", "🐼", "🐧", "🐯", "🦉", "🐸", "🦄", "🐙", "🐶", "🐱", "🦁", "🐵", "🐮", "🐷", "🦒",
    "🐨", "🦝", "🐰", "🐻", "🦔",
];

const RADIUS_MIN: f32 = 18.0;
const RADIUS_MAX: f32 = 24.0;
/// Initial drift as a fraction of nominal speed.
const SPAWN_DRIFT_FACTOR: f32 = 0.3;

/// Builds the station registry: food upper-left, water upper-right, play
/// lower-center.
pub fn place_stations(config: &Config) -> StationRegistry {
    let (w, h) = (config.arena.width, config.arena.height);
    let mut registry = StationRegistry::new();
    registry.register(Station {
        kind: NeedKind::Food,
        x: w * 0.22,
        y: h * 0.32,
    });
    registry.register(Station {
        kind: NeedKind::Water,
        x: w * 0.78,
        y: h * 0.34,
    });
    registry.register(Station {
        kind: NeedKind::Play,
        x: w * 0.50,
        y: h * 0.74,
    });
    registry
}

/// Spawns one randomized agent and registers it on the roster.
pub fn spawn_agent(world: &mut World) -> Entity {
    let config = world.resource::<Config>().clone();
    let bounds = *world.resource::<ArenaBounds>();
    let now = world.resource::<SimClock>().now_ms;
    let speed = config.movement.nominal_speed;

    let (glyph, x, y, vx, vy, radius, needs, goal, intent_until) = {
        let mut sim_rng = world.resource_mut::<SimRng>();
        let rng = &mut sim_rng.0;
        let drift = speed * SPAWN_DRIFT_FACTOR;
        (
            ANIMALS[rng.gen_range(0..ANIMALS.len())],
            rng.gen_range(config.arena.respawn_margin_x..bounds.width - config.arena.respawn_margin_x),
            rng.gen_range(config.arena.respawn_margin_y..bounds.height - config.arena.respawn_margin_y),
            rng.gen_range(-drift..drift),
            rng.gen_range(-drift..drift),
            rng.gen_range(RADIUS_MIN..RADIUS_MAX),
            Needs::new(
                rng.gen_range(config.needs.initial_min..config.needs.initial_max),
                rng.gen_range(config.needs.initial_min..config.needs.initial_max),
                rng.gen_range(config.needs.initial_min..config.needs.initial_max),
            ),
            if rng.gen::<f32>() < config.intent.station_share {
                IntentGoal::Station
            } else {
                IntentGoal::Wander
            },
            now + rng.gen_range(config.intent.refresh_min_ms..config.intent.refresh_max_ms),
        )
    };

    let id = world.resource_mut::<AgentRoster>().allocate_id();
    let entity = world
        .spawn((
            Agent,
            AgentId(id),
            Glyph(glyph.to_string()),
            Position::new(x, y),
            Velocity { x: vx, y: vy },
            Radius(radius),
            needs,
            Behavior::Wander,
            Intent {
                goal,
                until_ms: intent_until,
            },
            EventCooldown::default(),
            StationTarget::default(),
            Dragging::default(),
        ))
        .id();
    world.resource_mut::<AgentRoster>().push(entity);
    entity
}

/// Seeds the starting population.
pub fn seed_agents(world: &mut World, count: usize) {
    for _ in 0..count {
        spawn_agent(world);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::relations::RelationLedger;
    use crate::events::TickEvents;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn test_world() -> World {
        let config = Config::default();
        let mut world = World::new();
        world.insert_resource(ArenaBounds::new(config.arena.width, config.arena.height));
        world.insert_resource(SimClock::new());
        world.insert_resource(SimRng(SmallRng::seed_from_u64(11)));
        world.insert_resource(place_stations(&config));
        world.insert_resource(AgentRoster::new());
        world.insert_resource(RelationLedger::new());
        world.insert_resource(TickEvents::new());
        world.insert_resource(config);
        world
    }

    #[test]
    fn test_station_placement() {
        let config = Config::default();
        let registry = place_stations(&config);
        assert_eq!(registry.len(), 3);

        let food = registry.get(NeedKind::Food).unwrap();
        assert!((food.x - 1600.0 * 0.22).abs() < 1e-3);
        assert!((food.y - 1000.0 * 0.32).abs() < 1e-3);
        assert!(registry.get(NeedKind::Play).unwrap().y > food.y);
    }

    #[test]
    fn test_spawned_agent_is_in_bounds_with_sane_needs() {
        let mut world = test_world();
        for _ in 0..20 {
            let entity = spawn_agent(&mut world);
            let pos = world.get::<Position>(entity).unwrap();
            assert!(pos.x >= 100.0 && pos.x <= 1_500.0);
            assert!(pos.y >= 140.0 && pos.y <= 860.0);

            let needs = world.get::<Needs>(entity).unwrap();
            for kind in NeedKind::ALL {
                let value = needs.get(kind);
                assert!((60.0..95.0).contains(&value));
            }

            let radius = world.get::<Radius>(entity).unwrap();
            assert!((18.0..24.0).contains(&radius.0));
            assert!(matches!(
                world.get::<Behavior>(entity).unwrap(),
                Behavior::Wander
            ));
        }
        assert_eq!(world.resource::<AgentRoster>().len(), 20);
    }

    #[test]
    fn test_seeded_ids_are_sequential() {
        let mut world = test_world();
        seed_agents(&mut world, 3);
        let roster = world.resource::<AgentRoster>().entities();
        let ids: Vec<String> = roster
            .iter()
            .map(|&e| world.get::<AgentId>(e).unwrap().0.clone())
            .collect();
        assert_eq!(ids, vec!["agent_000", "agent_001", "agent_002"]);
    }
}
