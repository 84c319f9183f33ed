//! World Stepper
//!
//! Owns the ECS world and the tick schedule. One call to [`Simulation::step`]
//! runs the whole fixed phase order once: need decay, intent refresh, behavior
//! transitions and navigation, station encounters, wild encounters, motion
//! integration with boundary handling, and the engagement symmetry sweep.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use menagerie_events::{SimEvent, WorldSnapshot};

use crate::commands::{self, Command};
use crate::components::arena::{AgentRoster, ArenaBounds, SimClock};
use crate::components::relations::RelationLedger;
use crate::config::Config;
use crate::events::TickEvents;
use crate::output::{self, SnapshotPublisher};
use crate::setup;
use crate::systems::{
    decay_needs, enforce_engagement_symmetry, integrate_motion, refresh_intents,
    station_encounters, update_behavior, wild_encounters,
};
use crate::SimRng;

/// A running simulation: ECS world plus the chained tick schedule.
pub struct Simulation {
    world: World,
    schedule: Schedule,
}

impl Simulation {
    /// Builds a world from the given configuration and seed, with the starting
    /// population already spawned.
    pub fn new(config: Config, seed: u64) -> Self {
        let mut world = World::new();
        world.insert_resource(ArenaBounds::new(config.arena.width, config.arena.height));
        world.insert_resource(SimClock::new());
        world.insert_resource(SimRng(SmallRng::seed_from_u64(seed)));
        world.insert_resource(setup::place_stations(&config));
        world.insert_resource(AgentRoster::new());
        world.insert_resource(RelationLedger::new());
        world.insert_resource(TickEvents::new());
        world.insert_resource(SnapshotPublisher::new(config.output.snapshot_interval_ms));
        let agent_count = config.arena.agent_count;
        world.insert_resource(config);
        setup::seed_agents(&mut world, agent_count);

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                decay_needs,
                refresh_intents,
                update_behavior,
                station_encounters,
                wild_encounters,
                integrate_motion,
                enforce_engagement_symmetry,
            )
                .chain(),
        );

        Self { world, schedule }
    }

    /// Default configuration, given seed.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(Config::default(), seed)
    }

    /// Advances the world by `dt_seconds` of simulated time, clamped to the
    /// configured maximum step. Does nothing while paused.
    pub fn step(&mut self, dt_seconds: f32) {
        if !self.world.resource::<SimClock>().running {
            return;
        }
        let max_step = self.world.resource::<Config>().timing.max_step_seconds;
        let dt = dt_seconds.clamp(0.0, max_step);
        self.world.resource_mut::<SimClock>().advance(dt);
        self.schedule.run(&mut self.world);
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn tick(&self) -> u64 {
        self.world.resource::<SimClock>().tick
    }

    pub fn now_ms(&self) -> f64 {
        self.world.resource::<SimClock>().now_ms
    }

    pub fn is_running(&self) -> bool {
        self.world.resource::<SimClock>().running
    }

    pub fn population(&self) -> usize {
        self.world.resource::<AgentRoster>().len()
    }

    /// Applies an external command.
    pub fn apply(&mut self, command: &Command) {
        commands::apply(&mut self.world, command);
    }

    pub fn pause(&mut self) {
        commands::pause(&mut self.world);
    }

    pub fn resume(&mut self) {
        commands::resume(&mut self.world);
    }

    pub fn add_agent(&mut self) -> Option<String> {
        commands::add_agent(&mut self.world)
    }

    pub fn remove_agent(&mut self) -> Option<String> {
        commands::remove_agent(&mut self.world)
    }

    pub fn reset(&mut self) {
        commands::reset(&mut self.world);
    }

    pub fn set_speed(&mut self, px_per_s: f32) -> f32 {
        commands::set_speed(&mut self.world, px_per_s)
    }

    pub fn begin_drag(&mut self, agent_id: &str) -> bool {
        commands::begin_drag(&mut self.world, agent_id)
    }

    pub fn drag_move(&mut self, agent_id: &str, dx: f32, dy: f32) -> bool {
        commands::drag_move(&mut self.world, agent_id, dx, dy)
    }

    pub fn release_drag(&mut self, agent_id: &str) -> bool {
        commands::release_drag(&mut self.world, agent_id)
    }

    /// Takes the events generated since the last drain.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.world.resource_mut::<TickEvents>().drain()
    }

    /// Builds a snapshot immediately, regardless of the publication throttle.
    pub fn snapshot(&mut self) -> WorldSnapshot {
        output::generate_snapshot(&mut self.world)
    }

    /// Builds a snapshot only if the publication interval has elapsed.
    pub fn publish_due_snapshot(&mut self) -> Option<WorldSnapshot> {
        let now = self.world.resource::<SimClock>().now_ms;
        if !self.world.resource::<SnapshotPublisher>().due(now) {
            return None;
        }
        let snapshot = output::generate_snapshot(&mut self.world);
        self.world.resource_mut::<SnapshotPublisher>().mark(now);
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_world_seeds_population() {
        let sim = Simulation::from_seed(42);
        assert_eq!(sim.population(), 8);
        assert_eq!(sim.tick(), 0);
        assert!(sim.is_running());
    }

    #[test]
    fn test_step_advances_clock_and_clamps_dt() {
        let mut sim = Simulation::from_seed(42);
        sim.step(0.016);
        assert_eq!(sim.tick(), 1);
        assert!((sim.now_ms() - 16.0).abs() < 1e-6);

        // Oversized steps are clamped to the configured maximum.
        sim.step(0.5);
        assert!((sim.now_ms() - 66.0).abs() < 1e-6);
    }

    #[test]
    fn test_paused_simulation_does_not_advance() {
        let mut sim = Simulation::from_seed(42);
        sim.pause();
        sim.step(0.016);
        assert_eq!(sim.tick(), 0);
        sim.resume();
        sim.step(0.016);
        assert_eq!(sim.tick(), 1);
    }

    #[test]
    fn test_snapshot_throttle() {
        let mut sim = Simulation::from_seed(42);
        // Nothing published at t=0 until the first step... except the first
        // call, which is always due.
        assert!(sim.publish_due_snapshot().is_some());
        sim.step(0.05);
        assert!(sim.publish_due_snapshot().is_none());
        for _ in 0..6 {
            sim.step(0.05);
        }
        assert!(sim.publish_due_snapshot().is_some());
    }
}
