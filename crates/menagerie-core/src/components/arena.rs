//! Arena Resources
//!
//! Resources for arena geometry, stations, the simulation clock, and the
//! spawn-ordered agent roster.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use menagerie_events::{NeedKind, SimStamp};

/// Resource: arena dimensions in pixels.
#[derive(Resource, Debug, Clone, Copy)]
pub struct ArenaBounds {
    pub width: f32,
    pub height: f32,
}

impl ArenaBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// A fixed need-replenishing point in the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub kind: NeedKind,
    pub x: f32,
    pub y: f32,
}

/// Resource: all stations, in registration order.
#[derive(Resource, Debug, Default)]
pub struct StationRegistry {
    stations: Vec<Station>,
}

impl StationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, station: Station) {
        self.stations.push(station);
    }

    pub fn get(&self, kind: NeedKind) -> Option<&Station> {
        self.stations.iter().find(|s| s.kind == kind)
    }

    pub fn all(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

/// Resource: the simulation clock.
///
/// Advanced once per step by the world stepper; systems read time from here
/// and never from the wall clock.
#[derive(Resource, Debug, Clone, Copy)]
pub struct SimClock {
    pub tick: u64,
    /// Simulated milliseconds since world creation.
    pub now_ms: f64,
    /// Length of the current step, seconds.
    pub dt: f32,
    /// False while paused; the stepper skips the schedule entirely.
    pub running: bool,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            tick: 0,
            now_ms: 0.0,
            dt: 0.0,
            running: true,
        }
    }

    /// Advances by one step of `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.tick += 1;
        self.now_ms += f64::from(dt) * 1000.0;
        self.dt = dt;
    }

    pub fn stamp(&self) -> SimStamp {
        SimStamp::new(self.tick, self.now_ms)
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Resource: spawn-ordered list of agent entities.
///
/// This is the canonical "agent collection order" used by every pair loop and
/// the ally scan, and the allocator for stable agent ids. Maintained by the
/// add/remove/reset commands.
#[derive(Resource, Debug, Default)]
pub struct AgentRoster {
    entries: Vec<Entity>,
    next_serial: u64,
}

impl AgentRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next stable agent id. Serials keep counting across
    /// resets so ids are never reused within a world.
    pub fn allocate_id(&mut self) -> String {
        let id = format!("agent_{:03}", self.next_serial);
        self.next_serial += 1;
        id
    }

    pub fn push(&mut self, entity: Entity) {
        self.entries.push(entity);
    }

    /// Removes the most recently added entity, if any.
    pub fn pop_newest(&mut self) -> Option<Entity> {
        self.entries.pop()
    }

    pub fn remove(&mut self, entity: Entity) {
        self.entries.retain(|e| *e != entity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entities in spawn order.
    pub fn entities(&self) -> Vec<Entity> {
        self.entries.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entries.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advance() {
        let mut clock = SimClock::new();
        clock.advance(0.05);
        clock.advance(0.05);
        assert_eq!(clock.tick, 2);
        assert!((clock.now_ms - 100.0).abs() < 1e-9);
        assert_eq!(clock.stamp().tick, 2);
    }

    #[test]
    fn test_station_registry_lookup() {
        let mut registry = StationRegistry::new();
        registry.register(Station {
            kind: NeedKind::Food,
            x: 100.0,
            y: 200.0,
        });
        assert_eq!(registry.len(), 1);
        assert!(registry.get(NeedKind::Food).is_some());
        assert!(registry.get(NeedKind::Play).is_none());
    }

    #[test]
    fn test_roster_ids_never_reused() {
        let mut roster = AgentRoster::new();
        let first = roster.allocate_id();
        let second = roster.allocate_id();
        assert_eq!(first, "agent_000");
        assert_eq!(second, "agent_001");

        roster.clear();
        assert_eq!(roster.allocate_id(), "agent_002");
    }

    #[test]
    fn test_roster_pop_newest() {
        let mut roster = AgentRoster::new();
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        roster.push(a);
        roster.push(b);
        assert_eq!(roster.pop_newest(), Some(b));
        assert_eq!(roster.len(), 1);
    }
}
