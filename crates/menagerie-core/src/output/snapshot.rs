//! Snapshot Generation
//!
//! Builds read-only world snapshots for renderers and inspectors. Publication
//! is throttled on simulated time, decoupled from the tick rate: the engine
//! may step at display frame rate while consumers sample every few hundred
//! milliseconds.

use bevy_ecs::prelude::*;
use std::fs;
use std::path::Path;

use menagerie_events::{
    generate_snapshot_id, AgentSnapshot, BoundsSnapshot, NeedsSnapshot, StationSnapshot,
    WorldSnapshot,
};

use crate::components::agent::{AgentId, Behavior, Glyph, Needs, Position, Radius};
use crate::components::arena::{AgentRoster, ArenaBounds, SimClock, StationRegistry};
use crate::components::relations::RelationLedger;
use crate::config::Config;

/// Resource to track snapshot publication
#[derive(Resource, Debug)]
pub struct SnapshotPublisher {
    interval_ms: f64,
    last_publish_ms: Option<f64>,
    next_sequence: u64,
}

impl SnapshotPublisher {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_publish_ms: None,
            next_sequence: 1,
        }
    }

    /// True when enough simulated time has passed since the last publication.
    pub fn due(&self, now_ms: f64) -> bool {
        self.last_publish_ms
            .map_or(true, |last| now_ms - last >= self.interval_ms)
    }

    pub fn mark(&mut self, now_ms: f64) {
        self.last_publish_ms = Some(now_ms);
    }

    pub fn next_id(&mut self) -> String {
        let id = generate_snapshot_id(self.next_sequence);
        self.next_sequence += 1;
        id
    }

    pub fn snapshot_count(&self) -> u64 {
        self.next_sequence - 1
    }
}

/// Generate a complete world snapshot
pub fn generate_snapshot(world: &mut World) -> WorldSnapshot {
    let stamp = world.resource::<SimClock>().stamp();
    let bounds = *world.resource::<ArenaBounds>();
    let (radius, max_population) = {
        let config = world.resource::<Config>();
        (config.arena.interaction_radius, config.arena.max_agents)
    };
    let snapshot_id = world.resource_mut::<SnapshotPublisher>().next_id();

    let mut snapshot = WorldSnapshot::new(
        snapshot_id,
        stamp,
        BoundsSnapshot {
            width: bounds.width,
            height: bounds.height,
        },
        max_population,
    );

    for station in world.resource::<StationRegistry>().all() {
        snapshot.stations.push(StationSnapshot {
            kind: station.kind,
            x: station.x,
            y: station.y,
            radius,
        });
    }

    let roster = world.resource::<AgentRoster>().entities();
    let ledger = world.resource::<RelationLedger>();
    for entity in roster {
        let (Some(id), Some(glyph), Some(pos), Some(body), Some(behavior), Some(needs)) = (
            world.get::<AgentId>(entity),
            world.get::<Glyph>(entity),
            world.get::<Position>(entity),
            world.get::<Radius>(entity),
            world.get::<Behavior>(entity),
            world.get::<Needs>(entity),
        ) else {
            continue;
        };
        let (friend_count, rival_count) = ledger.counts_for(&id.0);
        snapshot.agents.push(AgentSnapshot {
            agent_id: id.0.clone(),
            glyph: glyph.0.clone(),
            x: pos.x,
            y: pos.y,
            radius: body.0,
            state: behavior.state(),
            needs: NeedsSnapshot {
                food: needs.food,
                water: needs.water,
                play: needs.play,
            },
            friend_count,
            rival_count,
        });
    }
    snapshot.population = snapshot.agents.len();
    snapshot
}

/// Write snapshot to file
pub fn write_snapshot(snapshot: &WorldSnapshot, path: impl AsRef<Path>) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)
}

/// Write snapshot into a directory, named by its id
pub fn write_snapshot_to_dir(
    snapshot: &WorldSnapshot,
    dir: impl AsRef<Path>,
) -> std::io::Result<()> {
    let path = dir.as_ref().join(format!("{}.json", snapshot.snapshot_id));
    write_snapshot(snapshot, path)
}

/// Write current state (overwrites each time)
pub fn write_current_state(
    snapshot: &WorldSnapshot,
    dir: impl AsRef<Path>,
) -> std::io::Result<()> {
    write_snapshot(snapshot, dir.as_ref().join("current_state.json"))
}
