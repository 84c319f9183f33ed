//! Snapshot Types
//!
//! Serialization structs for periodic world snapshots.
//!
//! Snapshots capture the publishable state of the simulation at a point in
//! time, used by renderers, inspectors, and tests. Publication cadence is
//! decoupled from the tick rate, so consumers must treat snapshots as samples
//! rather than a complete history.

use serde::{Deserialize, Serialize};

use crate::state::{AgentState, NeedKind};
use crate::timestamp::SimStamp;

/// Generates a snapshot ID with the given sequence number.
pub fn generate_snapshot_id(sequence: u64) -> String {
    format!("snap_{:06}", sequence)
}

/// Arena dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsSnapshot {
    pub width: f32,
    pub height: f32,
}

/// Per-resource need levels, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeedsSnapshot {
    pub food: f32,
    pub water: f32,
    pub play: f32,
}

/// A station and its fixed placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSnapshot {
    pub kind: NeedKind,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

/// Published per-agent state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: String,
    /// Display glyph chosen at spawn.
    pub glyph: String,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub state: AgentState,
    pub needs: NeedsSnapshot,
    /// Number of agents whose most recent interaction with this one was friendly.
    pub friend_count: u32,
    /// Number of agents whose most recent interaction with this one was a fight.
    pub rival_count: u32,
}

/// A complete publishable world snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub snapshot_id: String,
    pub timestamp: SimStamp,
    pub bounds: BoundsSnapshot,
    pub population: usize,
    pub max_population: usize,
    pub stations: Vec<StationSnapshot>,
    pub agents: Vec<AgentSnapshot>,
}

impl WorldSnapshot {
    /// Creates an empty snapshot shell; the engine fills in the collections.
    pub fn new(
        snapshot_id: impl Into<String>,
        timestamp: SimStamp,
        bounds: BoundsSnapshot,
        max_population: usize,
    ) -> Self {
        Self {
            snapshot_id: snapshot_id.into(),
            timestamp,
            bounds,
            population: 0,
            max_population,
            stations: Vec::new(),
            agents: Vec::new(),
        }
    }

    /// Looks up an agent by id.
    pub fn agent(&self, agent_id: &str) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.agent_id == agent_id)
    }
}
