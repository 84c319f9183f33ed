//! Shared Simulation Vocabulary
//!
//! Enumerations used by both the engine and its consumers: resource kinds,
//! encounter outcomes, and the observable agent state tag.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A replenishable resource. Each kind has exactly one station in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedKind {
    Food,
    Water,
    Play,
}

impl NeedKind {
    /// All kinds, in canonical order.
    pub const ALL: [NeedKind; 3] = [NeedKind::Food, NeedKind::Water, NeedKind::Play];
}

impl fmt::Display for NeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeedKind::Food => write!(f, "food"),
            NeedKind::Water => write!(f, "water"),
            NeedKind::Play => write!(f, "play"),
        }
    }
}

/// Outcome of a pairwise encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterKind {
    Friendly,
    Fight,
}

impl fmt::Display for EncounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncounterKind::Friendly => write!(f, "friendly"),
            EncounterKind::Fight => write!(f, "fight"),
        }
    }
}

/// Observable behavioral state of an agent, as published in snapshots.
///
/// External renderers derive all animation (including the vibration effect
/// during locked encounters) from this tag plus elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Idle,
    Wander,
    GoingStation,
    Cooldown,
    Separate,
    Flee,
    Friendly,
    Fight,
    Drag,
}

impl AgentState {
    /// True for the two locked-encounter states.
    pub fn is_engaged(self) -> bool {
        matches!(self, AgentState::Friendly | AgentState::Fight)
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AgentState::Idle => "idle",
            AgentState::Wander => "wander",
            AgentState::GoingStation => "going_station",
            AgentState::Cooldown => "cooldown",
            AgentState::Separate => "separate",
            AgentState::Flee => "flee",
            AgentState::Friendly => "friendly",
            AgentState::Fight => "fight",
            AgentState::Drag => "drag",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_need_kind_serialization() {
        assert_eq!(serde_json::to_string(&NeedKind::Food).unwrap(), r#""food""#);
        assert_eq!(serde_json::to_string(&NeedKind::Water).unwrap(), r#""water""#);
        assert_eq!(serde_json::to_string(&NeedKind::Play).unwrap(), r#""play""#);
    }

    #[test]
    fn test_agent_state_serialization() {
        assert_eq!(
            serde_json::to_string(&AgentState::GoingStation).unwrap(),
            r#""going_station""#
        );
        let parsed: AgentState = serde_json::from_str(r#""cooldown""#).unwrap();
        assert_eq!(parsed, AgentState::Cooldown);
    }

    #[test]
    fn test_engaged_states() {
        assert!(AgentState::Friendly.is_engaged());
        assert!(AgentState::Fight.is_engaged());
        assert!(!AgentState::Separate.is_engaged());
        assert!(!AgentState::Drag.is_engaged());
    }

    #[test]
    fn test_display_matches_serde_tag() {
        for state in [AgentState::Idle, AgentState::GoingStation, AgentState::Flee] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state));
        }
    }
}
