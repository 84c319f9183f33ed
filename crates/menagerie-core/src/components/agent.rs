//! Agent Components
//!
//! Components for individual agents: identity, kinematics, needs, and the
//! behavioral state machine.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use menagerie_events::{AgentState, EncounterKind, NeedKind};

/// Marker component identifying an entity as an agent
#[derive(Component, Debug, Clone, Default)]
pub struct Agent;

/// Unique identifier for an agent
#[derive(Component, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

/// Display glyph chosen at spawn; carried through to snapshots untouched.
#[derive(Component, Debug, Clone)]
pub struct Glyph(pub String);

/// Position in arena pixels.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &Position) -> f32 {
        self.distance_to_point(other.x, other.y)
    }

    /// Euclidean distance to a raw point.
    pub fn distance_to_point(&self, x: f32, y: f32) -> f32 {
        (self.x - x).hypot(self.y - y)
    }
}

/// Velocity in px/s.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

impl Velocity {
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Body radius in pixels.
#[derive(Component, Debug, Clone, Copy)]
pub struct Radius(pub f32);

/// Decaying need levels, each clamped to [0, 100].
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Needs {
    pub food: f32,
    pub water: f32,
    pub play: f32,
}

impl Needs {
    pub fn new(food: f32, water: f32, play: f32) -> Self {
        Self { food, water, play }
    }

    pub fn get(&self, kind: NeedKind) -> f32 {
        match kind {
            NeedKind::Food => self.food,
            NeedKind::Water => self.water,
            NeedKind::Play => self.play,
        }
    }

    pub fn set(&mut self, kind: NeedKind, value: f32) {
        let slot = match kind {
            NeedKind::Food => &mut self.food,
            NeedKind::Water => &mut self.water,
            NeedKind::Play => &mut self.play,
        };
        *slot = value.clamp(0.0, 100.0);
    }

    /// The kind with the lowest level; ties resolve in canonical kind order.
    pub fn lowest(&self) -> NeedKind {
        let mut lowest = NeedKind::Food;
        for kind in NeedKind::ALL {
            if self.get(kind) < self.get(lowest) {
                lowest = kind;
            }
        }
        lowest
    }
}

/// A locked pairing between two agents.
///
/// Exists only inside `Behavior::Engaged` (or preserved across a drag), so an
/// agent can never hold lock fields without actually being locked.
#[derive(Debug, Clone, PartialEq)]
pub struct Engagement {
    pub kind: EncounterKind,
    pub partner: Entity,
    pub partner_id: String,
    /// Pose snapshot taken at lock time; position is pinned here every tick.
    pub lock_x: f32,
    pub lock_y: f32,
    /// Absolute simulated time at which the engagement ends.
    pub ends_at_ms: f64,
}

/// Behavioral state machine. Each variant carries only the fields valid in
/// that state.
#[derive(Component, Debug, Clone, PartialEq)]
pub enum Behavior {
    /// Brief pause; releases to `Wander` when the timer elapses.
    Idle { until_ms: f64 },
    Wander,
    GoingStation,
    /// Post-interaction lull; leaves by random wake once the event gate passes.
    Cooldown,
    /// Push-apart window right after an engagement.
    Separate { until_ms: f64 },
    /// Forced retreat after an ally intervention.
    Flee { until_ms: f64 },
    /// Locked encounter, friendly or fight.
    Engaged(Engagement),
    /// Externally held. An engagement interrupted by the grab is preserved so
    /// release can resolve it.
    Drag { interrupted: Option<Engagement> },
}

impl Behavior {
    /// The published state tag.
    pub fn state(&self) -> AgentState {
        match self {
            Behavior::Idle { .. } => AgentState::Idle,
            Behavior::Wander => AgentState::Wander,
            Behavior::GoingStation => AgentState::GoingStation,
            Behavior::Cooldown => AgentState::Cooldown,
            Behavior::Separate { .. } => AgentState::Separate,
            Behavior::Flee { .. } => AgentState::Flee,
            Behavior::Engaged(e) => match e.kind {
                EncounterKind::Friendly => AgentState::Friendly,
                EncounterKind::Fight => AgentState::Fight,
            },
            Behavior::Drag { .. } => AgentState::Drag,
        }
    }

    pub fn is_engaged(&self) -> bool {
        matches!(self, Behavior::Engaged(_))
    }

    /// Returns the active engagement, if locked.
    pub fn engagement(&self) -> Option<&Engagement> {
        match self {
            Behavior::Engaged(e) => Some(e),
            _ => None,
        }
    }

    /// True for states in which the agent can enter a new encounter.
    pub fn is_free(&self) -> bool {
        matches!(
            self,
            Behavior::Wander | Behavior::GoingStation | Behavior::Idle { .. } | Behavior::Cooldown
        )
    }
}

/// Current behavioral goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentGoal {
    Station,
    Wander,
}

/// Goal plus the time of its next re-roll.
#[derive(Component, Debug, Clone)]
pub struct Intent {
    pub goal: IntentGoal,
    pub until_ms: f64,
}

/// Gate blocking new interactions and station targeting after an encounter.
///
/// Only ever extended forward; a passed gate no longer blocks anything.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct EventCooldown {
    pub until_ms: f64,
}

impl EventCooldown {
    pub fn blocks(&self, now_ms: f64) -> bool {
        now_ms < self.until_ms
    }

    /// Extends the gate to `until_ms` if that is later than the current gate.
    pub fn extend_to(&mut self, until_ms: f64) {
        if until_ms > self.until_ms {
            self.until_ms = until_ms;
        }
    }
}

/// The resource currently sought, if any.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct StationTarget(pub Option<NeedKind>);

/// True while the agent is externally held; the external layer owns position
/// writes for the duration.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Dragging(pub bool);
