//! Tick Event Types
//!
//! Discrete happenings emitted by the engine during a tick: encounter locks,
//! separations, ally interventions, edge warps, and population changes.
//! Consumers (loggers, renderers, analytics) drain these after each tick.

use serde::{Deserialize, Serialize};

use crate::state::{EncounterKind, NeedKind};
use crate::timestamp::SimStamp;

/// A discrete simulation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    /// Two agents locked into a timed encounter.
    EncounterStarted {
        kind: EncounterKind,
        a: String,
        b: String,
        /// Station that hosted the encounter, if any (wild encounters carry none).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        station: Option<NeedKind>,
    },
    /// An engagement ended and the pair was pushed apart.
    PairSeparated {
        a: String,
        b: String,
        /// True when the separation was externally forced (drag release)
        /// rather than the engagement timer elapsing.
        forced: bool,
    },
    /// An agent left an engagement alone because its partner was gone.
    SelfSeparated { agent: String },
    /// A nearby friend cancelled a pending fight.
    AllyIntervened {
        ally: String,
        protected: String,
        fled: String,
    },
    /// An agent crossed the arena edge and was relocated inward.
    EdgeWarped { agent: String },
    /// An agent joined the population.
    AgentAdded { agent: String },
    /// An agent left the population.
    AgentRemoved { agent: String },
}

/// An event paired with the moment it happened, for log streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedEvent {
    pub at: SimStamp,
    #[serde(flatten)]
    pub event: SimEvent,
}

impl StampedEvent {
    pub fn new(at: SimStamp, event: SimEvent) -> Self {
        Self { at, event }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = SimEvent::EncounterStarted {
            kind: EncounterKind::Fight,
            a: "agent_001".to_string(),
            b: "agent_002".to_string(),
            station: Some(NeedKind::Food),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"encounter_started""#));
        assert!(json.contains(r#""kind":"fight""#));
        assert!(json.contains(r#""station":"food""#));

        let parsed: SimEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_wild_encounter_omits_station() {
        let event = SimEvent::EncounterStarted {
            kind: EncounterKind::Friendly,
            a: "agent_001".to_string(),
            b: "agent_002".to_string(),
            station: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("station"));

        let parsed: SimEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_stamped_event_flattens() {
        let stamped = StampedEvent::new(
            SimStamp::new(7, 350.0),
            SimEvent::EdgeWarped {
                agent: "agent_003".to_string(),
            },
        );
        let json = serde_json::to_string(&stamped).unwrap();
        assert!(json.contains(r#""type":"edge_warped""#));
        assert!(json.contains(r#""tick":7"#));

        let parsed: StampedEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, stamped);
    }
}
