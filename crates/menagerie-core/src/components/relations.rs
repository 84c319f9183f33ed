//! Relation Ledger
//!
//! The most recent interaction outcome per ordered agent pair. History is not
//! accumulated: every new encounter overwrites the previous tag.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use menagerie_events::EncounterKind;

/// Last-interaction tag between two agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    Friend,
    Rival,
}

impl From<EncounterKind> for Standing {
    fn from(kind: EncounterKind) -> Self {
        match kind {
            EncounterKind::Friendly => Standing::Friend,
            EncounterKind::Fight => Standing::Rival,
        }
    }
}

/// Resource: graph of most-recent standings between agents.
///
/// Keyed by ordered `(from, to)` id pairs. Entries referencing removed agents
/// are left in place; counts simply reflect the last thing each pair did.
#[derive(Resource, Debug, Default)]
pub struct RelationLedger {
    relations: HashMap<(String, String), Standing>,
}

impl RelationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `from`'s standing toward `to`, overwriting any previous tag.
    pub fn record(&mut self, from: impl Into<String>, to: impl Into<String>, standing: Standing) {
        self.relations.insert((from.into(), to.into()), standing);
    }

    /// Records the standing in both directions.
    pub fn record_mutual(&mut self, a: &str, b: &str, standing: Standing) {
        self.record(a, b, standing);
        self.record(b, a, standing);
    }

    pub fn get(&self, from: &str, to: &str) -> Option<Standing> {
        self.relations
            .get(&(from.to_string(), to.to_string()))
            .copied()
    }

    pub fn is_friend(&self, from: &str, to: &str) -> bool {
        self.get(from, to) == Some(Standing::Friend)
    }

    /// (friends, rivals) counted over this agent's outgoing standings.
    pub fn counts_for(&self, agent_id: &str) -> (u32, u32) {
        let mut friends = 0;
        let mut rivals = 0;
        for ((from, _), standing) in &self.relations {
            if from != agent_id {
                continue;
            }
            match standing {
                Standing::Friend => friends += 1,
                Standing::Rival => rivals += 1,
            }
        }
        (friends, rivals)
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn clear(&mut self) {
        self.relations.clear();
    }
}
