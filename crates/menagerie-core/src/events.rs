//! Tick Event Buffer
//!
//! Collects `SimEvent`s generated during a tick for the embedder to drain.

use bevy_ecs::prelude::*;

use menagerie_events::SimEvent;

/// Resource storing events generated this tick
#[derive(Resource, Debug, Default)]
pub struct TickEvents {
    pub events: Vec<SimEvent>,
}

impl TickEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_buffer() {
        let mut events = TickEvents::new();
        events.push(SimEvent::AgentAdded {
            agent: "agent_000".to_string(),
        });
        assert_eq!(events.len(), 1);

        let drained = events.drain();
        assert_eq!(drained.len(), 1);
        assert!(events.is_empty());
    }
}
