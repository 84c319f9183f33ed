//! Menagerie Simulation Engine Library
//!
//! A population of animal agents roams a bounded arena, satisfying decaying
//! needs at fixed stations and falling into timed friendly or hostile
//! encounters with cooldown-gated re-engagement. This crate is the headless
//! engine: rendering, input capture, and UI live elsewhere and talk to the
//! engine through commands, drag events, and published snapshots.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod commands;
pub mod components;
pub mod config;
pub mod events;
pub mod output;
pub mod setup;
pub mod sim;
pub mod systems;

pub use components::*;
pub use config::Config;
pub use sim::Simulation;

/// Seeded random number generator resource.
///
/// Every probabilistic decision in the engine draws from this resource in a
/// fixed order, so a run is fully determined by its seed and step sequence.
#[derive(Resource)]
pub struct SimRng(pub SmallRng);
