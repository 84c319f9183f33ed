//! Configuration System
//!
//! Loads tuning parameters from tuning.toml for easy adjustment without recompiling.

use bevy_ecs::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use menagerie_events::NeedKind;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Top-level configuration structure
#[derive(Resource, Debug, Clone, Deserialize)]
pub struct Config {
    pub arena: ArenaConfig,
    pub movement: MovementConfig,
    pub needs: NeedsConfig,
    pub intent: IntentConfig,
    pub encounter: EncounterConfig,
    pub timing: TimingConfig,
    pub output: OutputConfig,
}

/// Arena geometry and population limits
#[derive(Debug, Clone, Deserialize)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
    /// Distance from an edge at which an agent is warped back inside.
    pub edge_margin: f32,
    /// Horizontal inset for spawn and warp destinations.
    pub respawn_margin_x: f32,
    /// Vertical inset for spawn and warp destinations.
    pub respawn_margin_y: f32,
    /// Agents seeded at startup and on reset.
    pub agent_count: usize,
    pub max_agents: usize,
    /// Shared radius of every station's influence circle.
    pub interaction_radius: f32,
}

/// Speeds and locomotion tuning
#[derive(Debug, Clone, Deserialize)]
pub struct MovementConfig {
    /// Nominal speed in px/s; adjustable at runtime within [min_speed, max_speed].
    pub nominal_speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Fraction of nominal speed used when heading to a station.
    pub station_approach_factor: f32,
    /// Fraction of nominal speed for the post-engagement push apart.
    pub separation_factor: f32,
    /// Fraction of nominal speed while fleeing.
    pub flee_factor: f32,
    /// Fleeing never goes slower than this, px/s.
    pub flee_speed_floor: f32,
    /// Per-axis velocity cap as a fraction of nominal speed.
    pub speed_limit_factor: f32,
    /// Magnitude of wander velocity nudges, px/s.
    pub wander_nudge: f32,
    /// Per-tick chance of a wander nudge.
    pub wander_nudge_chance: f32,
    /// Per-tick chance a station-seeking agent pauses idle.
    pub idle_chance: f32,
    pub idle_min_ms: f64,
    pub idle_max_ms: f64,
    /// Geometric per-tick velocity decay while in cooldown.
    pub cooldown_damping: f32,
    /// Per-tick chance of leaving cooldown once the event gate has passed.
    pub cooldown_wake_chance: f32,
}

/// Need decay and replenishment rates
#[derive(Debug, Clone, Deserialize)]
pub struct NeedsConfig {
    /// Drain rates, units per second.
    pub food_decay: f32,
    pub water_decay: f32,
    pub play_decay: f32,
    /// Replenishment at a matching station, units per second.
    pub replenish_rate: f32,
    /// Above this level the agent stops caring about the station.
    pub sated_threshold: f32,
    /// Initial need range at spawn.
    pub initial_min: f32,
    pub initial_max: f32,
}

/// Behavioral goal scheduling
#[derive(Debug, Clone, Deserialize)]
pub struct IntentConfig {
    /// Probability a re-roll picks station-seeking over wandering.
    pub station_share: f32,
    /// Interval between intent re-rolls, uniformly jittered.
    pub refresh_min_ms: f64,
    pub refresh_max_ms: f64,
    /// Re-roll jitter applied right after a separation.
    pub post_separation_min_ms: f64,
    pub post_separation_max_ms: f64,
}

/// Pairwise encounter triggering
#[derive(Debug, Clone, Deserialize)]
pub struct EncounterConfig {
    /// Poisson rate for pairs sharing a station, events per second.
    pub station_rate: f32,
    /// Poisson rate for off-station pairs, events per second.
    pub wild_rate: f32,
    /// Wild encounters need the pair within this fraction of the interaction radius.
    pub wild_range_factor: f32,
    /// Allies are scanned within this fraction of the interaction radius.
    pub ally_range_factor: f32,
    /// Fight probability at food and water stations.
    pub provision_fight_bias: f32,
    /// Fight probability at the play station.
    pub play_fight_bias: f32,
    /// Fight probability for wild encounters.
    pub wild_fight_bias: f32,
}

impl EncounterConfig {
    /// Fight bias for an encounter hosted by the given station kind.
    pub fn fight_bias(&self, station: NeedKind) -> f32 {
        match station {
            NeedKind::Food | NeedKind::Water => self.provision_fight_bias,
            NeedKind::Play => self.play_fight_bias,
        }
    }
}

/// Durations for the engagement lifecycle
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Locked encounter duration.
    pub engage_ms: f64,
    /// Forced flee duration.
    pub flee_ms: f64,
    /// Post-engagement separation push window.
    pub separate_ms: f64,
    /// Event gate after any interaction, uniformly jittered.
    pub no_event_min_ms: f64,
    pub no_event_max_ms: f64,
    /// Upper bound on a single simulation step, seconds.
    pub max_step_seconds: f32,
}

/// Snapshot publication
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Minimum simulated milliseconds between published snapshots.
    pub snapshot_interval_ms: f64,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load configuration from default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_TUNING_PATH).unwrap_or_else(|e| {
            tracing::warn!("could not load {}: {}. Using defaults.", DEFAULT_TUNING_PATH, e);
            Self::default()
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arena: ArenaConfig {
                width: 1600.0,
                height: 1000.0,
                edge_margin: 6.0,
                respawn_margin_x: 100.0,
                respawn_margin_y: 140.0,
                agent_count: 8,
                max_agents: 16,
                interaction_radius: 110.0,
            },
            movement: MovementConfig {
                nominal_speed: 80.0,
                min_speed: 60.0,
                max_speed: 120.0,
                station_approach_factor: 0.9,
                separation_factor: 1.1,
                flee_factor: 1.3,
                flee_speed_floor: 120.0,
                speed_limit_factor: 1.1,
                wander_nudge: 15.0,
                wander_nudge_chance: 0.02,
                idle_chance: 0.004,
                idle_min_ms: 900.0,
                idle_max_ms: 2200.0,
                cooldown_damping: 0.98,
                cooldown_wake_chance: 0.02,
            },
            needs: NeedsConfig {
                food_decay: 0.7,
                water_decay: 0.8,
                play_decay: 0.6,
                replenish_rate: 12.0,
                sated_threshold: 85.0,
                initial_min: 60.0,
                initial_max: 95.0,
            },
            intent: IntentConfig {
                station_share: 0.33,
                refresh_min_ms: 10_000.0,
                refresh_max_ms: 18_000.0,
                post_separation_min_ms: 4_000.0,
                post_separation_max_ms: 8_000.0,
            },
            encounter: EncounterConfig {
                station_rate: 0.60,
                wild_rate: 0.40,
                wild_range_factor: 0.9,
                ally_range_factor: 1.1,
                provision_fight_bias: 0.60,
                play_fight_bias: 0.30,
                wild_fight_bias: 0.50,
            },
            timing: TimingConfig {
                engage_ms: 8_000.0,
                flee_ms: 2_200.0,
                separate_ms: 1_400.0,
                no_event_min_ms: 4_200.0,
                no_event_max_ms: 7_000.0,
                max_step_seconds: 0.05,
            },
            output: OutputConfig {
                snapshot_interval_ms: 300.0,
            },
        }
    }
}

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
