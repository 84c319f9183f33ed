//! Simulation Systems
//!
//! One module per tick phase, chained in a fixed order by the world stepper:
//! need decay, intent refresh, behavior transitions and navigation, station
//! encounters, wild encounters, motion integration with boundary handling,
//! and the engagement symmetry sweep.

pub mod behavior;
pub mod encounter;
pub mod intent;
pub mod motion;
pub mod needs;
pub mod validate;

pub use behavior::update_behavior;
pub use encounter::{
    force_flee, is_eligible, lock_pair, poisson_trial, self_separate, separate_pair, start_fight,
    station_encounters, wild_encounters,
};
pub use intent::refresh_intents;
pub use motion::integrate_motion;
pub use needs::decay_needs;
pub use validate::enforce_engagement_symmetry;
