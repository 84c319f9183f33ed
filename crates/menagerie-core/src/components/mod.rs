//! ECS components and resources for the simulation world.

pub mod agent;
pub mod arena;
pub mod relations;

pub use agent::*;
pub use arena::*;
pub use relations::*;
