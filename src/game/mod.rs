//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! A host drives it with a periodic `step` and direction intents from input.

pub mod action;
pub mod config;
pub mod engine;
pub mod random;
pub mod state;

// Re-export commonly used types
pub use action::{Axis, Direction, Velocity};
pub use config::GameConfig;
pub use engine::{GameEngine, StepOutcome};
pub use random::RandomSource;
pub use state::{Collision, GameState, Grid, Position, Snake, Snapshot};
