//! High score persistence
//!
//! The engine only needs to read and write a single number. Stores report
//! failures as [`StoreError`]; the engine treats every failure as non-fatal.

pub mod high_score;

pub use high_score::{HighScoreStore, JsonFileStore, MemoryStore, StoreError};
