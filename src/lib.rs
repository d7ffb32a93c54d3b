//! Grid Snake - the classic snake game
//!
//! This library provides:
//! - Core game logic (game module): a discrete-step simulation engine
//! - High score persistence (persistence module)
//! - Keyboard input mapping (input module)
//! - TUI rendering (render module)
//! - The interactive terminal host (modes module)

pub mod game;
pub mod input;
pub mod modes;
pub mod persistence;
pub mod render;
