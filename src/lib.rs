//! Grid Snake - a Snake game on a bordered grid with barrier cells
//!
//! This library provides:
//! - Core game logic and the fixed-interval step loop (game module)
//! - Keyboard mapping (input module)
//! - TUI rendering (render module)
//! - Session metrics and score persistence (metrics module)
//! - The interactive terminal mode (modes module)

pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod render;
