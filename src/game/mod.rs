//! Core game logic module for Snake
//!
//! This module contains all the game logic without any rendering or input
//! dependencies. The engine is driven either by the [`StepLoop`] or by
//! calling [`GridSimulation::move_snake`] directly.

pub mod config;
pub mod direction;
pub mod engine;
pub mod error;
pub mod events;
pub mod level;
pub mod state;
pub mod step_loop;

// Re-export commonly used types
pub use config::GameConfig;
pub use direction::Direction;
pub use engine::{GridSimulation, MAX_PENDING_DIRECTIONS};
pub use error::LevelError;
pub use events::{EventHub, GameEvent};
pub use level::{DirLevelSource, InMemoryLevelSource, LevelLayout, LevelSize, LevelSource};
pub use state::{CellState, CollisionType, Grid, Position, Snake};
pub use step_loop::{SharedSimulation, StepLoop};
