//! Level layouts and where they come from
//!
//! A level is plain text: `"<rows> <cols> [<row> <col>]*"`, whitespace
//! separated, where every trailing pair is a barrier cell.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::error::{LevelError, Result};
use super::state::Position;

/// Segments in a freshly spawned snake
pub const SPAWN_LENGTH: usize = 5;

/// Narrowest board the snake can spawn on: column 0 stays free behind the tail
pub const MIN_COLS: usize = SPAWN_LENGTH + 1;

/// Largest accepted row or column count
pub const MAX_DIM: usize = 100;

/// Named size class of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LevelSize {
    Small,
    Medium,
    Large,
}

impl LevelSize {
    /// File stem used by [`DirLevelSource`]
    pub fn name(&self) -> &'static str {
        match self {
            LevelSize::Small => "small",
            LevelSize::Medium => "medium",
            LevelSize::Large => "large",
        }
    }
}

impl fmt::Display for LevelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Supplies the raw text of a level for a size class
pub trait LevelSource: Send {
    fn level_text(&self, size: LevelSize) -> Result<String>;
}

impl<T: LevelSource + ?Sized> LevelSource for Box<T> {
    fn level_text(&self, size: LevelSize) -> Result<String> {
        (**self).level_text(size)
    }
}

/// Level texts held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryLevelSource {
    levels: HashMap<LevelSize, String>,
}

impl InMemoryLevelSource {
    /// Create an empty source with no levels
    pub fn new() -> Self {
        Self::default()
    }

    /// The levels shipped with the game
    pub fn builtin() -> Self {
        Self::new()
            .with_level(LevelSize::Small, "15 15 3 3 11 11")
            .with_level(LevelSize::Medium, "20 20 15 15 5 5 12 4")
            .with_level(LevelSize::Large, "25 25 5 5 5 19 19 5 19 19 12 12")
    }

    pub fn with_level(mut self, size: LevelSize, text: impl Into<String>) -> Self {
        self.levels.insert(size, text.into());
        self
    }
}

impl LevelSource for InMemoryLevelSource {
    fn level_text(&self, size: LevelSize) -> Result<String> {
        self.levels
            .get(&size)
            .cloned()
            .ok_or_else(|| LevelError::Source {
                size,
                reason: "no level registered".to_string(),
            })
    }
}

/// Reads `<dir>/<size>.txt`
#[derive(Debug, Clone)]
pub struct DirLevelSource {
    dir: PathBuf,
}

impl DirLevelSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, size: LevelSize) -> PathBuf {
        self.dir.join(format!("{}.txt", size.name()))
    }
}

impl LevelSource for DirLevelSource {
    fn level_text(&self, size: LevelSize) -> Result<String> {
        let path = self.path_for(size);
        std::fs::read_to_string(&path).map_err(|err| LevelError::Source {
            size,
            reason: format!("{}: {}", path.display(), err),
        })
    }
}

/// A parsed level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelLayout {
    pub rows: usize,
    pub cols: usize,
    pub barriers: Vec<Position>,
}

impl LevelLayout {
    /// Parse level text
    ///
    /// Fails on non-integer tokens, a missing dimension, an odd number of
    /// barrier coordinates, a board too small to spawn the snake on or larger
    /// than [`MAX_DIM`] either way, or a barrier outside the board or on the
    /// spawn cells.
    pub fn parse(text: &str) -> Result<Self> {
        let values = text
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<i32>()
                    .map_err(|_| LevelError::Parse(format!("'{}' is not an integer", token)))
            })
            .collect::<Result<Vec<i32>>>()?;

        let (rows, cols, coords) = match values.as_slice() {
            [rows, cols, coords @ ..] => (*rows, *cols, coords),
            _ => {
                return Err(LevelError::Parse(
                    "expected row and column counts".to_string(),
                ));
            }
        };

        if coords.len() % 2 != 0 {
            return Err(LevelError::Parse(format!(
                "barrier coordinates must come in pairs, got {} values",
                coords.len()
            )));
        }

        if rows < 1 || cols < MIN_COLS as i32 {
            return Err(LevelError::Parse(format!(
                "board {}x{} is too small, need at least 1x{}",
                rows, cols, MIN_COLS
            )));
        }

        if rows > MAX_DIM as i32 || cols > MAX_DIM as i32 {
            return Err(LevelError::Parse(format!(
                "board {}x{} is too large, at most {}x{} is supported",
                rows, cols, MAX_DIM, MAX_DIM
            )));
        }

        let barriers = coords
            .chunks_exact(2)
            .map(|pair| Position::new(pair[0], pair[1]))
            .collect::<Vec<_>>();

        if let Some(outside) = barriers
            .iter()
            .find(|p| p.row < 0 || p.row >= rows || p.col < 0 || p.col >= cols)
        {
            return Err(LevelError::Parse(format!(
                "barrier ({}, {}) lies outside the {}x{} board",
                outside.row, outside.col, rows, cols
            )));
        }

        let spawn_row = rows / 2;
        if let Some(blocked) = barriers
            .iter()
            .find(|p| p.row == spawn_row && (1..=SPAWN_LENGTH as i32).contains(&p.col))
        {
            return Err(LevelError::Parse(format!(
                "barrier ({}, {}) blocks the snake spawn",
                blocked.row, blocked.col
            )));
        }

        Ok(Self {
            rows: rows as usize,
            cols: cols as usize,
            barriers,
        })
    }
}
