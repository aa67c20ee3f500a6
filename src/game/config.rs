use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::level::{DirLevelSource, InMemoryLevelSource, LevelSize, LevelSource};

/// Configuration for the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Size class of the level to load
    pub level_size: LevelSize,
    /// Milliseconds between two steps
    pub tick_ms: u64,
    /// Directory with `small.txt`, `medium.txt` and `large.txt`; the built-in
    /// levels are used when unset
    pub levels_dir: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            level_size: LevelSize::Medium,
            tick_ms: 100,
            levels_dir: None,
        }
    }
}

impl GameConfig {
    /// Create a new configuration for a level size
    pub fn new(level_size: LevelSize) -> Self {
        Self {
            level_size,
            ..Default::default()
        }
    }

    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        serde_json::from_str(&json).with_context(|| format!("Invalid config in {:?}", path))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Level source matching this configuration
    pub fn level_source(&self) -> Box<dyn LevelSource> {
        match &self.levels_dir {
            Some(dir) => Box::new(DirLevelSource::new(dir)),
            None => Box::new(InMemoryLevelSource::builtin()),
        }
    }
}
