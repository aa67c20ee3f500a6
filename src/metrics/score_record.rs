//! Score persistence between runs
//!
//! The score file is a small JSON document keyed by player name. Each player
//! keeps the last final score and the best score seen so far.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Final score of the most recent game
    pub last_score: u32,
    /// Best final score ever recorded
    pub high_score: u32,
}

impl ScoreRecord {
    /// Record a finished game. The high score never goes down.
    pub fn record(&mut self, final_score: u32) {
        self.last_score = final_score;
        self.high_score = self.high_score.max(final_score);
    }
}

/// One line of the leaderboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// 1-based; players with equal high scores share a rank
    pub rank: usize,
    pub player: String,
    pub high_score: u32,
}

impl fmt::Display for LeaderboardEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>3}. {:<16} {}", self.rank, self.player, self.high_score)
    }
}

/// Score records of every player who finished a game
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBoard {
    #[serde(default)]
    players: BTreeMap<String, ScoreRecord>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished game for `player`
    pub fn record(&mut self, player: &str, final_score: u32) {
        self.players
            .entry(player.to_string())
            .or_default()
            .record(final_score);
    }

    /// Scores of `player`; an unknown player has an empty record
    pub fn player(&self, player: &str) -> ScoreRecord {
        self.players.get(player).copied().unwrap_or_default()
    }

    /// The best `limit` players by high score, ties broken by name
    pub fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let mut ranked = self
            .players
            .iter()
            .map(|(player, record)| (player, record.high_score))
            .collect::<Vec<_>>();
        // Stable sort over name-ordered keys: ties stay ordered by name
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(limit.min(ranked.len()));
        for (index, (player, high_score)) in ranked.into_iter().take(limit).enumerate() {
            let rank = match entries.last() {
                Some(prev) if prev.high_score == high_score => prev.rank,
                _ => index + 1,
            };
            entries.push(LeaderboardEntry {
                rank,
                player: player.clone(),
                high_score,
            });
        }
        entries
    }

    /// Load the board at `path`; a missing file yields an empty board
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scores from {:?}", path))?;
        serde_json::from_str(&json).with_context(|| format!("Invalid score file {:?}", path))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize scores")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write scores to {:?}", path))?;

        Ok(())
    }
}
