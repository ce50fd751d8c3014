//! Match results storage and reporting

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete results of one engine-vs-engine match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub engine1: String,
    pub engine2: String,
    pub board_size: usize,
    pub budget_ms: u64,
    pub games: Vec<GameRecord>,
    pub engine1_wins: u32,
    pub engine2_wins: u32,
    pub failed_games: u32,
}

/// A single finished game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub game: u32,
    /// True when engine1 had the black pieces this game
    pub engine1_black: bool,
    /// "engine1" or "engine2"
    pub winner: String,
    /// "blocked" or "resignation"
    pub reason: String,
    pub turns: usize,
}

impl MatchReport {
    pub fn new(engine1: &str, engine2: &str, board_size: usize, budget_ms: u64) -> Self {
        Self {
            engine1: engine1.to_string(),
            engine2: engine2.to_string(),
            board_size,
            budget_ms,
            games: Vec::new(),
            engine1_wins: 0,
            engine2_wins: 0,
            failed_games: 0,
        }
    }

    pub fn add_game(&mut self, record: GameRecord) {
        if record.winner == "engine1" {
            self.engine1_wins += 1;
        } else {
            self.engine2_wins += 1;
        }
        self.games.push(record);
    }

    pub fn add_failure(&mut self) {
        self.failed_games += 1;
    }

    /// Engine1's score in [0, 1] over the finished games.
    pub fn score(&self) -> f64 {
        let total = self.engine1_wins + self.engine2_wins;
        if total == 0 {
            return 0.5;
        }
        self.engine1_wins as f64 / total as f64
    }

    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write: {}", e))
    }
}
