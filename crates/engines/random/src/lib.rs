//! Random Turn Engine
//!
//! A simple backend that selects a complete turn uniformly at random from
//! all legal turns. Useful for:
//! - Testing infrastructure before wiring up real search
//! - Baseline comparisons (any real engine should easily beat this)
//! - Stress testing turn generation

use amazons_core::{Board, Color, Engine, SearchBudget, SearchResult};
use rand::seq::SliceRandom;
use rand::thread_rng;

#[cfg(test)]
mod lib_tests;

/// An engine that plays random legal turns.
///
/// No evaluation at all - it enumerates every legal turn and picks one.
/// The simplest possible backend, kept as the floor every other engine
/// is measured against.
#[derive(Debug, Clone, Default)]
pub struct RandomEngine {
    nodes: u64,
}

impl RandomEngine {
    pub fn new() -> Self {
        Self { nodes: 0 }
    }
}

impl Engine for RandomEngine {
    fn search(&mut self, board: &Board, mover: Color, _budget: SearchBudget) -> SearchResult {
        let turns = board.legal_turns(mover);
        self.nodes = turns.len() as u64;

        let best_turn = turns.choose(&mut thread_rng()).copied();

        SearchResult {
            best_turn,
            win_probability: 50.0,
            playouts: 0,
            value: 0.5,
        }
    }

    fn name(&self) -> &str {
        "Random v1.0"
    }

    fn new_game(&mut self) {
        self.nodes = 0;
    }
}
