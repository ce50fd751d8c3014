//! Monte-Carlo Amazons Engine
//!
//! UCT search with uniform random playouts, bounded by the wall-clock
//! budget handed in per move. Reports the win probability, playout count
//! and mean value of the chosen turn alongside the turn itself.

mod search;

use amazons_core::{Board, Color, Engine, SearchBudget, SearchResult};


/// Monte-Carlo tree search engine.
///
/// Selection is UCB1 over the root's legal turns; every rollout is a
/// random playout to the blocked-side-loses end of the game. The search
/// never returns early except when the mover has no legal turn at all.
#[derive(Debug, Clone, Default)]
pub struct MonteCarloEngine {
    playouts: u64,
}

impl MonteCarloEngine {
    pub fn new() -> Self {
        Self { playouts: 0 }
    }
}

impl Engine for MonteCarloEngine {
    fn search(&mut self, board: &Board, mover: Color, budget: SearchBudget) -> SearchResult {
        let clock = budget.start();
        let outcome = search::uct_search(board, mover, clock);
        self.playouts = outcome.playouts;

        SearchResult {
            best_turn: outcome.best_turn,
            win_probability: outcome.win_probability,
            playouts: outcome.playouts,
            value: outcome.value,
        }
    }

    fn name(&self) -> &str {
        "MonteCarlo v1.0"
    }

    fn new_game(&mut self) {
        self.playouts = 0;
    }
}
