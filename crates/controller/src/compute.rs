//! Background move computation.
//!
//! One scheduler per side, single-flight: while a computation is
//! outstanding, further submissions are silently dropped - no queue, no
//! cancellation. Each accepted submission runs on a fresh worker thread
//! against an immutable snapshot and reports back exactly once through
//! the shared completion channel, whatever happens inside the backend.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;

use amazons_core::{Board, Color, Engine, Pos, SearchBudget, SearchResult, Turn};
use gtp_engine::{BestTurn, GtpEngine};
use log::{debug, warn};
use montecarlo_engine::MonteCarloEngine;
use random_engine::RandomEngine;

/// Which computation runs for a request.
#[derive(Clone)]
pub enum ComputeBackend {
    MonteCarlo,
    Random,
    /// Delegate to the external engine; the worker owns the bridge lock
    /// for the whole call.
    External(Arc<Mutex<GtpEngine>>),
}

impl std::fmt::Debug for ComputeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComputeBackend::MonteCarlo => write!(f, "MonteCarlo"),
            ComputeBackend::Random => write!(f, "Random"),
            ComputeBackend::External(_) => write!(f, "External"),
        }
    }
}

/// Immutable snapshot handed to a worker at submission time.
#[derive(Clone, Debug)]
pub struct ComputeRequest {
    pub board: Board,
    /// Queen positions per color, indexed by `Color::idx`.
    pub queens: [Vec<Pos>; 2],
    pub mover: Color,
    pub backend: ComputeBackend,
    pub budget: SearchBudget,
    /// Game-state generation this snapshot was taken from; completions
    /// from an older generation are discarded by the consumer.
    pub epoch: u64,
}

/// Search diagnostics attached to an in-process result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchDiagnostics {
    pub win_probability: f64,
    pub playouts: u64,
    pub value: f64,
}

/// What a computation produced.
#[derive(Clone, Debug, PartialEq)]
pub enum ComputeOutcome {
    Turn {
        turn: Turn,
        diagnostics: Option<SearchDiagnostics>,
    },
    /// The mover has no legal turn (in-process search found none, or the
    /// external engine passed).
    NoLegalMove,
    /// The backend failed; never raised as a panic across this boundary.
    Failed { reason: String },
}

/// One completed computation, delivered on the shared channel.
#[derive(Clone, Debug)]
pub struct Completion {
    pub side: Color,
    pub epoch: u64,
    pub outcome: ComputeOutcome,
}

/// Single-flight scheduler for one side.
pub struct AiScheduler {
    side: Color,
    in_flight: Arc<AtomicBool>,
    completions: Sender<Completion>,
}

impl AiScheduler {
    pub fn new(side: Color, completions: Sender<Completion>) -> Self {
        Self {
            side,
            in_flight: Arc::new(AtomicBool::new(false)),
            completions,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Accept the request unless one is already outstanding for this
    /// side. Returns whether the request was accepted; a dropped request
    /// produces no completion.
    pub fn submit(&self, request: ComputeRequest) -> bool {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("{} scheduler busy, dropping submission", self.side);
            return false;
        }
        let side = self.side;
        let epoch = request.epoch;
        let in_flight = Arc::clone(&self.in_flight);
        let completions = self.completions.clone();
        thread::spawn(move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| run_backend(request)))
                .unwrap_or_else(|panic| ComputeOutcome::Failed {
                    reason: panic_message(&panic),
                });
            in_flight.store(false, Ordering::SeqCst);
            if completions.send(Completion { side, epoch, outcome }).is_err() {
                warn!("{} completion dropped, consumer is gone", side);
            }
        });
        true
    }
}

fn run_backend(request: ComputeRequest) -> ComputeOutcome {
    if request.queens[request.mover.idx()].is_empty() {
        return ComputeOutcome::NoLegalMove;
    }
    match &request.backend {
        ComputeBackend::MonteCarlo => {
            finish(MonteCarloEngine::new().search(&request.board, request.mover, request.budget))
        }
        ComputeBackend::Random => {
            finish(RandomEngine::new().search(&request.board, request.mover, request.budget))
        }
        ComputeBackend::External(bridge) => {
            let mut engine = match bridge.lock() {
                Ok(engine) => engine,
                Err(_) => {
                    return ComputeOutcome::Failed {
                        reason: "engine bridge lock poisoned".to_string(),
                    }
                }
            };
            if let Err(e) = engine.set_time_controls(0, request.budget.whole_seconds(), 1) {
                return ComputeOutcome::Failed {
                    reason: e.to_string(),
                };
            }
            match engine.best_turn(request.mover) {
                Ok(BestTurn::Turn(turn)) => ComputeOutcome::Turn {
                    turn,
                    diagnostics: None,
                },
                Ok(BestTurn::NoLegalMove) => ComputeOutcome::NoLegalMove,
                Err(e) => ComputeOutcome::Failed {
                    reason: e.to_string(),
                },
            }
        }
    }
}

fn finish(result: SearchResult) -> ComputeOutcome {
    match result.best_turn {
        Some(turn) => ComputeOutcome::Turn {
            turn,
            diagnostics: Some(SearchDiagnostics {
                win_probability: result.win_probability,
                playouts: result.playouts,
                value: result.value,
            }),
        },
        None => ComputeOutcome::NoLegalMove,
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("search backend panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("search backend panicked: {}", s)
    } else {
        "search backend panicked".to_string()
    }
}

#[cfg(test)]
#[path = "compute_tests.rs"]
mod compute_tests;
