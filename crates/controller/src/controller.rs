//! Game orchestration.
//!
//! Owns the single shared `Game` and, per side, a player mode, a
//! single-flight scheduler and (lazily) an external engine bridge. All
//! game mutation happens on whichever thread calls into the controller -
//! the "control thread" - which is also the only consumer of worker
//! completions, so the rules engine needs no locking at all.
//!
//! Mirroring discipline: every applied turn is replayed into the
//! *non-moving* side's bridge. A side in external mode generates its own
//! turns with `genmove`, which already records them inside that engine,
//! so mirroring a side's turn into its own bridge would double-count.
//! Bridges only exist while their side is in external mode, which keeps
//! that invariant airtight.

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use amazons_core::{Board, Color, Game, GameStatus, Pos, SearchBudget, Turn};
use gtp_engine::{EngineConfig, GtpEngine};
use log::{debug, info, warn};

use crate::compute::{
    AiScheduler, Completion, ComputeBackend, ComputeOutcome, ComputeRequest, SearchDiagnostics,
};

/// Who drives a side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PlayerMode {
    #[default]
    Human,
    MonteCarlo,
    Random,
    External,
}

/// Why a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOverReason {
    /// The loser had no legal turn.
    Blocked,
    /// Explicit resignation, or an external engine passing.
    Resignation,
}

/// Notifications for the presentation layer.
#[derive(Clone, Debug)]
pub enum GameEvent {
    TurnApplied {
        mover: Color,
        turn: Turn,
        diagnostics: Option<SearchDiagnostics>,
    },
    GameOver {
        winner: Color,
        reason: GameOverReason,
    },
    ComputationFailed {
        side: Color,
        reason: String,
    },
}

#[derive(Clone, Debug)]
pub struct ControllerConfig {
    pub board_size: usize,
    /// Wall-clock budget per AI move, in-process or external.
    pub ai_budget: SearchBudget,
    /// External engine launch description; `None` disables external mode.
    pub engine: Option<EngineConfig>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            board_size: amazons_core::DEFAULT_SIZE,
            ai_budget: SearchBudget::default(),
            engine: None,
        }
    }
}

/// The orchestrator. See the module docs for the threading rules.
pub struct GameController {
    game: Game,
    config: ControllerConfig,
    modes: [PlayerMode; 2],
    schedulers: [AiScheduler; 2],
    bridges: [Option<Arc<Mutex<GtpEngine>>>; 2],
    /// Every applied turn in order, for bridge catch-up replay.
    turn_log: Vec<(Color, Turn)>,
    /// Bumped whenever history rewinds; stale completions check against it.
    epoch: u64,
    completions: Receiver<Completion>,
    events: Sender<GameEvent>,
}

impl GameController {
    /// Build a controller and the event stream the host should drain.
    pub fn new(config: ControllerConfig) -> (Self, Receiver<GameEvent>) {
        let (completion_tx, completion_rx) = channel();
        let (event_tx, event_rx) = channel();
        let controller = Self {
            game: Game::new(config.board_size),
            schedulers: [
                AiScheduler::new(Color::Black, completion_tx.clone()),
                AiScheduler::new(Color::White, completion_tx),
            ],
            modes: [PlayerMode::Human; 2],
            bridges: [None, None],
            turn_log: Vec::new(),
            epoch: 0,
            completions: completion_rx,
            events: event_tx,
            config,
        };
        (controller, event_rx)
    }

    pub fn board_snapshot(&self) -> Board {
        self.game.board().clone()
    }

    pub fn current_player(&self) -> Color {
        self.game.current_player()
    }

    pub fn status(&self) -> GameStatus {
        self.game.status()
    }

    pub fn turns_played(&self) -> usize {
        self.game.turns_played()
    }

    pub fn valid_moves(&self, from: Pos) -> Vec<Pos> {
        self.game.valid_moves(from)
    }

    pub fn mode(&self, side: Color) -> PlayerMode {
        self.modes[side.idx()]
    }

    /// True while either side has a computation outstanding.
    pub fn ai_busy(&self) -> bool {
        self.schedulers.iter().any(|s| s.is_busy())
    }

    /// Lifecycle state of a side's engine process, if one is attached.
    pub fn engine_state(&self, side: Color) -> Option<gtp_engine::SessionState> {
        self.bridges[side.idx()]
            .as_ref()
            .map(|bridge| match bridge.lock() {
                Ok(engine) => engine.state(),
                Err(poisoned) => poisoned.into_inner().state(),
            })
    }

    /// Mirrored ply count of a side's engine process, if one is attached.
    pub fn mirrored_plies(&self, side: Color) -> Option<u32> {
        self.bridges[side.idx()]
            .as_ref()
            .map(|bridge| match bridge.lock() {
                Ok(engine) => engine.mirrored_plies(),
                Err(poisoned) => poisoned.into_inner().mirrored_plies(),
            })
    }

    /// Start a fresh game. Live bridges are re-initialized in place;
    /// outstanding computations are invalidated by the epoch bump.
    pub fn reset(&mut self, board_size: usize) {
        self.epoch += 1;
        self.game.reset(board_size);
        self.config.board_size = board_size;
        self.turn_log.clear();
        for side in [Color::Black, Color::White] {
            let error = match &self.bridges[side.idx()] {
                Some(bridge) => bridge
                    .lock()
                    .map_err(|_| "engine bridge lock poisoned".to_string())
                    .and_then(|mut engine| {
                        engine.initialize(board_size).map_err(|e| e.to_string())
                    })
                    .err(),
                None => None,
            };
            if let Some(reason) = error {
                self.fail_bridge(side, reason);
            }
        }
        info!("new {0}x{0} game", board_size);
        self.dispatch_if_ai();
    }

    /// Apply a turn for the side on turn (human path). Returns false,
    /// with nothing mutated anywhere, when the turn is illegal.
    pub fn execute_turn(&mut self, turn: Turn) -> bool {
        self.apply_turn(turn, None)
    }

    /// Resign on behalf of the side on turn.
    pub fn resign(&mut self) {
        if self.game.status() != GameStatus::InProgress {
            return;
        }
        let loser = self.game.current_player();
        self.game.resign();
        self.emit(GameEvent::GameOver {
            winner: loser.other(),
            reason: GameOverReason::Resignation,
        });
    }

    /// Take back the last turn; when that hands the turn to an
    /// AI-controlled side, take back one more so a human is on turn
    /// again. Refused while a computation is outstanding - mirroring
    /// must never race an engine that is thinking.
    pub fn undo(&mut self) -> bool {
        if self.ai_busy() {
            warn!("undo refused while a computation is outstanding");
            return false;
        }
        if !self.undo_one() {
            return false;
        }
        if self.mode(self.game.current_player()) != PlayerMode::Human {
            let _ = self.undo_one();
        }
        self.epoch += 1;
        true
    }

    fn undo_one(&mut self) -> bool {
        if !self.game.undo() {
            return false;
        }
        self.turn_log.pop();
        for side in [Color::Black, Color::White] {
            let error = match &self.bridges[side.idx()] {
                Some(bridge) => bridge
                    .lock()
                    .map_err(|_| "engine bridge lock poisoned".to_string())
                    .and_then(|mut engine| engine.mirror_undo().map_err(|e| e.to_string()))
                    .err(),
                None => None,
            };
            if let Some(reason) = error {
                self.fail_bridge(side, reason);
            }
        }
        true
    }

    /// Select who drives `side`. Entering external mode launches the
    /// engine process (if not already up) and replays the whole game
    /// into it; leaving external mode closes and drops the process.
    /// Returns false when an engine launch fails - the side stays human.
    pub fn set_player_mode(&mut self, side: Color, mode: PlayerMode) -> bool {
        if mode == PlayerMode::External {
            if self.bridges[side.idx()].is_none() {
                match self.launch_bridge() {
                    Ok(bridge) => self.bridges[side.idx()] = Some(bridge),
                    Err(reason) => {
                        warn!("{} engine launch failed: {}", side, reason);
                        self.modes[side.idx()] = PlayerMode::Human;
                        self.emit(GameEvent::ComputationFailed { side, reason });
                        return false;
                    }
                }
            }
        } else if let Some(bridge) = self.bridges[side.idx()].take() {
            close_bridge(side, bridge);
        }
        if self.schedulers[side.idx()].is_busy() {
            // Whatever that computation yields belongs to the old mode.
            self.epoch += 1;
        }
        self.modes[side.idx()] = mode;
        debug!("{} is now driven by {:?}", side, mode);
        self.dispatch_if_ai();
        true
    }

    /// Ask for an AI move for `side`. Accepted only when it is that
    /// side's turn, the side is AI-controlled, the game is live, and no
    /// computation is already outstanding for it.
    pub fn submit_ai_move(&mut self, side: Color) -> bool {
        if self.game.status() != GameStatus::InProgress
            || side != self.game.current_player()
            || self.modes[side.idx()] == PlayerMode::Human
        {
            return false;
        }
        let backend = match self.modes[side.idx()] {
            PlayerMode::MonteCarlo => ComputeBackend::MonteCarlo,
            PlayerMode::Random => ComputeBackend::Random,
            PlayerMode::External => match &self.bridges[side.idx()] {
                Some(bridge) => ComputeBackend::External(Arc::clone(bridge)),
                // Unreachable in practice: external mode implies a live
                // bridge. Degrade rather than panic.
                None => return false,
            },
            PlayerMode::Human => unreachable!(),
        };
        let board = self.game.board().clone();
        let request = ComputeRequest {
            queens: [board.queens(Color::Black), board.queens(Color::White)],
            board,
            mover: side,
            backend,
            budget: self.config.ai_budget,
            epoch: self.epoch,
        };
        self.schedulers[side.idx()].submit(request)
    }

    /// Apply any completions that are already waiting. Returns how many
    /// were applied. Call this from the host's tick/idle handler.
    pub fn poll_ai(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions.try_recv() {
            self.apply_completion(completion);
            applied += 1;
        }
        applied
    }

    /// Block up to `timeout` for one completion and apply it. Returns
    /// whether one arrived. Used by headless drivers; interactive hosts
    /// should prefer `poll_ai`.
    pub fn wait_for_ai(&mut self, timeout: Duration) -> bool {
        match self.completions.recv_timeout(timeout) {
            Ok(completion) => {
                self.apply_completion(completion);
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    fn apply_completion(&mut self, completion: Completion) {
        if completion.epoch != self.epoch {
            debug!(
                "discarding stale completion for {} (epoch {} != {})",
                completion.side, completion.epoch, self.epoch
            );
            return;
        }
        match completion.outcome {
            ComputeOutcome::Turn { turn, diagnostics } => {
                if completion.side != self.game.current_player()
                    || self.game.status() != GameStatus::InProgress
                {
                    debug!("discarding out-of-turn completion for {}", completion.side);
                    return;
                }
                if !self.apply_turn(turn, diagnostics) {
                    self.emit(GameEvent::ComputationFailed {
                        side: completion.side,
                        reason: format!("backend produced an illegal turn {:?}", turn),
                    });
                }
            }
            ComputeOutcome::NoLegalMove => {
                if completion.side != self.game.current_player()
                    || self.game.status() != GameStatus::InProgress
                {
                    return;
                }
                // Resignation-equivalent: the mover cannot act.
                self.game.resign();
                self.emit(GameEvent::GameOver {
                    winner: completion.side.other(),
                    reason: GameOverReason::Resignation,
                });
            }
            ComputeOutcome::Failed { reason } => {
                warn!("{} computation failed: {}", completion.side, reason);
                self.emit(GameEvent::ComputationFailed {
                    side: completion.side,
                    reason,
                });
            }
        }
    }

    /// The one path every applied turn goes through, human or AI:
    /// rules first, then mirroring, then events, then AI dispatch.
    fn apply_turn(&mut self, turn: Turn, diagnostics: Option<SearchDiagnostics>) -> bool {
        let mover = self.game.current_player();
        if !self.game.execute_turn(turn) {
            return false;
        }
        self.turn_log.push((mover, turn));

        let opponent = mover.other();
        let error = match &self.bridges[opponent.idx()] {
            Some(bridge) => bridge
                .lock()
                .map_err(|_| "engine bridge lock poisoned".to_string())
                .and_then(|mut engine| {
                    engine.mirror_turn(mover, turn).map_err(|e| e.to_string())
                })
                .err(),
            None => None,
        };
        if let Some(reason) = error {
            self.fail_bridge(opponent, reason);
        }

        self.emit(GameEvent::TurnApplied {
            mover,
            turn,
            diagnostics,
        });
        if let GameStatus::Over { winner } = self.game.status() {
            self.emit(GameEvent::GameOver {
                winner,
                reason: GameOverReason::Blocked,
            });
        } else {
            self.dispatch_if_ai();
        }
        true
    }

    /// Kick off a computation when the side now on turn is AI-driven.
    fn dispatch_if_ai(&mut self) {
        if self.game.status() != GameStatus::InProgress {
            return;
        }
        let side = self.game.current_player();
        if self.modes[side.idx()] != PlayerMode::Human {
            self.submit_ai_move(side);
        }
    }

    fn launch_bridge(&self) -> Result<Arc<Mutex<GtpEngine>>, String> {
        let config = self
            .config
            .engine
            .as_ref()
            .ok_or_else(|| "no external engine configured".to_string())?;
        let mut engine =
            GtpEngine::launch(config, self.config.board_size).map_err(|e| e.to_string())?;
        // Catch the engine up on everything played so far.
        for (mover, turn) in &self.turn_log {
            engine.mirror_turn(*mover, *turn).map_err(|e| e.to_string())?;
        }
        Ok(Arc::new(Mutex::new(engine)))
    }

    /// A bridge failure is fatal to that side only: drop the process,
    /// hand the side back to the human, tell the host.
    fn fail_bridge(&mut self, side: Color, reason: String) {
        warn!("{} engine bridge failed: {}", side, reason);
        if let Some(bridge) = self.bridges[side.idx()].take() {
            close_bridge(side, bridge);
        }
        self.modes[side.idx()] = PlayerMode::Human;
        self.emit(GameEvent::ComputationFailed { side, reason });
    }

    fn emit(&self, event: GameEvent) {
        // A host that dropped the receiver simply stops hearing events.
        let _ = self.events.send(event);
    }
}

impl Drop for GameController {
    fn drop(&mut self) {
        for side in [Color::Black, Color::White] {
            if let Some(bridge) = self.bridges[side.idx()].take() {
                close_bridge(side, bridge);
            }
        }
    }
}

/// Close now if we hold the last reference; otherwise a worker still owns
/// the bridge and its `Drop` will close the process when it finishes.
fn close_bridge(side: Color, bridge: Arc<Mutex<GtpEngine>>) {
    match Arc::try_unwrap(bridge) {
        Ok(mutex) => match mutex.into_inner() {
            Ok(mut engine) => engine.close(),
            Err(poisoned) => poisoned.into_inner().close(),
        },
        Err(_) => debug!("{} bridge still borrowed by a worker, deferring close", side),
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
