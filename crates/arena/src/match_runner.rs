//! Match runner for playing games between backends

use std::time::Duration;

use amazons_core::{Board, Cell, Color, GameStatus, SearchBudget};
use game_controller::{
    ControllerConfig, GameController, GameEvent, GameOverReason, PlayerMode,
};
use gtp_engine::EngineConfig;
use log::warn;

use crate::report::{GameRecord, MatchReport};

/// Configuration for a match
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Number of games to play
    pub num_games: u32,
    /// Board size for every game
    pub board_size: usize,
    /// Per-move budget for both sides
    pub budget: SearchBudget,
    /// External engine description, if either spec is "external"
    pub engine: Option<EngineConfig>,
    /// Whether to alternate colors each game
    pub alternate_colors: bool,
    /// Print boards and progress during the match
    pub verbose: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            num_games: 10,
            board_size: amazons_core::DEFAULT_SIZE,
            budget: SearchBudget::default(),
            engine: None,
            alternate_colors: true,
            verbose: true,
        }
    }
}

/// Runs matches between two backends
pub struct MatchRunner {
    config: MatchConfig,
}

impl MatchRunner {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    /// Run a match between two backends; `engine1`/`engine2` name the
    /// report columns, colors alternate when configured.
    pub fn run_match(&self, engine1: PlayerMode, engine2: PlayerMode) -> MatchReport {
        let mut report = MatchReport::new(
            &mode_name(engine1),
            &mode_name(engine2),
            self.config.board_size,
            self.config.budget.move_time.as_millis() as u64,
        );

        for game_num in 0..self.config.num_games {
            let engine1_black = !self.config.alternate_colors || game_num % 2 == 0;
            let (black, white) = if engine1_black {
                (engine1, engine2)
            } else {
                (engine2, engine1)
            };

            match self.play_game(black, white) {
                Some((winner, reason, turns)) => {
                    let engine1_won = (winner == Color::Black) == engine1_black;
                    let record = GameRecord {
                        game: game_num + 1,
                        engine1_black,
                        winner: if engine1_won { "engine1" } else { "engine2" }.to_string(),
                        reason: match reason {
                            GameOverReason::Blocked => "blocked",
                            GameOverReason::Resignation => "resignation",
                        }
                        .to_string(),
                        turns,
                    };
                    if self.config.verbose {
                        println!(
                            "Game {}/{}: {} wins as {} after {} turns - Score: {}-{}",
                            game_num + 1,
                            self.config.num_games,
                            if engine1_won { report.engine1.as_str() } else { report.engine2.as_str() },
                            winner,
                            turns,
                            report.engine1_wins + u32::from(engine1_won),
                            report.engine2_wins + u32::from(!engine1_won),
                        );
                    }
                    report.add_game(record);
                }
                None => {
                    warn!("game {} did not finish, recording a failure", game_num + 1);
                    report.add_failure();
                }
            }
        }

        report
    }

    /// Play a single game; None when a side failed instead of finishing.
    fn play_game(&self, black: PlayerMode, white: PlayerMode) -> Option<(Color, GameOverReason, usize)> {
        let (mut controller, events) = GameController::new(ControllerConfig {
            board_size: self.config.board_size,
            ai_budget: self.config.budget,
            engine: self.config.engine.clone(),
        });
        if !controller.set_player_mode(Color::White, white) {
            return None;
        }
        // Black is set last: it is on turn, so this kicks the game off.
        if !controller.set_player_mode(Color::Black, black) {
            return None;
        }

        // Generous per-move ceiling; external engines own their clock.
        let move_timeout = self.config.budget.move_time + Duration::from_secs(30);
        let mut reason = GameOverReason::Blocked;
        while controller.status() == GameStatus::InProgress {
            if !controller.wait_for_ai(move_timeout) {
                warn!("no completion within {:?}, aborting game", move_timeout);
                return None;
            }
            for event in events.try_iter() {
                match event {
                    GameEvent::GameOver { reason: r, .. } => reason = r,
                    GameEvent::ComputationFailed { side, reason } => {
                        warn!("{} failed: {}", side, reason);
                        return None;
                    }
                    GameEvent::TurnApplied { .. } => {}
                }
            }
        }

        if self.config.verbose {
            print_board(&controller.board_snapshot());
        }
        match controller.status() {
            GameStatus::Over { winner } => Some((winner, reason, controller.turns_played())),
            GameStatus::InProgress => None,
        }
    }
}

fn mode_name(mode: PlayerMode) -> String {
    match mode {
        PlayerMode::Human => "human",
        PlayerMode::MonteCarlo => "montecarlo",
        PlayerMode::Random => "random",
        PlayerMode::External => "external",
    }
    .to_string()
}

/// Plain text board, black queens `b`, white queens `w`, obstacles `#`.
pub fn print_board(board: &Board) {
    let n = board.size() as i8;
    for row in 0..n {
        let mut line = String::with_capacity(board.size() * 2);
        for col in 0..n {
            line.push(match board.cell(amazons_core::Pos::new(row, col)) {
                Cell::Empty => '.',
                Cell::Queen(Color::Black) => 'b',
                Cell::Queen(Color::White) => 'w',
                Cell::Obstacle => '#',
            });
            line.push(' ');
        }
        println!("{}", line.trim_end());
    }
    println!();
}
