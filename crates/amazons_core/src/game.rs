use crate::board::{Board, DEFAULT_SIZE};
use crate::types::*;

/// Turn state machine: legality checking, snapshot history, undo and
/// terminal detection. Mutated only from the thread that owns it.
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    current: Color,
    history: Vec<Board>,
    status: GameStatus,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE)
    }
}

impl Game {
    pub fn new(size: usize) -> Self {
        let board = Board::starting(size);
        Self {
            history: vec![board.clone()],
            board,
            current: Color::Black,
            status: GameStatus::InProgress,
        }
    }

    /// Fixture/analysis entry point: adopt an arbitrary position with
    /// `to_move` on turn. Terminal detection runs immediately, so a
    /// position where `to_move` is already blocked comes out `Over`.
    pub fn with_board(board: Board, to_move: Color) -> Self {
        let mut game = Self {
            history: vec![board.clone()],
            board,
            current: to_move,
            status: GameStatus::InProgress,
        };
        game.check_terminal();
        game
    }

    pub fn reset(&mut self, size: usize) {
        *self = Self::new(size);
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Color {
        self.current
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn turns_played(&self) -> usize {
        self.history.len() - 1
    }

    pub fn valid_moves(&self, from: Pos) -> Vec<Pos> {
        self.board.valid_moves(from)
    }

    /// Apply one complete turn. Fails without touching any state unless
    /// the moved piece belongs to the side on turn, the destination is
    /// ray-reachable, and the shot is ray-reachable on the board with the
    /// queen already relocated.
    pub fn execute_turn(&mut self, turn: Turn) -> bool {
        if self.status != GameStatus::InProgress {
            return false;
        }
        if !self.board.in_bounds(turn.from)
            || !self.board.in_bounds(turn.to)
            || !self.board.in_bounds(turn.shot)
        {
            return false;
        }
        if self.board.cell(turn.from) != Cell::Queen(self.current) {
            return false;
        }
        if !self.board.valid_moves(turn.from).contains(&turn.to) {
            return false;
        }
        let mut next = self.board.clone();
        next.set_cell(turn.to, Cell::Queen(self.current));
        next.set_cell(turn.from, Cell::Empty);
        if !next.valid_moves(turn.to).contains(&turn.shot) {
            return false;
        }
        next.set_cell(turn.shot, Cell::Obstacle);

        self.board = next;
        self.history.push(self.board.clone());
        self.current = self.current.other();
        self.check_terminal();
        true
    }

    /// Pop the last snapshot and hand the turn back. Legal from either
    /// state; clears a terminal status. False at the initial snapshot.
    pub fn undo(&mut self) -> bool {
        if self.history.len() == 1 {
            return false;
        }
        self.history.pop();
        self.board = self.history.last().cloned().unwrap();
        self.current = self.current.other();
        self.status = GameStatus::InProgress;
        true
    }

    /// Administrative loss for the side on turn. Board and history are
    /// untouched, so the position can still be reviewed or undone.
    pub fn resign(&mut self) {
        if self.status != GameStatus::InProgress {
            return;
        }
        self.status = GameStatus::Over {
            winner: self.current.other(),
        };
    }

    /// The side on turn loses when none of its queens can move.
    fn check_terminal(&mut self) {
        if !self.board.has_any_move(self.current) {
            self.status = GameStatus::Over {
                winner: self.current.other(),
            };
        }
    }
}

#[cfg(test)]
#[path = "game_tests.rs"]
mod game_tests;
