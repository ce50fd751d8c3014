//! UCT search over complete turns.
//!
//! The tree is one level deep: each legal turn of the root position is a
//! child, and every visit beyond selection is a uniform random playout to
//! the end of the game. Deeper trees buy little here because the branching
//! factor collapses fast as obstacles accumulate, while playouts stay
//! cheap; the reference engines this replaces worked the same way.

use amazons_core::{Board, Cell, Color, SearchClock, Turn};
use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;

const EXPLORATION: f64 = 1.41421356; // sqrt(2)

struct Child {
    turn: Turn,
    board: Board,
    wins: f64,
    visits: u64,
}

pub struct UctOutcome {
    pub best_turn: Option<Turn>,
    pub win_probability: f64,
    pub playouts: u64,
    pub value: f64,
}

pub fn uct_search(board: &Board, mover: Color, clock: SearchClock) -> UctOutcome {
    let mut rng = rand::thread_rng();
    let mut children: Vec<Child> = board
        .legal_turns(mover)
        .into_iter()
        .map(|turn| Child {
            turn,
            board: apply(board, mover, turn),
            wins: 0.0,
            visits: 0,
        })
        .collect();

    if children.is_empty() {
        return UctOutcome {
            best_turn: None,
            win_probability: 0.0,
            playouts: 0,
            value: 0.0,
        };
    }

    let mut total: u64 = 0;
    while !clock.expired() {
        let pick = select(&children, total);
        let child = &mut children[pick];
        // The opponent moves first in the playout; the mover already moved.
        let won = playout(&child.board, mover.other(), mover, &mut rng);
        child.visits += 1;
        if won {
            child.wins += 1.0;
        }
        total += 1;
    }

    let best = children
        .iter()
        .max_by_key(|c| c.visits)
        .expect("children is non-empty");
    let value = if best.visits > 0 {
        best.wins / best.visits as f64
    } else {
        0.0
    };
    UctOutcome {
        best_turn: Some(best.turn),
        win_probability: value * 100.0,
        playouts: total,
        value,
    }
}

/// UCB1: every child is tried once before any is revisited.
fn select(children: &[Child], total: u64) -> usize {
    if let Some(i) = children.iter().position(|c| c.visits == 0) {
        return i;
    }
    let ln_total = (total.max(1) as f64).ln();
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (i, c) in children.iter().enumerate() {
        let mean = c.wins / c.visits as f64;
        let score = mean + EXPLORATION * (ln_total / c.visits as f64).sqrt();
        if score > best_score {
            best_score = score;
            best = i;
        }
    }
    best
}

fn apply(board: &Board, mover: Color, turn: Turn) -> Board {
    let mut next = board.clone();
    next.set_cell(turn.to, Cell::Queen(mover));
    next.set_cell(turn.from, Cell::Empty);
    next.set_cell(turn.shot, Cell::Obstacle);
    next
}

/// Play random turns until one side is blocked; true if `perspective` wins.
fn playout(board: &Board, to_move: Color, perspective: Color, rng: &mut ThreadRng) -> bool {
    let mut board = board.clone();
    let mut side = to_move;
    loop {
        match random_turn(&board, side, rng) {
            Some(turn) => {
                let queen = board.cell(turn.from);
                board.set_cell(turn.to, queen);
                board.set_cell(turn.from, Cell::Empty);
                board.set_cell(turn.shot, Cell::Obstacle);
                side = side.other();
            }
            // The side to move is blocked and loses.
            None => return side != perspective,
        }
    }
}

/// Sample a roughly uniform legal turn without enumerating them all:
/// shuffle the mover's queens, take the first with any move, then pick a
/// random destination and a random shot.
fn random_turn(board: &Board, mover: Color, rng: &mut ThreadRng) -> Option<Turn> {
    let mut queens = board.queens(mover);
    queens.shuffle(rng);
    for from in queens {
        let moves = board.valid_moves(from);
        if moves.is_empty() {
            continue;
        }
        let to = moves[rng.gen_range(0..moves.len())];
        let mut moved = board.clone();
        moved.set_cell(to, moved.cell(from));
        moved.set_cell(from, Cell::Empty);
        let shots = moved.valid_moves(to);
        // The vacated square is always shootable, so this cannot be empty.
        let shot = shots[rng.gen_range(0..shots.len())];
        return Some(Turn::new(from, to, shot));
    }
    None
}
