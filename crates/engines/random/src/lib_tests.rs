use super::*;
use amazons_core::{Cell, Game, GameStatus, Pos};

#[test]
fn returns_a_legal_turn_from_the_start_position() {
    let mut engine = RandomEngine::new();
    let game = Game::new(10);
    let result = engine.search(game.board(), Color::Black, SearchBudget::default());
    let turn = result.best_turn.expect("start position has legal turns");
    let mut probe = game.clone();
    assert!(probe.execute_turn(turn), "{:?} should be legal", turn);
}

#[test]
fn returns_none_when_mover_is_blocked() {
    let mut engine = RandomEngine::new();
    let mut board = Board::empty(6);
    board.set_cell(Pos::new(0, 0), Cell::Queen(Color::Black));
    board.set_cell(Pos::new(0, 1), Cell::Obstacle);
    board.set_cell(Pos::new(1, 0), Cell::Obstacle);
    board.set_cell(Pos::new(1, 1), Cell::Obstacle);
    let result = engine.search(&board, Color::Black, SearchBudget::default());
    assert!(result.best_turn.is_none());
}

#[test]
fn self_play_terminates() {
    let mut engine = RandomEngine::new();
    let mut game = Game::new(6);
    // An obstacle lands every turn, so the game must end within the
    // number of empty squares.
    for _ in 0..36 {
        if game.status() != GameStatus::InProgress {
            break;
        }
        let mover = game.current_player();
        let result = engine.search(game.board(), mover, SearchBudget::default());
        match result.best_turn {
            Some(turn) => assert!(game.execute_turn(turn)),
            None => break,
        }
    }
    assert!(matches!(game.status(), GameStatus::Over { .. }));
}
