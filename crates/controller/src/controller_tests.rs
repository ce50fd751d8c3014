use super::*;
use std::time::Duration;

fn quick_config() -> ControllerConfig {
    ControllerConfig {
        board_size: 10,
        ai_budget: SearchBudget::from_millis(30),
        engine: None,
    }
}

fn black_opening() -> Turn {
    Turn::new(Pos::new(6, 0), Pos::new(5, 0), Pos::new(6, 0))
}

fn white_reply() -> Turn {
    Turn::new(Pos::new(3, 0), Pos::new(4, 0), Pos::new(3, 0))
}

fn drain(events: &std::sync::mpsc::Receiver<GameEvent>) -> Vec<GameEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

#[test]
fn human_turn_applies_and_emits() {
    let (mut controller, events) = GameController::new(quick_config());
    assert!(controller.execute_turn(black_opening()));
    assert_eq!(controller.current_player(), Color::White);
    assert_eq!(controller.turns_played(), 1);

    let seen = drain(&events);
    assert!(matches!(
        seen.as_slice(),
        [GameEvent::TurnApplied {
            mover: Color::Black,
            diagnostics: None,
            ..
        }]
    ));
}

#[test]
fn illegal_human_turn_is_rejected_without_events() {
    let (mut controller, events) = GameController::new(quick_config());
    // White piece, but Black is on turn.
    assert!(!controller.execute_turn(Turn::new(
        Pos::new(3, 0),
        Pos::new(4, 0),
        Pos::new(3, 0)
    )));
    assert_eq!(controller.turns_played(), 0);
    assert!(drain(&events).is_empty());
}

#[test]
fn submit_ai_move_rejects_wrong_side_and_humans() {
    let (mut controller, _events) = GameController::new(quick_config());
    // Black is human.
    assert!(!controller.submit_ai_move(Color::Black));
    controller.set_player_mode(Color::White, PlayerMode::Random);
    // White is AI but not on turn.
    assert!(!controller.submit_ai_move(Color::White));
}

#[test]
fn ai_reply_is_applied_through_the_completion_channel() {
    let (mut controller, events) = GameController::new(quick_config());
    controller.set_player_mode(Color::White, PlayerMode::Random);
    assert!(controller.execute_turn(black_opening()));
    // The white computation was dispatched automatically.
    assert!(controller.wait_for_ai(Duration::from_secs(5)));
    assert_eq!(controller.turns_played(), 2);
    assert_eq!(controller.current_player(), Color::Black);

    let seen = drain(&events);
    assert_eq!(seen.len(), 2);
    assert!(matches!(
        seen[1],
        GameEvent::TurnApplied {
            mover: Color::White,
            diagnostics: None,
            ..
        }
    ));
}

#[test]
fn montecarlo_reply_reports_diagnostics() {
    let (mut controller, events) = GameController::new(quick_config());
    controller.set_player_mode(Color::White, PlayerMode::MonteCarlo);
    assert!(controller.execute_turn(black_opening()));
    assert!(controller.wait_for_ai(Duration::from_secs(5)));
    let seen = drain(&events);
    assert!(matches!(
        seen[1],
        GameEvent::TurnApplied {
            mover: Color::White,
            diagnostics: Some(_),
            ..
        }
    ));
}

#[test]
fn undo_rewinds_one_turn_between_humans() {
    let (mut controller, _events) = GameController::new(quick_config());
    assert!(controller.execute_turn(black_opening()));
    assert!(controller.execute_turn(white_reply()));
    assert!(controller.undo());
    assert_eq!(controller.turns_played(), 1);
    assert_eq!(controller.current_player(), Color::White);
}

#[test]
fn undo_skips_back_past_an_ai_turn() {
    let (mut controller, _events) = GameController::new(quick_config());
    controller.set_player_mode(Color::White, PlayerMode::Random);
    assert!(controller.execute_turn(black_opening()));
    assert!(controller.wait_for_ai(Duration::from_secs(5)));
    assert_eq!(controller.turns_played(), 2);

    // One undo call takes back both the AI's reply and the human turn.
    assert!(controller.undo());
    assert_eq!(controller.turns_played(), 0);
    assert_eq!(controller.current_player(), Color::Black);
}

#[test]
fn undo_fails_at_start() {
    let (mut controller, _events) = GameController::new(quick_config());
    assert!(!controller.undo());
}

#[test]
fn resign_ends_the_game() {
    let (mut controller, events) = GameController::new(quick_config());
    controller.resign();
    assert_eq!(
        controller.status(),
        GameStatus::Over {
            winner: Color::White
        }
    );
    assert!(matches!(
        drain(&events).as_slice(),
        [GameEvent::GameOver {
            winner: Color::White,
            reason: GameOverReason::Resignation,
        }]
    ));
}

#[test]
fn random_self_play_finishes_with_game_over_event() {
    let (mut controller, events) = GameController::new(ControllerConfig {
        board_size: 6,
        ai_budget: SearchBudget::from_millis(5),
        engine: None,
    });
    controller.set_player_mode(Color::White, PlayerMode::Random);
    // Setting Black last puts it on turn and kicks off the game.
    controller.set_player_mode(Color::Black, PlayerMode::Random);

    // A 6x6 board has 28 empty squares, so the game ends within 28 turns.
    for _ in 0..64 {
        if controller.status() != GameStatus::InProgress {
            break;
        }
        assert!(
            controller.wait_for_ai(Duration::from_secs(5)),
            "AI stopped producing completions mid-game"
        );
    }
    assert!(matches!(controller.status(), GameStatus::Over { .. }));
    let seen = drain(&events);
    assert!(matches!(
        seen.last(),
        Some(GameEvent::GameOver {
            reason: GameOverReason::Blocked,
            ..
        })
    ));
}

#[test]
fn stale_completion_is_discarded_after_mode_change() {
    let (mut controller, events) = GameController::new(ControllerConfig {
        board_size: 10,
        ai_budget: SearchBudget::from_millis(200),
        engine: None,
    });
    controller.set_player_mode(Color::Black, PlayerMode::MonteCarlo);
    assert!(controller.ai_busy());
    // Handing the side back to the human invalidates the computation.
    controller.set_player_mode(Color::Black, PlayerMode::Human);

    assert!(controller.wait_for_ai(Duration::from_secs(5)));
    assert_eq!(controller.turns_played(), 0);
    assert!(drain(&events).is_empty());
}

#[test]
fn undo_is_refused_while_a_computation_is_outstanding() {
    let (mut controller, _events) = GameController::new(ControllerConfig {
        board_size: 10,
        ai_budget: SearchBudget::from_millis(300),
        engine: None,
    });
    assert!(controller.execute_turn(black_opening()));
    controller.set_player_mode(Color::White, PlayerMode::MonteCarlo);
    assert!(controller.ai_busy());
    assert!(!controller.undo());
    // Once the completion lands the undo goes through.
    assert!(controller.wait_for_ai(Duration::from_secs(5)));
    assert!(controller.undo());
    assert_eq!(controller.turns_played(), 0);
}

#[cfg(unix)]
mod external {
    use super::*;
    use gtp_engine::{EngineConfig, SessionState};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    const PASSING_ENGINE: &str = r#"#!/bin/sh
echo "GTP ready, beginning main protocol loop"
while read line; do
  set -- $line
  case "$1" in
    quit)
      echo "="
      echo ""
      exit 0
      ;;
    genmove)
      echo "= pass"
      echo ""
      ;;
    *)
      echo "="
      echo ""
      ;;
  esac
done
"#;

    const CRASHING_ENGINE: &str = "#!/bin/sh\nexit 1\n";

    fn fake_engine(name: &str, script: &str) -> EngineConfig {
        let dir = std::env::temp_dir().join(format!(
            "amazons-controller-test-{}-{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        let binary = dir.join("engine.sh");
        fs::write(&binary, script).unwrap();
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755)).unwrap();
        EngineConfig {
            binary,
            working_dir: dir,
            config_file: "engine.cfg".to_string(),
            model_file: "weights/amazons10x10.bin.gz".to_string(),
        }
    }

    fn external_config(name: &str, script: &str) -> ControllerConfig {
        ControllerConfig {
            board_size: 10,
            ai_budget: SearchBudget::from_millis(30),
            engine: Some(fake_engine(name, script)),
        }
    }

    #[test]
    fn late_engine_start_replays_the_whole_game() {
        let (mut controller, _events) =
            GameController::new(external_config("replay", PASSING_ENGINE));
        assert!(controller.execute_turn(black_opening()));
        assert!(controller.execute_turn(white_reply()));

        // Black's engine joins late and must see both turns.
        assert!(controller.set_player_mode(Color::Black, PlayerMode::External));
        assert_eq!(controller.engine_state(Color::Black), Some(SessionState::Ready));
        assert_eq!(controller.mirrored_plies(Color::Black), Some(6));
    }

    #[test]
    fn opponent_turns_are_mirrored_and_pass_ends_the_game() {
        let (mut controller, events) =
            GameController::new(external_config("mirror", PASSING_ENGINE));
        assert!(controller.execute_turn(black_opening()));
        assert!(controller.set_player_mode(Color::White, PlayerMode::External));
        // White engine joined after one turn: 3 plies replayed, and the
        // controller immediately asks it to move.
        assert!(controller.wait_for_ai(Duration::from_secs(5)));
        assert_eq!(controller.mirrored_plies(Color::White), Some(3));
        // The pass answer is a resignation-equivalent terminal event.
        assert_eq!(
            controller.status(),
            GameStatus::Over {
                winner: Color::Black
            }
        );
        let seen = drain(&events);
        assert!(matches!(
            seen.last(),
            Some(GameEvent::GameOver {
                winner: Color::Black,
                reason: GameOverReason::Resignation,
            })
        ));
    }

    #[test]
    fn launch_failure_downgrades_the_side_to_human() {
        let (mut controller, events) =
            GameController::new(external_config("crash", CRASHING_ENGINE));
        assert!(!controller.set_player_mode(Color::White, PlayerMode::External));
        assert_eq!(controller.mode(Color::White), PlayerMode::Human);
        assert!(controller.engine_state(Color::White).is_none());
        assert!(matches!(
            drain(&events).as_slice(),
            [GameEvent::ComputationFailed {
                side: Color::White,
                ..
            }]
        ));
    }

    #[test]
    fn no_engine_configured_is_a_clean_failure() {
        let (mut controller, events) = GameController::new(quick_config());
        assert!(!controller.set_player_mode(Color::Black, PlayerMode::External));
        assert_eq!(controller.mode(Color::Black), PlayerMode::Human);
        assert!(matches!(
            drain(&events).as_slice(),
            [GameEvent::ComputationFailed { .. }]
        ));
    }

    #[test]
    fn leaving_external_mode_releases_the_bridge() {
        let (mut controller, _events) =
            GameController::new(external_config("release", PASSING_ENGINE));
        assert!(controller.set_player_mode(Color::Black, PlayerMode::External));
        assert!(controller.engine_state(Color::Black).is_some());
        // Black is on turn, so joining dispatched a genmove; let it land
        // before switching away.
        assert!(controller.wait_for_ai(Duration::from_secs(5)));
        assert!(controller.set_player_mode(Color::Black, PlayerMode::Human));
        assert!(controller.engine_state(Color::Black).is_none());
    }

    #[test]
    fn undo_unwinds_the_engine_mirror() {
        let (mut controller, _events) =
            GameController::new(external_config("undo", PASSING_ENGINE));
        assert!(controller.execute_turn(black_opening()));
        assert!(controller.execute_turn(white_reply()));
        assert!(controller.set_player_mode(Color::Black, PlayerMode::External));
        assert_eq!(controller.mirrored_plies(Color::Black), Some(6));
        // Black's engine passes immediately; the game ends, but a
        // finished game can still be rewound.
        assert!(controller.wait_for_ai(Duration::from_secs(5)));
        assert!(controller.undo());
        // White (the side now on turn after one undo) is human, so only
        // one turn was taken back.
        assert_eq!(controller.turns_played(), 1);
        assert_eq!(controller.mirrored_plies(Color::Black), Some(3));
    }
}
