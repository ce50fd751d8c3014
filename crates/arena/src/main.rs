//! Arena CLI
//!
//! Play head-to-head matches between Amazons backends and write a JSON
//! report.

mod config;
mod match_runner;
mod report;

use std::env;
use std::path::Path;

use amazons_core::SearchBudget;
use game_controller::PlayerMode;
use match_runner::{MatchConfig, MatchRunner};

fn print_usage() {
    println!("Amazons Arena");
    println!();
    println!("Usage:");
    println!("  arena match <engine1> <engine2> [options]");
    println!();
    println!("Engines:");
    println!("  montecarlo    - UCT search with random playouts");
    println!("  random        - uniform random legal turns");
    println!("  external      - external process (needs --engine-config)");
    println!();
    println!("Options:");
    println!("  --games N            games to play (default 10)");
    println!("  --size N             board size (default 10)");
    println!("  --budget-ms MS       per-move budget (default 1000)");
    println!("  --engine-config FILE TOML description of the external engine");
    println!("  --report FILE        write a JSON report here");
    println!("  --quiet              no per-game output");
    println!();
    println!("Examples:");
    println!("  arena match montecarlo random --games 20 --budget-ms 500");
    println!("  arena match external montecarlo --engine-config engine.toml");
}

fn parse_mode(spec: &str) -> Option<PlayerMode> {
    match spec.to_lowercase().as_str() {
        "montecarlo" | "mcts" => Some(PlayerMode::MonteCarlo),
        "random" => Some(PlayerMode::Random),
        "external" | "engine" => Some(PlayerMode::External),
        _ => None,
    }
}

fn run_match(args: &[String]) {
    if args.len() < 2 {
        eprintln!("Error: match requires two engine specifications");
        print_usage();
        return;
    }

    let engine1_spec = &args[0];
    let engine2_spec = &args[1];
    let (engine1, engine2) = match (parse_mode(engine1_spec), parse_mode(engine2_spec)) {
        (Some(e1), Some(e2)) => (e1, e2),
        _ => {
            eprintln!("Unknown engine spec: {} / {}", engine1_spec, engine2_spec);
            print_usage();
            return;
        }
    };

    let mut num_games: u32 = 10;
    let mut board_size: usize = 10;
    let mut budget_ms: u64 = 1000;
    let mut engine_config_path: Option<String> = None;
    let mut report_path: Option<String> = None;
    let mut verbose = true;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--games" | "-g" => {
                if i + 1 < args.len() {
                    num_games = args[i + 1].parse().unwrap_or(10);
                    i += 1;
                }
            }
            "--size" | "-s" => {
                if i + 1 < args.len() {
                    board_size = args[i + 1].parse().unwrap_or(10);
                    i += 1;
                }
            }
            "--budget-ms" | "-b" => {
                if i + 1 < args.len() {
                    budget_ms = args[i + 1].parse().unwrap_or(1000);
                    i += 1;
                }
            }
            "--engine-config" => {
                if i + 1 < args.len() {
                    engine_config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--report" => {
                if i + 1 < args.len() {
                    report_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--quiet" | "-q" => verbose = false,
            _ => {}
        }
        i += 1;
    }

    let engine = match engine_config_path {
        Some(path) => match config::load_engine_config(Path::new(&path)) {
            Ok(engine) => Some(engine),
            Err(e) => {
                eprintln!("Warning: {}", e);
                None
            }
        },
        None => None,
    };
    if engine.is_none() && (engine1 == PlayerMode::External || engine2 == PlayerMode::External) {
        eprintln!("Error: 'external' requires a working --engine-config");
        return;
    }

    println!("=== Match: {} vs {} ===", engine1_spec, engine2_spec);
    println!(
        "Games: {}, Board: {}x{}, Budget: {} ms",
        num_games, board_size, board_size, budget_ms
    );
    println!();

    let runner = MatchRunner::new(MatchConfig {
        num_games,
        board_size,
        budget: SearchBudget::from_millis(budget_ms),
        engine,
        alternate_colors: true,
        verbose,
    });
    let result = runner.run_match(engine1, engine2);

    println!();
    println!("=== Final Result ===");
    println!(
        "{}: {} wins, {}: {} wins, {} failed games",
        result.engine1, result.engine1_wins, result.engine2, result.engine2_wins, result.failed_games
    );
    println!("Score for {}: {:.1}%", result.engine1, result.score() * 100.0);

    if let Some(path) = report_path {
        match result.save(Path::new(&path)) {
            Ok(()) => println!("Report written to {}", path),
            Err(e) => eprintln!("Warning: {}", e),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "match" => run_match(&args[2..]),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            print_usage();
        }
    }
}
