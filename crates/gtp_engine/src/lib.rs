//! External engine bridge.
//!
//! Drives one long-lived engine process over a line-oriented text
//! protocol: every command is a single newline-terminated line, every
//! response a block of lines terminated by a blank line. A block whose
//! first line starts with `=` is success; `?` is a command-level failure.
//!
//! The protocol models one Amazons turn (queen move + arrow) as three
//! single-stone placements with alternating color tokens, both when
//! mirroring local turns (`play`) and when asking the engine to move
//! (`genmove`). That convention comes from the engine itself and has to
//! be preserved exactly, including the fact that `genmove` advances the
//! engine's own game record: the caller must never replay an
//! engine-generated turn back into the same engine.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use amazons_core::{coords, Color, Turn};
use log::{debug, info, warn};
use thiserror::Error;

/// Startup line that marks the end of engine boot output.
pub const READY_SENTINEL: &str = "GTP ready";

/// How long `close` waits for a graceful exit before killing the process.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle of one engine process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unstarted,
    Launching,
    AwaitingReady,
    Ready,
    Closed,
    Failed,
}

#[derive(Debug, Error)]
pub enum GtpError {
    #[error("failed to launch engine `{binary}`: {source}")]
    Launch {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("engine exited before reporting ready")]
    ExitedBeforeReady,
    #[error("engine i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine closed its output stream")]
    Eof,
    #[error("command rejected: `{command}` -> {response}")]
    CommandRejected { command: String, response: String },
    #[error("malformed response to `{command}`: {response:?}")]
    MalformedResponse { command: String, response: String },
    #[error("coordinate ({row}, {col}) is off the {size}x{size} board")]
    CoordinateOutOfRange { row: i8, col: i8, size: usize },
    #[error("undo requested with no mirrored turns")]
    UndoUnderflow,
    #[error("session is {0:?}, expected Ready")]
    NotReady(SessionState),
}

/// Where and how to launch the engine binary.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Engine executable.
    pub binary: PathBuf,
    /// Working directory for the process; config and model paths are
    /// resolved by the engine relative to this.
    pub working_dir: PathBuf,
    /// Config file argument, e.g. "engine.cfg".
    pub config_file: String,
    /// Model weights argument, e.g. "weights/amazons10x10.bin.gz".
    pub model_file: String,
}

/// Outcome of a `genmove` turn query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestTurn {
    Turn(Turn),
    /// The engine answered "pass": the mover has no legal turn.
    NoLegalMove,
}

/// Handle to one running engine process.
///
/// The pipe pair is single-consumer: whichever thread issues a command
/// must read its whole response before anyone else writes. Callers share
/// the handle behind a mutex and hold the lock for the full exchange.
pub struct GtpEngine {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    state: SessionState,
    board_size: usize,
    mirrored_plies: u32,
}

impl GtpEngine {
    /// Spawn the engine, drain startup output until the ready sentinel,
    /// and set up the board. The process is never left half-started: any
    /// failure here transitions to `Failed` and tears the process down.
    pub fn launch(config: &EngineConfig, board_size: usize) -> Result<Self, GtpError> {
        info!(
            "launching engine {} (cwd {})",
            config.binary.display(),
            config.working_dir.display()
        );
        let mut child = Command::new(&config.binary)
            .args([
                "gtp",
                "-config",
                config.config_file.as_str(),
                "-model",
                config.model_file.as_str(),
            ])
            .current_dir(&config.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| GtpError::Launch {
                binary: config.binary.display().to_string(),
                source,
            })?;

        let stdin = child.stdin.take().expect("stdin was piped");
        let stdout = BufReader::new(child.stdout.take().expect("stdout was piped"));
        if let Some(stderr) = child.stderr.take() {
            // Engines chatter on stderr; keep it out of the protocol
            // stream but visible in the logs.
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    debug!("engine stderr: {}", line);
                }
            });
        }

        let mut engine = Self {
            child,
            stdin,
            stdout,
            state: SessionState::Launching,
            board_size,
            mirrored_plies: 0,
        };

        if let Err(e) = engine.wait_for_ready() {
            engine.state = SessionState::Failed;
            let _ = engine.child.kill();
            let _ = engine.child.wait();
            return Err(e);
        }
        engine.initialize(board_size)?;
        Ok(engine)
    }

    fn wait_for_ready(&mut self) -> Result<(), GtpError> {
        self.state = SessionState::AwaitingReady;
        let mut line = String::new();
        loop {
            line.clear();
            if self.stdout.read_line(&mut line)? == 0 {
                return Err(GtpError::ExitedBeforeReady);
            }
            let line = line.trim();
            debug!("engine startup: {}", line);
            if line.contains(READY_SENTINEL) {
                self.state = SessionState::Ready;
                info!("engine ready");
                return Ok(());
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    /// Protocol placements mirrored since the last `clear_board`;
    /// three per complete local turn.
    pub fn mirrored_plies(&self) -> u32 {
        self.mirrored_plies
    }

    /// `boardsize` + `clear_board`; resets the mirrored ply counter.
    pub fn initialize(&mut self, board_size: usize) -> Result<(), GtpError> {
        self.exec(&format!("boardsize {}", board_size))?;
        self.exec("clear_board")?;
        self.board_size = board_size;
        self.mirrored_plies = 0;
        Ok(())
    }

    /// `clear_board` alone, keeping the configured size.
    pub fn clear_board(&mut self) -> Result<(), GtpError> {
        self.exec("clear_board")?;
        self.mirrored_plies = 0;
        Ok(())
    }

    /// Mirror one locally played turn: three `play` placements with the
    /// mover / opponent / mover color sequence the engine expects.
    pub fn mirror_turn(&mut self, mover: Color, turn: Turn) -> Result<(), GtpError> {
        let from = self.encode(turn.from)?;
        let to = self.encode(turn.to)?;
        let shot = self.encode(turn.shot)?;
        let m = color_token(mover);
        let o = color_token(mover.other());
        self.exec(&format!("play {} {}", m, from))?;
        self.exec(&format!("play {} {}", o, to))?;
        self.exec(&format!("play {} {}", m, shot))?;
        self.mirrored_plies += 3;
        Ok(())
    }

    /// Unwind one mirrored turn (three `undo` commands). Refuses when the
    /// counter would go negative; that means the caller lost sync.
    pub fn mirror_undo(&mut self) -> Result<(), GtpError> {
        if self.mirrored_plies < 3 {
            return Err(GtpError::UndoUnderflow);
        }
        self.exec("undo")?;
        self.exec("undo")?;
        self.exec("undo")?;
        self.mirrored_plies -= 3;
        Ok(())
    }

    /// Ask the engine for the mover's complete turn: three `genmove`
    /// queries decoded back into board coordinates. A "pass" answer from
    /// any of the three means the mover has no legal turn.
    ///
    /// `genmove` also records the placements inside the engine, so the
    /// counter advances exactly as if the turn had been mirrored.
    pub fn best_turn(&mut self, mover: Color) -> Result<BestTurn, GtpError> {
        let m = color_token(mover);
        let o = color_token(mover.other());

        let mut coords_out = [amazons_core::Pos::new(0, 0); 3];
        for (i, color) in [m, o, m].iter().enumerate() {
            let command = format!("genmove {}", color);
            let payload = self.exec(&command)?;
            let token = payload.split_whitespace().next().unwrap_or("");
            if token.eq_ignore_ascii_case("pass") {
                return Ok(BestTurn::NoLegalMove);
            }
            coords_out[i] = coords::gtp_to_pos(token, self.board_size).ok_or_else(|| {
                GtpError::MalformedResponse {
                    command,
                    response: payload.clone(),
                }
            })?;
        }
        self.mirrored_plies += 3;
        Ok(BestTurn::Turn(Turn::new(
            coords_out[0],
            coords_out[1],
            coords_out[2],
        )))
    }

    /// `time_settings <main> <byoyomi> <stones>`.
    pub fn set_time_controls(
        &mut self,
        main_secs: u64,
        byoyomi_secs: u64,
        byoyomi_stones: u32,
    ) -> Result<(), GtpError> {
        self.exec(&format!(
            "time_settings {} {} {}",
            main_secs, byoyomi_secs, byoyomi_stones
        ))?;
        Ok(())
    }

    /// Graceful `quit`, bounded wait, then forced termination.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        info!("closing engine");
        let _ = writeln!(self.stdin, "quit");
        let _ = self.stdin.flush();

        let deadline = Instant::now() + CLOSE_TIMEOUT;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!("engine exited: {}", status);
                    break;
                }
                Ok(None) if Instant::now() < deadline => {
                    thread::sleep(Duration::from_millis(50));
                }
                _ => {
                    warn!("engine did not quit in time, killing it");
                    let _ = self.child.kill();
                    let _ = self.child.wait();
                    break;
                }
            }
        }
        self.state = SessionState::Closed;
    }

    fn encode(&self, pos: amazons_core::Pos) -> Result<String, GtpError> {
        coords::pos_to_gtp(pos, self.board_size).ok_or(GtpError::CoordinateOutOfRange {
            row: pos.row,
            col: pos.col,
            size: self.board_size,
        })
    }

    /// Send one command and parse its response block. I/O failures mark
    /// the session `Failed`; a `?` rejection is fatal only to this
    /// command and leaves the session usable.
    fn exec(&mut self, command: &str) -> Result<String, GtpError> {
        if self.state != SessionState::Ready {
            return Err(GtpError::NotReady(self.state));
        }
        debug!("-> {}", command);
        if let Err(e) = writeln!(self.stdin, "{}", command).and_then(|_| self.stdin.flush()) {
            self.state = SessionState::Failed;
            return Err(GtpError::Io(e));
        }
        let block = match read_block(&mut self.stdout) {
            Ok(block) => block,
            Err(e) => {
                self.state = SessionState::Failed;
                return Err(e);
            }
        };
        debug!("<- {}", block.join(" | "));
        parse_block(&block, command)
    }
}

impl Drop for GtpEngine {
    fn drop(&mut self) {
        self.close();
    }
}

fn color_token(color: Color) -> char {
    match color {
        Color::Black => 'b',
        Color::White => 'w',
    }
}

/// Read one response block: lines up to (not including) the first blank
/// line. `Err(Eof)` when the stream ends mid-block.
fn read_block(reader: &mut impl BufRead) -> Result<Vec<String>, GtpError> {
    let mut lines = Vec::new();
    let mut buf = String::new();
    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            return Err(GtpError::Eof);
        }
        let line = buf.trim();
        if line.is_empty() {
            return Ok(lines);
        }
        lines.push(line.to_string());
    }
}

/// Success blocks start with `=`; the payload is the remainder plus any
/// continuation lines. `?` blocks carry the engine's complaint.
fn parse_block(lines: &[String], command: &str) -> Result<String, GtpError> {
    let joined = lines.join("\n");
    if let Some(rest) = joined.strip_prefix('=') {
        Ok(rest.trim().to_string())
    } else if joined.starts_with('?') {
        Err(GtpError::CommandRejected {
            command: command.to_string(),
            response: joined,
        })
    } else {
        Err(GtpError::MalformedResponse {
            command: command.to_string(),
            response: joined,
        })
    }
}

#[cfg(test)]
#[path = "framing_tests.rs"]
mod framing_tests;
