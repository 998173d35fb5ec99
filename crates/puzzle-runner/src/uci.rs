//! UCI engine session over a child process (async I/O)
//!
//! One long-lived subprocess per run. The session is strictly
//! request/response: one `analyze` call at a time, each consuming streamed
//! `info` lines up to the terminal `bestmove` line. The search limit is
//! advisory — a protocol-correct engine stops itself at the movetime.

use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::debug;

use crate::error::RunnerError;

/// Grace period for the `uci`/`uciok` identification handshake.
const HANDSHAKE_GRACE: Duration = Duration::from_secs(10);

/// How long to wait after `quit` before killing the process.
const QUIT_GRACE: Duration = Duration::from_secs(2);

/// Null-move sentinel: the engine reported no move at all.
pub const NULL_MOVE: &str = "0000";

/// Wall-clock budget for one `go` command.
#[derive(Debug, Clone, Copy)]
pub struct SearchLimit {
    pub movetime: Duration,
}

/// Relative score, from the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawns
    Cp(i32),
    /// Mate in N moves (negative: getting mated)
    Mate(i32),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Cp(cp) => write!(f, "{cp:+}"),
            Score::Mate(n) => write!(f, "#{n:+}"),
        }
    }
}

/// Statistics folded from the info lines of one analysis.
///
/// Fields the engine never reported stay `None`; they must not be read as
/// zero.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub score: Option<Score>,
    /// First move of the most recent principal variation.
    pub pv_move: Option<String>,
    /// Move from the terminal `bestmove` line.
    pub best_move_line: Option<String>,
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
}

impl SearchResult {
    /// The move to compare against the puzzle solution: pv head, falling
    /// back to the `bestmove` line, then to the null-move sentinel.
    pub fn best_move(&self) -> &str {
        self.pv_move
            .as_deref()
            .or(self.best_move_line.as_deref())
            .unwrap_or(NULL_MOVE)
    }
}

/// One analysis per call against a running engine. Implemented by the live
/// UCI session and by scripted stubs in tests.
#[allow(async_fn_in_trait)]
pub trait Analyze {
    async fn analyze(&mut self, fen: &str, limit: SearchLimit)
        -> Result<SearchResult, RunnerError>;
}

/// A running UCI engine. Owns the subprocess handle and both pipes; the
/// process is reaped by `shutdown` and killed in `Drop` as a backstop.
pub struct UciEngine {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    name: Option<String>,
    stopped: bool,
}

impl UciEngine {
    /// Spawn the engine and perform the identification handshake.
    pub async fn start(program: &Path) -> Result<Self, RunnerError> {
        let mut child = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                RunnerError::EngineStart(format!("failed to spawn `{}`: {e}", program.display()))
            })?;

        let stdin = child.stdin.take().unwrap();
        let stdout = BufReader::new(child.stdout.take().unwrap());

        let mut engine = Self {
            child,
            stdin,
            stdout,
            name: None,
            stopped: false,
        };

        let handshake = timeout(HANDSHAKE_GRACE, engine.handshake()).await;
        match handshake {
            Err(_) => {
                engine.shutdown().await;
                Err(RunnerError::EngineStart(format!(
                    "`{}` did not complete the uci handshake within {HANDSHAKE_GRACE:?}",
                    program.display()
                )))
            }
            Ok(Err(RunnerError::EngineComm(reason))) => {
                engine.shutdown().await;
                Err(RunnerError::EngineStart(reason))
            }
            Ok(Err(e)) => {
                engine.shutdown().await;
                Err(e)
            }
            Ok(Ok(())) => Ok(engine),
        }
    }

    /// Engine name from the `id name` handshake line, if it sent one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    async fn handshake(&mut self) -> Result<(), RunnerError> {
        self.send("uci").await?;
        loop {
            let line = self.read_line().await?;
            if let Some(name) = line.strip_prefix("id name ") {
                self.name = Some(name.to_string());
            }
            if line == "uciok" {
                break;
            }
        }
        self.send("isready").await?;
        self.wait_for("readyok").await?;
        Ok(())
    }

    /// Send `setoption` lines. Fire-and-forget: the protocol defines no
    /// acknowledgment. Must be issued before any analysis.
    pub async fn configure(&mut self, options: &[(&str, String)]) -> Result<(), RunnerError> {
        for (name, value) in options {
            self.send(&format!("setoption name {name} value {value}")).await?;
        }
        Ok(())
    }

    /// Send `quit` and wait for the process to exit; kill it if it does not.
    /// Safe to call more than once.
    pub async fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        let _ = self.send("quit").await;
        if timeout(QUIT_GRACE, self.child.wait()).await.is_err() {
            let _ = self.child.kill().await;
        }
    }

    async fn send(&mut self, cmd: &str) -> Result<(), RunnerError> {
        debug!(cmd, "uci <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| RunnerError::EngineComm(format!("failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| RunnerError::EngineComm(format!("failed to flush engine stdin: {e}")))?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, RunnerError> {
        let mut line = String::new();
        let n = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| RunnerError::EngineComm(format!("failed to read from engine: {e}")))?;
        if n == 0 {
            return Err(RunnerError::EngineComm(
                "engine closed its output stream".to_string(),
            ));
        }
        let line = line.trim().to_string();
        debug!(line = %line, "uci >");
        Ok(line)
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), RunnerError> {
        loop {
            if self.read_line().await? == expected {
                return Ok(());
            }
        }
    }
}

impl Analyze for UciEngine {
    /// Set the position and run one bounded search, folding the streamed
    /// info lines into a `SearchResult`.
    async fn analyze(
        &mut self,
        fen: &str,
        limit: SearchLimit,
    ) -> Result<SearchResult, RunnerError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go movetime {}", limit.movetime.as_millis())).await?;

        let mut result = SearchResult::default();
        loop {
            let line = self.read_line().await?;
            if let Some(rest) = line.strip_prefix("info ") {
                fold_info(&mut result, rest);
            } else if let Some(rest) = line.strip_prefix("bestmove") {
                if let Some(m) = rest.split_whitespace().next() {
                    if m != "(none)" {
                        result.best_move_line = Some(m.to_string());
                    }
                }
                break;
            }
        }

        Ok(result)
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill so no exit path leaks the process
        let _ = self.child.start_kill();
    }
}

/// Fold one `info` line into the accumulator. Later lines overwrite earlier
/// values field by field; `score cp` and `score mate` displace each other.
fn fold_info(result: &mut SearchResult, line: &str) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                if let Some(v) = tokens.get(i + 1).and_then(|t| t.parse().ok()) {
                    result.depth = Some(v);
                }
                i += 2;
            }
            "seldepth" => {
                if let Some(v) = tokens.get(i + 1).and_then(|t| t.parse().ok()) {
                    result.seldepth = Some(v);
                }
                i += 2;
            }
            "nodes" => {
                if let Some(v) = tokens.get(i + 1).and_then(|t| t.parse().ok()) {
                    result.nodes = Some(v);
                }
                i += 2;
            }
            "nps" => {
                if let Some(v) = tokens.get(i + 1).and_then(|t| t.parse().ok()) {
                    result.nps = Some(v);
                }
                i += 2;
            }
            "score" => {
                match (tokens.get(i + 1), tokens.get(i + 2)) {
                    (Some(&"cp"), Some(v)) => {
                        if let Ok(cp) = v.parse() {
                            result.score = Some(Score::Cp(cp));
                        }
                    }
                    (Some(&"mate"), Some(v)) => {
                        if let Ok(n) = v.parse() {
                            result.score = Some(Score::Mate(n));
                        }
                    }
                    _ => {}
                }
                i += 3;
            }
            "pv" => {
                // pv runs to the end of the line; only its head matters here
                if let Some(m) = tokens.get(i + 1) {
                    result.pv_move = Some((*m).to_string());
                }
                break;
            }
            // freeform text, nothing structured past this point
            "string" => break,
            _ => i += 1,
        }
    }
}
