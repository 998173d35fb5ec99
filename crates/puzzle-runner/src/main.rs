//! Puzzle gauntlet runner
//!
//! Regression-tests a UCI engine against Lichess tactics puzzles: builds the
//! engine, feeds it rating-sorted puzzles under a fixed movetime, and stops
//! at the first position where its best move differs from the known
//! solution.

use std::io::Write;
use std::path::Path;

use tracing::info;

use puzzle_core::dataset;
use puzzle_core::puzzle::setup_position;
use puzzle_runner::config::Config;
use puzzle_runner::error::RunnerError;
use puzzle_runner::evaluate;
use puzzle_runner::fetch;
use puzzle_runner::uci::{SearchLimit, UciEngine};

const POSITIONS_FILE: &str = "puzzle_positions.txt";

struct CliArgs {
    /// `--positions <n>`: write post-setup FENs instead of running the engine
    positions: Option<usize>,
    /// `--profile <name>`: cargo profile for the engine build
    profile: Option<String>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        positions: None,
        profile: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--positions" => {
                if let Some(v) = args.get(i + 1).and_then(|v| v.parse().ok()) {
                    cli.positions = Some(v);
                    i += 1;
                }
            }
            "--profile" => {
                if let Some(v) = args.get(i + 1) {
                    cli.profile = Some(v.clone());
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    cli
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env for local runs
    let _ = dotenvy::dotenv();

    let args = parse_args();
    let mut config = Config::load()?;
    if let Some(profile) = args.profile {
        config.profile = profile;
    }

    if let Some(count) = args.positions {
        write_positions(&config, count).await?;
        return Ok(());
    }

    run(&config).await?;
    Ok(())
}

/// Default mode: build and launch the engine, evaluate the puzzle set,
/// tear the engine down on every exit path.
async fn run(config: &Config) -> Result<(), RunnerError> {
    let csv_path = fetch::ensure_dataset(Path::new(&config.data_dir)).await?;

    let puzzles = dataset::load(&csv_path, config.puzzle_count)?;
    info!(count = puzzles.len(), "Loaded puzzle set");

    build_engine(config).await?;

    let binary = config.engine_binary()?;
    let mut engine = UciEngine::start(&binary).await?;
    if let Some(name) = engine.name() {
        info!(engine = name, "Running engine");
    }

    if let Err(e) = engine.configure(&[("Hash", config.hash_mb.to_string())]).await {
        engine.shutdown().await;
        return Err(e);
    }

    let limit = SearchLimit {
        movetime: config.movetime,
    };
    info!(movetime_ms = config.movetime.as_millis() as u64, "Searching");

    let result = evaluate::run(&puzzles, &mut engine, limit).await;
    engine.shutdown().await;
    info!("Engine quit");

    let outcomes = result?;
    let solved = outcomes.iter().filter(|o| o.correct).count();
    info!(solved, attempted = outcomes.len(), "Run complete");

    Ok(())
}

/// Build the engine binary with the configured cargo profile.
async fn build_engine(config: &Config) -> Result<(), RunnerError> {
    info!(dir = %config.engine_dir, profile = %config.profile, "Building engine");

    let status = tokio::process::Command::new("cargo")
        .args(["build", "--profile", &config.profile])
        .current_dir(&config.engine_dir)
        .status()
        .await
        .map_err(|e| RunnerError::EngineStart(format!("failed to run cargo: {e}")))?;

    if !status.success() {
        return Err(RunnerError::EngineStart(format!(
            "engine build failed with {status}"
        )));
    }

    Ok(())
}

/// Auxiliary mode: write post-setup FENs, one per line, to the fixed
/// positions file. Never contacts the engine.
async fn write_positions(config: &Config, count: usize) -> Result<(), RunnerError> {
    let csv_path = fetch::ensure_dataset(Path::new(&config.data_dir)).await?;
    let puzzles = dataset::load(&csv_path, count)?;

    let path = Path::new(&config.data_dir).join(POSITIONS_FILE);
    let mut out = std::fs::File::create(&path)?;
    for puzzle in &puzzles {
        writeln!(out, "{}", setup_position(puzzle)?)?;
    }

    info!(count = puzzles.len(), path = %path.display(), "Wrote puzzle positions");
    Ok(())
}
