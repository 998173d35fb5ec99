//! Harness configuration from environment variables

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::RunnerError;

#[derive(Clone, Debug)]
pub struct Config {
    /// Engine crate root; `cargo build` runs here
    pub engine_dir: String,

    /// Engine binary name under `target/<profile>/`. Only required for the
    /// run mode; the positions mode never touches the engine.
    pub engine_bin: Option<String>,

    /// Cargo profile the engine is built with (`--profile` overrides)
    pub profile: String,

    /// Puzzles retained from the dataset
    pub puzzle_count: usize,

    /// Wall-clock budget per analysis
    pub movetime: Duration,

    /// Engine hash table size in MiB
    pub hash_mb: u32,

    /// Dataset cache directory
    pub data_dir: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, RunnerError> {
        let engine_dir = env::var("ENGINE_DIR").unwrap_or_else(|_| ".".to_string());
        let engine_bin = env::var("ENGINE_BIN").ok();
        let profile = env::var("ENGINE_PROFILE").unwrap_or_else(|_| "full".to_string());

        let puzzle_count = env::var("PUZZLE_COUNT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);

        let movetime_ms: u64 = env::var("MOVETIME_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1_000);

        let hash_mb = env::var("HASH_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(64);

        let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());

        Ok(Self {
            engine_dir,
            engine_bin,
            profile,
            puzzle_count,
            movetime: Duration::from_millis(movetime_ms),
            hash_mb,
            data_dir,
        })
    }

    /// Path of the engine binary produced by the build step.
    pub fn engine_binary(&self) -> Result<PathBuf, RunnerError> {
        let bin = self
            .engine_bin
            .as_deref()
            .ok_or(RunnerError::Config("ENGINE_BIN not set"))?;
        Ok(Path::new(&self.engine_dir)
            .join("target")
            .join(&self.profile)
            .join(bin))
    }
}
