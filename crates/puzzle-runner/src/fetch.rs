//! Dataset download and cache
//!
//! The Lichess puzzle database ships as a zstd-compressed CSV. The
//! decompressed file is cached under the data directory and is the only
//! state persisted across runs (besides the optional positions file).

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::RunnerError;

const PUZZLE_DB_URL: &str = "https://database.lichess.org/lichess_db_puzzle.csv.zst";
const PUZZLE_DB_CSV: &str = "lichess_db_puzzle.csv";
const PUZZLE_DB_ARCHIVE: &str = "lichess_db_puzzle.csv.zst";

/// Ensure the puzzle CSV exists under `data_dir`, downloading and unpacking
/// it on first use. Returns the CSV path.
pub async fn ensure_dataset(data_dir: &Path) -> Result<PathBuf, RunnerError> {
    let csv_path = data_dir.join(PUZZLE_DB_CSV);
    if csv_path.exists() {
        info!(path = %csv_path.display(), "Puzzle database already cached, skipping download");
        return Ok(csv_path);
    }

    std::fs::create_dir_all(data_dir)?;
    let archive_path = data_dir.join(PUZZLE_DB_ARCHIVE);

    info!(url = PUZZLE_DB_URL, "Downloading puzzle database");
    let response = reqwest::get(PUZZLE_DB_URL)
        .await
        .map_err(|e| RunnerError::Download(format!("request failed: {e}")))?;
    if !response.status().is_success() {
        return Err(RunnerError::Download(format!("HTTP {}", response.status())));
    }
    let body = response
        .bytes()
        .await
        .map_err(|e| RunnerError::Download(format!("body read failed: {e}")))?;
    std::fs::write(&archive_path, &body)?;

    info!(path = %archive_path.display(), "Decompressing puzzle database");
    let archive = archive_path.clone();
    let csv = csv_path.clone();
    tokio::task::spawn_blocking(move || -> Result<(), RunnerError> {
        let mut decoder = zstd::stream::Decoder::new(File::open(&archive)?)?;
        let mut out = File::create(&csv)?;
        io::copy(&mut decoder, &mut out)?;
        Ok(())
    })
    .await
    .map_err(|e| RunnerError::Download(format!("decompression task failed: {e}")))??;

    std::fs::remove_file(&archive_path)?;

    info!(path = %csv_path.display(), "Puzzle database ready");
    Ok(csv_path)
}
