//! Runner error types
//!
//! Every variant is fatal to the run; nothing is retried. A wrong engine
//! answer is not an error — the evaluator reports it and the run ends
//! cleanly.

use puzzle_core::dataset::DatasetError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Engine start error: {0}")]
    EngineStart(String),

    #[error("Engine communication error: {0}")]
    EngineComm(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
