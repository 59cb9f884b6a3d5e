//! Pipeline error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the training and inference pipelines.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("input file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("model artifact not found: {0}")]
    ArtifactNotFound(PathBuf),

    #[error("model artifact corrupt: {0}")]
    ArtifactCorrupt(String),

    #[error("failed to write model artifact: {0}")]
    ArtifactWrite(String),

    #[error("shape error: expected at least {expected} feature columns, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("class imbalance estimation failed: {0}")]
    EmptyClass(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
