use std::path::PathBuf;

use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{first} cannot be combined with {second}")]
    ConflictingArguments {
        first: &'static str,
        second: &'static str,
    },

    #[error("Invalid JPEG quality: {quality}. Must be between 1 and 100")]
    InvalidQuality { quality: u8 },

    #[error("Options file not found: {path:?}")]
    MissingOptions { path: PathBuf },

    #[error("No inference backend compiled in. Please build with --features onnx")]
    BackendDisabled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Stylepro(#[from] stylepro::Error),
}
