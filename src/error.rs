//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Model fetch failures, stylization stage failures and input problems each get a
//! dedicated variant; I/O, JSON and image-codec errors convert automatically.
use thiserror::Error;

use crate::types::{ModelName, Stage};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to load model {model}: {reason}")]
    ModelLoad { model: ModelName, reason: String },

    #[error("Stylization failed during {stage}: {message}")]
    Stylization { stage: Stage, message: String },

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Requested texture size [{width}x{height}] exceeds the maximum [{max}x{max}]")]
    TextureSize { width: u32, height: u32, max: u32 },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Export error: {0}")]
    Export(String),
}

impl Error {
    pub fn stylization<E: std::fmt::Display>(stage: Stage, e: E) -> Self {
        Error::Stylization {
            stage,
            message: e.to_string(),
        }
    }

    pub fn model_load<E: std::fmt::Display>(model: ModelName, e: E) -> Self {
        Error::ModelLoad {
            model,
            reason: e.to_string(),
        }
    }

    /// True for the malformed/missing input family (`Input` and `TextureSize`).
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::Input(_) | Error::TextureSize { .. })
    }
}
