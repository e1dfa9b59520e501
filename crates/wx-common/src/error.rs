//! Error types for the wxmaps pipeline.

use thiserror::Error;

use crate::units::Unit;

/// Result type alias using WxError.
pub type WxResult<T> = Result<T, WxError>;

/// Primary error type for map production.
#[derive(Debug, Error)]
pub enum WxError {
    // === Acquisition Errors ===
    #[error("Data not available: {0}")]
    DataUnavailable(String),

    #[error("Variable not found in dataset: {0}")]
    MissingVariable(String),

    #[error("Failed to read data: {0}")]
    DataReadError(String),

    // === Static Resources ===
    #[error("Required resource unavailable: {path}: {message}")]
    ResourceUnavailable { path: String, message: String },

    // === Processing Errors ===
    #[error("Cannot convert {from} to {to}")]
    IncompatibleUnits { from: Unit, to: Unit },

    #[error("Grid shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Projection error: {0}")]
    ProjectionError(String),

    // === Rendering / Output ===
    #[error("Rendering failed: {0}")]
    RenderError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl WxError {
    /// Process exit code reported by the CLI for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            WxError::DataUnavailable(_)
            | WxError::MissingVariable(_)
            | WxError::DataReadError(_) => 2,
            WxError::ResourceUnavailable { .. } => 3,
            WxError::InvalidConfig(_) => 4,
            _ => 1,
        }
    }
}

impl From<std::io::Error> for WxError {
    fn from(err: std::io::Error) -> Self {
        WxError::Io(err.to_string())
    }
}
