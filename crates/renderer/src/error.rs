use std::path::PathBuf;

use thiserror::Error;
use wx_common::WxError;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid canvas size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("Map extent cannot be projected: {0}")]
    Projection(String),

    #[error("Unknown color: {0}")]
    UnknownColor(String),

    #[error("Unknown colormap: {0}")]
    UnknownColormap(String),

    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<RenderError> for WxError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Projection(msg) => WxError::ProjectionError(msg),
            RenderError::Io { path, source } => {
                WxError::Io(format!("{}: {}", path.display(), source))
            }
            other => WxError::RenderError(other.to_string()),
        }
    }
}
