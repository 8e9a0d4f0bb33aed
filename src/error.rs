//! Error types for the table renderer
//!
//! Recoverable conditions (missing font, missing background, unreadable data
//! file) never surface here: they are reported through the render observer
//! and replaced by a fallback. Everything in this enum stops a render pass.

use thiserror::Error;

use crate::renderer::RenderStage;

/// Custom error type for table rendering operations
#[derive(Error, Debug)]
pub enum RendererError {
    #[error("Font error: {0}")]
    FontError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid value for field '{0}': {1}")]
    InvalidValue(String, String),

    #[error("Stage {requested:?} cannot run from {current:?}")]
    OutOfOrder {
        requested: RenderStage,
        current: RenderStage,
    },
}

/// Result type alias for renderer operations
pub type RendererResult<T> = Result<T, RendererError>;

impl From<serde_json::Error> for RendererError {
    fn from(err: serde_json::Error) -> Self {
        RendererError::JsonError(err.to_string())
    }
}

impl From<image::ImageError> for RendererError {
    fn from(err: image::ImageError) -> Self {
        RendererError::ImageError(err.to_string())
    }
}
