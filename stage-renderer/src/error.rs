//! Renderer error types.

use stage_core::CanvasError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while loading assets, rendering or exporting.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An image could not be fetched, validated or decoded in time.
    #[error("Failed to load asset: {0}")]
    AssetLoad(String),

    /// An export found an image load still in flight after the wait bound.
    #[error("Asset not ready: {0}")]
    AssetNotReady(String),

    /// Rasterization or encoding failed, or produced nothing.
    #[error("Export failed: {0}")]
    Export(String),

    /// A caller-supplied argument was out of range.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The render surface rejected a frame or is not bound.
    #[error("Surface error: {0}")]
    Surface(String),

    /// An editor-core operation failed.
    #[error(transparent)]
    Core(#[from] CanvasError),
}
