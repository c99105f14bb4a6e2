//! # Stage Renderer
//!
//! Asset loading, raster export and the async editing session built on
//! `stage-core`.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              EditorSession                  │
//! ├──────────────┬──────────────┬───────────────┤
//! │ AssetLoader  │ Renderer     │ SceneExporter │
//! │ fetch/decode │ draw list →  │ SVG → resvg → │
//! │ on tasks     │ surface      │ PNG / JPEG    │
//! └──────────────┴──────────────┴───────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asset;
pub mod backend;
pub mod cancel;
pub mod error;
pub mod export;
pub mod loader;
pub mod session;

pub use asset::{AssetLimits, ImageFormat};
pub use backend::recording::RecordingSurface;
pub use backend::trace::TraceSurface;
pub use backend::{RenderSurface, SurfaceKind};
pub use cancel::{CancellationSource, CancellationToken};
pub use error::{RenderError, RenderResult};
pub use export::{ExportFormat, ExportOptions, ExportedImage, SceneExporter};
pub use loader::{AssetLoader, AssetSource, FetchedAsset, LoadTicket, LocalAssetSource};
pub use session::{EditorSession, LoadReport, SessionConfig};

use stage_core::DrawList;

/// Presents frames on a surface and counts them.
pub struct Renderer {
    surface: Box<dyn RenderSurface>,
    frame_count: u64,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("surface", &self.surface.kind())
            .field("frame_count", &self.frame_count)
            .finish()
    }
}

impl Renderer {
    /// Create a renderer over `surface`.
    #[must_use]
    pub fn new(surface: Box<dyn RenderSurface>) -> Self {
        Self {
            surface,
            frame_count: 0,
        }
    }

    /// Render a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface rejects the frame.
    pub fn render(&mut self, frame: &DrawList) -> RenderResult<()> {
        self.surface.present(frame)?;
        self.frame_count += 1;
        Ok(())
    }

    /// Get the current frame count.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the active surface kind.
    #[must_use]
    pub fn surface_kind(&self) -> SurfaceKind {
        self.surface.kind()
    }

    /// Resize the rendering surface.
    ///
    /// # Errors
    ///
    /// Returns an error if resize fails.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.surface.resize(width, height)
    }
}
