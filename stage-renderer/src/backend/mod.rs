//! Surfaces that present draw lists.

pub mod recording;
pub mod trace;

use stage_core::DrawList;

use crate::RenderResult;

/// Available surface implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Logs every node at trace level.
    Trace,
    /// Keeps presented frames in memory.
    Recording,
}

/// Something a frame can be presented on.
pub trait RenderSurface: Send {
    /// Get the surface kind.
    fn kind(&self) -> SurfaceKind;

    /// Present a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot draw the frame.
    fn present(&mut self, frame: &DrawList) -> RenderResult<()>;

    /// Resize the surface.
    ///
    /// # Errors
    ///
    /// Returns an error if resizing fails.
    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()>;
}
