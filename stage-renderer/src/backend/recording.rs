//! In-memory surface for headless hosts and tests.

use std::sync::{Arc, Mutex, MutexGuard};

use stage_core::DrawList;

use crate::RenderResult;

use super::{RenderSurface, SurfaceKind};

#[derive(Debug, Default)]
struct Recorded {
    last: Option<DrawList>,
    presented: u64,
    size: (u32, u32),
}

/// Keeps the most recently presented frame.
///
/// Clones share the same record, so a caller can keep one clone while the
/// session owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingSurface {
    /// Create an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// The last presented frame.
    #[must_use]
    pub fn last_frame(&self) -> Option<DrawList> {
        self.lock().last.clone()
    }

    /// Number of frames presented so far.
    #[must_use]
    pub fn presented(&self) -> u64 {
        self.lock().presented
    }

    /// Last size passed to [`RenderSurface::resize`].
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.lock().size
    }
}

impl RenderSurface for RecordingSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Recording
    }

    fn present(&mut self, frame: &DrawList) -> RenderResult<()> {
        let mut recorded = self.lock();
        recorded.last = Some(frame.clone());
        recorded.presented += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.lock().size = (width, height);
        Ok(())
    }
}
