//! Logging surface for hosts without a display.
//!
//! Every presented node is written as a `trace` event, which makes the
//! frame sequence visible with `RUST_LOG=stage_renderer=trace`.

use stage_core::{DrawList, DrawNode};

use crate::RenderResult;

use super::{RenderSurface, SurfaceKind};

/// Surface that logs frames instead of drawing them.
pub struct TraceSurface {
    width: u32,
    height: u32,
}

impl TraceSurface {
    /// Create a new trace surface.
    #[must_use]
    pub fn new() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }

    /// Log a single node.
    fn render_node(node: &DrawNode) {
        let (kind_name, details) = Self::node_description(node);
        tracing::trace!("Render {kind_name}{details}");
    }

    /// Get a description of a node for logging.
    fn node_description(node: &DrawNode) -> (&'static str, String) {
        match node {
            DrawNode::Background { background, .. } => ("background", format!(" {background:?}")),
            DrawNode::Image {
                handle,
                x,
                y,
                width,
                height,
                scale_x,
                scale_y,
                rotation,
                ..
            } => (
                "image",
                format!(
                    " #{} at ({x}, {y}) size {width}x{height} scale {scale_x}x{scale_y} rot {rotation}",
                    handle.get()
                ),
            ),
            DrawNode::Text {
                handle,
                text,
                font_size,
                fill,
                x,
                y,
                ..
            } => (
                "text",
                format!(
                    " #{} at ({x}, {y}) content='{text}' font={font_size} fill={fill}",
                    handle.get()
                ),
            ),
            DrawNode::Guide { axis, position, .. } => ("guide", format!(" {axis:?} at {position}")),
            DrawNode::Handles { id, .. } => ("handles", format!(" on {id}")),
            DrawNode::DeleteAffordance { id, center, .. } => (
                "delete control",
                format!(" on {id} at ({}, {})", center.x, center.y),
            ),
        }
    }
}

impl Default for TraceSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for TraceSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Trace
    }

    fn present(&mut self, frame: &DrawList) -> RenderResult<()> {
        tracing::trace!(
            "Trace present: {} nodes, canvas {}x{}, surface {}x{}",
            frame.nodes.len(),
            frame.width,
            frame.height,
            self.width,
            self.height
        );

        for node in &frame.nodes {
            Self::render_node(node);
        }

        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.width = width;
        self.height = height;
        tracing::debug!("Trace surface resized to {}x{}", width, height);
        Ok(())
    }
}
