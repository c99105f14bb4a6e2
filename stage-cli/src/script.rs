//! JSON scripts of editor operations.
//!
//! A script is an array of operations applied in order:
//!
//! ```json
//! [
//!   {"op": "background", "color": "#fde68a"},
//!   {"op": "image", "src": "photo.png"},
//!   {"op": "text", "content": "Hello", "fontSize": 64, "color": "#1f2937"},
//!   {"op": "transform", "index": 1, "delta": {"angle": 15}},
//!   {"op": "delete", "index": 0}
//! ]
//! ```
//!
//! `index` addresses objects in paint order at the time the operation runs.

use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;
use stage_core::{Background, Color, ObjectId, TextOptions, TransformDelta};
use stage_renderer::EditorSession;

/// One scripted editor operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptOp {
    /// Load an image and add it centered.
    Image {
        /// Data URI, `file://` URL or path (relative to the script).
        src: String,
        /// Start the load and keep going; the export waits for it.
        #[serde(default)]
        defer: bool,
    },
    /// Add a text object.
    Text {
        /// Text content.
        content: String,
        /// Style and placement.
        #[serde(flatten)]
        options: TextOptions,
    },
    /// Apply a partial transform to an existing object.
    Transform {
        /// Paint-order index.
        index: usize,
        /// Fields to change.
        delta: TransformDelta,
    },
    /// Delete an existing object.
    Delete {
        /// Paint-order index.
        index: usize,
    },
    /// Replace the background; `to` makes it a linear gradient.
    Background {
        /// Solid color, or gradient start.
        color: String,
        /// Gradient end.
        #[serde(default)]
        to: Option<String>,
        /// Gradient direction in degrees.
        #[serde(default)]
        angle: f32,
    },
}

/// Parse a script document.
///
/// # Errors
///
/// Returns an error if the document is not an array of operations.
pub fn parse_script(json: &str) -> anyhow::Result<Vec<ScriptOp>> {
    serde_json::from_str(json).context("Invalid script")
}

/// Apply `ops` to `session`, resolving relative image paths against `base`.
///
/// # Errors
///
/// Returns an error naming the failing operation if a load, validation or
/// index lookup fails.
pub async fn apply_script(
    session: &mut EditorSession,
    ops: &[ScriptOp],
    base: &Path,
) -> anyhow::Result<()> {
    for (step, op) in ops.iter().enumerate() {
        apply_op(session, op, base)
            .await
            .with_context(|| format!("Script operation #{step} failed"))?;
    }
    Ok(())
}

async fn apply_op(session: &mut EditorSession, op: &ScriptOp, base: &Path) -> anyhow::Result<()> {
    match op {
        ScriptOp::Image { src, defer } => {
            let src = resolve_src(src, base);
            if *defer {
                let ticket = session.start_image_load(&src);
                tracing::debug!("Deferred {ticket}");
            } else {
                session.add_image(&src).await?;
            }
        }
        ScriptOp::Text { content, options } => {
            session.add_text(content, options)?;
        }
        ScriptOp::Transform { index, delta } => {
            let id = object_at(session, *index)?;
            let outcome = session.transform_object(id, delta);
            tracing::info!("Transform of object {index}: {outcome:?}");
        }
        ScriptOp::Delete { index } => {
            let id = object_at(session, *index)?;
            session.delete_object(id);
        }
        ScriptOp::Background { color, to, angle } => {
            let from = Color::parse_hex(color)?;
            let background = match to {
                Some(to) => Background::LinearGradient {
                    from,
                    to: Color::parse_hex(to)?,
                    angle: *angle,
                },
                None => Background::solid(from),
            };
            session.set_background(background);
        }
    }
    Ok(())
}

fn object_at(session: &EditorSession, index: usize) -> anyhow::Result<ObjectId> {
    match session.objects().get(index) {
        Some(object) => Ok(object.id),
        None => bail!(
            "No object at index {index} (canvas has {})",
            session.objects().len()
        ),
    }
}

/// Make relative filesystem paths relative to the script's directory.
fn resolve_src(src: &str, base: &Path) -> String {
    if src.starts_with("data:") || src.contains("://") || Path::new(src).is_absolute() {
        return src.to_string();
    }
    base.join(src).to_string_lossy().into_owned()
}
