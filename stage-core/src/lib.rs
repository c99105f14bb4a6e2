//! # Stage Core
//!
//! Editor core for a single-page image and text composition canvas.
//! Pure and synchronous; compiles to WASM behind the `wasm` feature.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  Editor                     │
//! ├─────────────────────────────────────────────┤
//! │  Scene           │  Interaction             │
//! │  - Objects       │  - Selection / hover     │
//! │  - Background    │  - Drag guides           │
//! │  - Paint order   │  - Live handle state     │
//! ├─────────────────────────────────────────────┤
//! │  Transform       │  Render Adapter          │
//! │  - 5px floor     │  - Draw list + overlays  │
//! │  - Center snap   │  - Stable handles        │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod color;
pub mod editor;
pub mod element;
pub mod error;
pub mod event;
pub mod interaction;
pub mod render;
pub mod scene;
pub mod transform;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use color::Color;
pub use editor::{Editor, EventOutcome, TextOptions};
pub use element::{CanvasObject, ImageAsset, ObjectId, ObjectKind, Point, Rect};
pub use error::{CanvasError, CanvasResult};
pub use event::{CanvasEvent, LiveTransform, PointerTarget};
pub use interaction::{Focus, InteractionState};
pub use render::{DrawList, DrawNode, GuideAxis, OverlayStyle, RenderAdapter, RenderHandle};
pub use scene::{Background, Scene};
pub use transform::{RejectReason, TransformDelta, TransformOutcome};

/// Stage core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
