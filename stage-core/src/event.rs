//! Input events for canvas interaction.
//!
//! The host translates raw pointer input into these events; the
//! [`Editor`](crate::Editor) feeds them through the interaction state machine.

use serde::{Deserialize, Serialize};

use crate::ObjectId;

/// What a pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", content = "id", rename_all = "snake_case")]
pub enum PointerTarget {
    /// Empty canvas.
    Background,
    /// The body of an object.
    Object(ObjectId),
    /// The delete control drawn on an object.
    DeleteAffordance(ObjectId),
}

/// In-progress resize/rotate state of the manipulation handles.
///
/// Scale factors are relative to the object's stored scale; the identity
/// value means "nothing applied yet".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveTransform {
    /// Horizontal factor relative to the stored scale.
    pub scale_x: f32,
    /// Vertical factor relative to the stored scale.
    pub scale_y: f32,
    /// Absolute rotation in degrees while the handle is held.
    pub angle: Option<f32>,
    /// Absolute top-left position while the handle is held (resizing from a
    /// top or left handle moves the origin).
    pub left: Option<f32>,
    /// See [`LiveTransform::left`].
    pub top: Option<f32>,
}

impl LiveTransform {
    /// No change relative to the stored geometry.
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
        angle: None,
        left: None,
        top: None,
    };

    /// Pure scaling.
    #[must_use]
    pub fn scaled(scale_x: f32, scale_y: f32) -> Self {
        Self {
            scale_x,
            scale_y,
            ..Self::IDENTITY
        }
    }

    /// Pure rotation to `angle` degrees.
    #[must_use]
    pub fn rotated(angle: f32) -> Self {
        Self {
            angle: Some(angle),
            ..Self::IDENTITY
        }
    }

    /// Whether applying this would leave the geometry as stored.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_identity(&self) -> bool {
        self.scale_x == 1.0
            && self.scale_y == 1.0
            && self.angle.is_none()
            && self.left.is_none()
            && self.top.is_none()
    }
}

impl Default for LiveTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// All interaction events the canvas can receive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanvasEvent {
    /// Click or tap.
    Click {
        /// Hit-test result for the click position.
        target: PointerTarget,
    },

    /// An object started being dragged.
    DragStart {
        /// Dragged object.
        id: ObjectId,
    },

    /// The dragged object moved; `x`/`y` is its proposed top-left.
    DragMove {
        /// Dragged object.
        id: ObjectId,
        /// Proposed left edge.
        x: f32,
        /// Proposed top edge.
        y: f32,
    },

    /// The drag finished at the given top-left position.
    DragEnd {
        /// Dragged object.
        id: ObjectId,
        /// Final left edge.
        x: f32,
        /// Final top edge.
        y: f32,
    },

    /// The pointer entered an object.
    HoverEnter {
        /// Hovered object.
        id: ObjectId,
    },

    /// The pointer left an object.
    HoverLeave {
        /// Object the pointer left.
        id: ObjectId,
    },

    /// A resize or rotation handle was grabbed.
    TransformStart {
        /// Manipulated object.
        id: ObjectId,
    },

    /// A handle moved.
    TransformMove {
        /// Manipulated object.
        id: ObjectId,
        /// Current handle state.
        live: LiveTransform,
    },

    /// A handle was released.
    TransformEnd {
        /// Manipulated object.
        id: ObjectId,
        /// Final handle state.
        live: LiveTransform,
    },
}

impl CanvasEvent {
    /// The object this event refers to, if any.
    #[must_use]
    pub fn object_id(&self) -> Option<ObjectId> {
        match *self {
            Self::Click { target } => match target {
                PointerTarget::Background => None,
                PointerTarget::Object(id) | PointerTarget::DeleteAffordance(id) => Some(id),
            },
            Self::DragStart { id }
            | Self::DragMove { id, .. }
            | Self::DragEnd { id, .. }
            | Self::HoverEnter { id }
            | Self::HoverLeave { id }
            | Self::TransformStart { id }
            | Self::TransformMove { id, .. }
            | Self::TransformEnd { id, .. } => Some(id),
        }
    }
}
