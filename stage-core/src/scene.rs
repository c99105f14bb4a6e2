//! Scene model: ordered canvas objects plus the background.

use serde::{Deserialize, Serialize};

use crate::{CanvasError, CanvasObject, CanvasResult, Color, ObjectId, Point};

/// Default canvas width in pixels.
pub const DEFAULT_CANVAS_WIDTH: f32 = 1920.0;

/// Default canvas height in pixels.
pub const DEFAULT_CANVAS_HEIGHT: f32 = 1080.0;

/// Canvas background fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Background {
    /// A single flat color.
    Solid {
        /// Fill color.
        color: Color,
    },

    /// A two-stop linear gradient across the whole canvas.
    LinearGradient {
        /// Color at the start of the gradient line.
        from: Color,
        /// Color at the end of the gradient line.
        to: Color,
        /// Direction in degrees clockwise from left-to-right.
        angle: f32,
    },
}

impl Background {
    /// A solid background.
    #[must_use]
    pub const fn solid(color: Color) -> Self {
        Self::Solid { color }
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::solid(Color::WHITE)
    }
}

/// A scene containing all canvas objects.
///
/// Paint order is insertion order: later objects render on top.
#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    objects: Vec<CanvasObject>,
    background: Background,
    width: f32,
    height: f32,
}

impl Scene {
    /// Create a new empty scene with the given canvas size.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            objects: Vec::new(),
            background: Background::default(),
            width,
            height,
        }
    }

    /// Canvas width in pixels.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Canvas height in pixels.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Center of the canvas, where the two snap guides cross.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Current background.
    #[must_use]
    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Replace the background.
    pub fn set_background(&mut self, background: Background) {
        tracing::debug!("Background set to {background:?}");
        self.background = background;
    }

    /// Append an object on top of the paint order.
    ///
    /// # Errors
    ///
    /// Returns an error if an object with the same id already exists.
    pub fn add_object(&mut self, object: CanvasObject) -> CanvasResult<ObjectId> {
        let id = object.id;
        if self.contains(id) {
            return Err(CanvasError::InvalidOperation(format!(
                "Duplicate object id: {id}"
            )));
        }
        tracing::debug!(
            "Added {} object {id} at ({}, {})",
            object.kind_name(),
            object.x,
            object.y
        );
        self.objects.push(object);
        Ok(id)
    }

    /// Remove an object, returning it if it was present.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<CanvasObject> {
        let index = self.objects.iter().position(|o| o.id == id)?;
        Some(self.objects.remove(index))
    }

    /// Get an object by ID.
    #[must_use]
    pub fn get_object(&self, id: ObjectId) -> Option<&CanvasObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Geometry writes go through [`crate::transform::apply_delta`].
    pub(crate) fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut CanvasObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Whether an object with this id is present.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.iter().any(|o| o.id == id)
    }

    /// All objects in paint order.
    #[must_use]
    pub fn objects(&self) -> &[CanvasObject] {
        &self.objects
    }

    /// Get the number of objects in the scene.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the scene is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Find the topmost object under the given canvas coordinates.
    #[must_use]
    pub fn object_at(&self, x: f32, y: f32) -> Option<ObjectId> {
        self.objects
            .iter()
            .rev()
            .find(|o| o.contains_point(x, y))
            .map(|o| o.id)
    }

    /// Shrink `(width, height)` to fit inside the canvas, preserving aspect
    /// ratio. Sizes that already fit are returned unchanged.
    #[must_use]
    pub fn fit_to_canvas(&self, width: f32, height: f32) -> (f32, f32) {
        if width <= self.width && height <= self.height {
            return (width, height);
        }
        let factor = (self.width / width).min(self.height / height);
        (width * factor, height * factor)
    }

    /// Top-left position that centers a box of the given size.
    #[must_use]
    pub fn centered_origin(&self, width: f32, height: f32) -> Point {
        Point::new((self.width - width) / 2.0, (self.height - height) / 2.0)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}
