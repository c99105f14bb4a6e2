//! Canvas objects - the items placed on a scene.

use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::{CanvasError, CanvasResult, Color};

/// Default text size in points.
pub const DEFAULT_FONT_SIZE: f32 = 48.0;

/// Average glyph advance as a fraction of the font size.
///
/// The core has no font engine, so text extents are estimated from this.
pub const TEXT_ADVANCE_RATIO: f32 = 0.6;

/// Unique identifier for a canvas object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Create a new unique object ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse the hyphenated string form.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] if the string is not a UUID.
    pub fn parse(input: &str) -> CanvasResult<Self> {
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| CanvasError::Validation(format!("Invalid object id {input:?}: {e}")))
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate (pixels from left).
    pub x: f32,
    /// Y coordinate (pixels from top).
    pub y: f32,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

/// Decoded RGBA8 bitmap owned by an image object.
///
/// Pixel storage is reference counted, so cloning an object or projecting it
/// into a draw list never copies the bitmap.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAsset {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl ImageAsset {
    /// Wrap decoded RGBA8 pixels.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] for a zero-sized bitmap or a pixel
    /// buffer whose length is not `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> CanvasResult<Self> {
        if width == 0 || height == 0 {
            return Err(CanvasError::Validation(format!(
                "Image has no pixels: {width}x{height}"
            )));
        }
        let expected = u64::from(width) * u64::from(height) * 4;
        if pixels.len() as u64 != expected {
            return Err(CanvasError::Validation(format!(
                "Pixel buffer is {} bytes, expected {expected} for {width}x{height} RGBA",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    /// Natural width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Natural height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 pixel data, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl std::fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAsset")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

// Snapshots carry the bitmap's dimensions only.
impl Serialize for ImageAsset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("ImageAsset", 2)?;
        state.serialize_field("width", &self.width)?;
        state.serialize_field("height", &self.height)?;
        state.end()
    }
}

/// The content of a canvas object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectKind {
    /// A raster image.
    Image {
        /// Width at scale 1, fixed at creation.
        width: f32,
        /// Height at scale 1, fixed at creation.
        height: f32,
        /// Decoded bitmap.
        image: ImageAsset,
    },

    /// A single- or multi-line text label.
    Text {
        /// Text content.
        text: String,
        /// Font size in points.
        font_size: f32,
        /// Fill color.
        fill: Color,
    },
}

/// A placed object: shared geometry plus kind-specific content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanvasObject {
    /// Unique identifier, immutable for the object's lifetime.
    pub id: ObjectId,
    /// Left edge of the unrotated object (canvas pixels).
    pub x: f32,
    /// Top edge of the unrotated object (canvas pixels).
    pub y: f32,
    /// Horizontal scale factor.
    pub scale_x: f32,
    /// Vertical scale factor.
    pub scale_y: f32,
    /// Clockwise rotation in degrees about the top-left corner.
    pub rotation: f32,
    /// Content.
    #[serde(flatten)]
    pub kind: ObjectKind,
}

impl CanvasObject {
    /// Create an image object at `(x, y)` with the given intrinsic size.
    #[must_use]
    pub fn image(image: ImageAsset, width: f32, height: f32, x: f32, y: f32) -> Self {
        Self::with_kind(
            ObjectKind::Image {
                width,
                height,
                image,
            },
            x,
            y,
        )
    }

    /// Create a text object at `(x, y)`.
    #[must_use]
    pub fn text(text: impl Into<String>, font_size: f32, fill: Color, x: f32, y: f32) -> Self {
        Self::with_kind(
            ObjectKind::Text {
                text: text.into(),
                font_size,
                fill,
            },
            x,
            y,
        )
    }

    fn with_kind(kind: ObjectKind, x: f32, y: f32) -> Self {
        Self {
            id: ObjectId::new(),
            x,
            y,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            kind,
        }
    }

    /// Whether this is an image object.
    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(self.kind, ObjectKind::Image { .. })
    }

    /// Whether this is a text object.
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, ObjectKind::Text { .. })
    }

    /// Short kind label for logging.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Image { .. } => "image",
            ObjectKind::Text { .. } => "text",
        }
    }

    /// Size at scale 1.
    #[must_use]
    pub fn intrinsic_size(&self) -> (f32, f32) {
        match &self.kind {
            ObjectKind::Image { width, height, .. } => (*width, *height),
            ObjectKind::Text {
                text, font_size, ..
            } => estimate_text_size(text, *font_size),
        }
    }

    /// Size after applying the stored scale factors.
    #[must_use]
    pub fn scaled_size(&self) -> (f32, f32) {
        let (w, h) = self.intrinsic_size();
        (w * self.scale_x, h * self.scale_y)
    }

    /// Map a point in the object's unrotated local frame to canvas space.
    #[must_use]
    pub fn local_to_canvas(&self, local_x: f32, local_y: f32) -> Point {
        rotate_about(self.x, self.y, self.rotation, local_x, local_y)
    }

    /// Corners of the transformed box: top-left, top-right, bottom-right,
    /// bottom-left.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        let (w, h) = self.scaled_size();
        [
            self.local_to_canvas(0.0, 0.0),
            self.local_to_canvas(w, 0.0),
            self.local_to_canvas(w, h),
            self.local_to_canvas(0.0, h),
        ]
    }

    /// Center of the transformed box.
    #[must_use]
    pub fn center(&self) -> Point {
        let (w, h) = self.scaled_size();
        self.local_to_canvas(w / 2.0, h / 2.0)
    }

    /// Axis-aligned bounds of the transformed box.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        let corners = self.corners();
        let min_x = corners.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        Rect {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    /// Check if a point (in canvas coordinates) is within the rotated box.
    #[must_use]
    pub fn contains_point(&self, px: f32, py: f32) -> bool {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let dx = px - self.x;
        let dy = py - self.y;
        let local_x = dx.mul_add(cos, dy * sin);
        let local_y = (-dx).mul_add(sin, dy * cos);

        let (w, h) = self.scaled_size();
        let within = |v: f32, extent: f32| v >= extent.min(0.0) && v <= extent.max(0.0);
        within(local_x, w) && within(local_y, h)
    }
}

/// Rotate the local offset `(lx, ly)` clockwise by `degrees` and translate it
/// to `(origin_x, origin_y)`.
#[must_use]
pub fn rotate_about(origin_x: f32, origin_y: f32, degrees: f32, lx: f32, ly: f32) -> Point {
    if degrees == 0.0 {
        return Point::new(origin_x + lx, origin_y + ly);
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    Point::new(
        origin_x + lx.mul_add(cos, -(ly * sin)),
        origin_y + lx.mul_add(sin, ly * cos),
    )
}

/// Estimated `(width, height)` of a text block at scale 1.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn estimate_text_size(text: &str, font_size: f32) -> (f32, f32) {
    let lines = text.lines().count().max(1);
    let longest = text
        .lines()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    (
        longest as f32 * font_size * TEXT_ADVANCE_RATIO,
        lines as f32 * font_size,
    )
}
