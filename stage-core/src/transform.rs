//! Transform engine: the single write path for object geometry.
//!
//! Every position, scale and rotation change goes through [`apply_delta`].
//! Resizes that would shrink an object below [`MIN_BOX_SIZE`] on either axis
//! are rejected whole, and [`snap_to_center`] provides the magnetic
//! centerline alignment used while dragging.

use serde::{Deserialize, Serialize};

use crate::element::rotate_about;
use crate::{CanvasError, CanvasObject, CanvasResult, ObjectId, Point, Scene};

/// Smallest rendered width or height (pixels) a resize may produce.
pub const MIN_BOX_SIZE: f32 = 5.0;

/// Distance (pixels) from a canvas centerline within which drags snap onto it.
pub const SNAP_THRESHOLD: f32 = 10.0;

/// A partial geometry update. Absent fields keep their current values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformDelta {
    /// New left edge.
    pub left: Option<f32>,
    /// New top edge.
    pub top: Option<f32>,
    /// New horizontal scale factor.
    pub scale_x: Option<f32>,
    /// New vertical scale factor.
    pub scale_y: Option<f32>,
    /// New rotation in degrees.
    pub angle: Option<f32>,
}

impl TransformDelta {
    /// A delta that moves the object.
    #[must_use]
    pub fn position(left: f32, top: f32) -> Self {
        Self {
            left: Some(left),
            top: Some(top),
            ..Self::default()
        }
    }

    /// A delta that rescales the object.
    #[must_use]
    pub fn scale(scale_x: f32, scale_y: f32) -> Self {
        Self {
            scale_x: Some(scale_x),
            scale_y: Some(scale_y),
            ..Self::default()
        }
    }

    /// A delta that rotates the object.
    #[must_use]
    pub fn rotation(angle: f32) -> Self {
        Self {
            angle: Some(angle),
            ..Self::default()
        }
    }

    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left.is_none()
            && self.top.is_none()
            && self.scale_x.is_none()
            && self.scale_y.is_none()
            && self.angle.is_none()
    }

    fn is_finite(&self) -> bool {
        [self.left, self.top, self.scale_x, self.scale_y, self.angle]
            .into_iter()
            .flatten()
            .all(f32::is_finite)
    }
}

/// Why a delta was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The resulting box would be under [`MIN_BOX_SIZE`] on some axis.
    BelowMinimumSize,
    /// A field was NaN or infinite.
    NonFinite,
}

/// Result of applying a delta to an existing object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum TransformOutcome {
    /// Geometry changed.
    Applied,
    /// The delta was empty or matched the current geometry.
    Unchanged,
    /// The delta was refused; geometry is untouched.
    Rejected(RejectReason),
    /// No object had the requested id; nothing happened.
    Missing,
}

impl TransformOutcome {
    /// Whether the stored geometry changed.
    #[must_use]
    pub fn changed(self) -> bool {
        self == Self::Applied
    }
}

/// Apply `delta` to the object `id`.
///
/// # Errors
///
/// Returns [`CanvasError::NotFound`] if no object has this id. Interactive
/// callers go through [`crate::Editor::transform_object`], which degrades
/// that to [`TransformOutcome::Missing`].
pub fn apply_delta(
    scene: &mut Scene,
    id: ObjectId,
    delta: &TransformDelta,
) -> CanvasResult<TransformOutcome> {
    let object = scene
        .get_object_mut(id)
        .ok_or_else(|| CanvasError::NotFound(id.to_string()))?;

    if delta.is_empty() {
        return Ok(TransformOutcome::Unchanged);
    }
    if !delta.is_finite() {
        tracing::debug!("Rejected non-finite delta for {id}: {delta:?}");
        return Ok(TransformOutcome::Rejected(RejectReason::NonFinite));
    }

    let scale_x = delta.scale_x.unwrap_or(object.scale_x);
    let scale_y = delta.scale_y.unwrap_or(object.scale_y);
    if delta.scale_x.is_some() || delta.scale_y.is_some() {
        let (width, height) = object.intrinsic_size();
        if width * scale_x < MIN_BOX_SIZE || height * scale_y < MIN_BOX_SIZE {
            tracing::debug!(
                "Rejected resize of {id}: {}x{} is below the {MIN_BOX_SIZE}px floor",
                width * scale_x,
                height * scale_y
            );
            return Ok(TransformOutcome::Rejected(RejectReason::BelowMinimumSize));
        }
    }

    let next = Geometry {
        x: delta.left.unwrap_or(object.x),
        y: delta.top.unwrap_or(object.y),
        scale_x,
        scale_y,
        rotation: delta.angle.unwrap_or(object.rotation),
    };
    if next == Geometry::of(object) {
        return Ok(TransformOutcome::Unchanged);
    }
    next.write_to(object);
    tracing::trace!("Transformed {id}: {next:?}");
    Ok(TransformOutcome::Applied)
}

/// Adjust a proposed top-left position so the object's center lands on a
/// canvas centerline when it is within [`SNAP_THRESHOLD`] of it.
///
/// Each axis snaps independently. The center is computed with the object's
/// current scale and rotation at the proposed position, and the snapped
/// center is within one float ulp of the centerline.
#[must_use]
pub fn snap_to_center(scene: &Scene, object: &CanvasObject, proposed: Point) -> Point {
    let target = scene.center();
    let center = center_at(object, proposed);
    let snap_x = (center.x - target.x).abs() <= SNAP_THRESHOLD;
    let snap_y = (center.y - target.y).abs() <= SNAP_THRESHOLD;

    let mut snapped = proposed;
    if snap_x {
        snapped.x = refine_axis(proposed.x, target.x, |x| {
            center_at(object, Point::new(x, proposed.y)).x
        });
    }
    if snap_y {
        snapped.y = refine_axis(proposed.y, target.y, |y| {
            center_at(object, Point::new(proposed.x, y)).y
        });
    }
    snapped
}

/// Rounding steps allowed when pulling a rotated center onto a centerline.
const SNAP_REFINE_STEPS: usize = 4;

/// Find the origin coordinate whose center coordinate is closest to `target`.
///
/// `center_of` maps an origin coordinate to the resulting center coordinate.
/// Rotation makes that mapping round differently from a plain offset, so the
/// first correction can leave a residual of an ulp or so.
#[allow(clippy::float_cmp)]
fn refine_axis(origin: f32, target: f32, center_of: impl Fn(f32) -> f32) -> f32 {
    let mut best = origin;
    let mut best_error = (target - center_of(origin)).abs();
    let mut current = origin;
    for _ in 0..SNAP_REFINE_STEPS {
        let residual = target - center_of(current);
        if residual == 0.0 {
            return current;
        }
        let next = current + residual;
        if next == current {
            break;
        }
        current = next;
        let error = (target - center_of(current)).abs();
        if error < best_error {
            best = current;
            best_error = error;
        }
    }
    best
}

/// Center of `object` if its top-left were at `origin`.
fn center_at(object: &CanvasObject, origin: Point) -> Point {
    let (w, h) = object.scaled_size();
    rotate_about(origin.x, origin.y, object.rotation, w / 2.0, h / 2.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Geometry {
    x: f32,
    y: f32,
    scale_x: f32,
    scale_y: f32,
    rotation: f32,
}

impl Geometry {
    fn of(object: &CanvasObject) -> Self {
        Self {
            x: object.x,
            y: object.y,
            scale_x: object.scale_x,
            scale_y: object.scale_y,
            rotation: object.rotation,
        }
    }

    fn write_to(self, object: &mut CanvasObject) {
        object.x = self.x;
        object.y = self.y;
        object.scale_x = self.scale_x;
        object.scale_y = self.scale_y;
        object.rotation = self.rotation;
    }
}
