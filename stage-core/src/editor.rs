//! The editor: scene, interaction state and render adapter behind one API.
//!
//! Hosts call these operations directly (add, transform, delete, select) or
//! feed pointer-level [`CanvasEvent`]s through [`Editor::handle_event`].
//! Geometry operations never return errors: stale ids degrade to logged
//! no-ops so that a gesture racing a deletion cannot break the session.

use serde::{Deserialize, Serialize};

use crate::element::DEFAULT_FONT_SIZE;
use crate::render::{delete_affordance_center, preview, OverlayStyle, RenderAdapter};
use crate::transform::{apply_delta, snap_to_center, MIN_BOX_SIZE};
use crate::{
    Background, CanvasError, CanvasEvent, CanvasObject, CanvasResult, Color, DrawList,
    ImageAsset, InteractionState, LiveTransform, ObjectId, Point, PointerTarget, Scene,
    TransformDelta, TransformOutcome,
};

/// Style and placement for a new text object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextOptions {
    /// Font size in points.
    #[serde(alias = "font_size")]
    pub font_size: f32,
    /// Fill as a `#rgb` / `#rrggbb` hex string.
    pub color: String,
    /// Left edge; centered horizontally when absent.
    pub x: Option<f32>,
    /// Top edge; centered vertically when absent.
    pub y: Option<f32>,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            color: Color::BLACK.to_hex(),
            x: None,
            y: None,
        }
    }
}

impl TextOptions {
    /// Options placing the text's top-left at `(x, y)`.
    #[must_use]
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }
}

/// What handling an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    /// The event referred to a missing object or changed nothing.
    Ignored,
    /// Only selection, hover, guide or handle state changed.
    Interaction,
    /// A geometry write was attempted.
    Transformed {
        /// Result of the write.
        result: TransformOutcome,
    },
    /// An object was deleted through its delete control.
    Deleted {
        /// Deleted object.
        id: ObjectId,
    },
}

/// Scene + interaction state + render adapter.
#[derive(Debug, Default)]
pub struct Editor {
    scene: Scene,
    interaction: InteractionState,
    adapter: RenderAdapter,
}

impl Editor {
    /// Create an editor with an empty canvas of the given size.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_scene(Scene::new(width, height))
    }

    /// Create an editor around an existing scene.
    #[must_use]
    pub fn with_scene(scene: Scene) -> Self {
        Self {
            scene,
            interaction: InteractionState::new(),
            adapter: RenderAdapter::default(),
        }
    }

    /// Replace the overlay style.
    #[must_use]
    pub fn with_overlay_style(mut self, style: OverlayStyle) -> Self {
        self.adapter = RenderAdapter::new(style);
        self
    }

    /// The scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Interaction state.
    #[must_use]
    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    /// The render adapter (for handle lookups).
    #[must_use]
    pub fn adapter(&self) -> &RenderAdapter {
        &self.adapter
    }

    /// All objects in paint order.
    #[must_use]
    pub fn objects(&self) -> &[CanvasObject] {
        self.scene.objects()
    }

    /// Get an object by ID.
    #[must_use]
    pub fn get_object(&self, id: ObjectId) -> Option<&CanvasObject> {
        self.scene.get_object(id)
    }

    /// The selected object, if any.
    #[must_use]
    pub fn selected_object(&self) -> Option<&CanvasObject> {
        self.interaction
            .selected_id()
            .and_then(|id| self.scene.get_object(id))
    }

    /// Add a text object. Does not change the selection.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] for blank content, a malformed
    /// color, or a non-positive / non-finite font size or position.
    pub fn add_text(&mut self, content: &str, options: &TextOptions) -> CanvasResult<ObjectId> {
        if content.trim().is_empty() {
            return Err(CanvasError::Validation("Text content is empty".to_string()));
        }
        if !(options.font_size.is_finite() && options.font_size > 0.0) {
            return Err(CanvasError::Validation(format!(
                "Font size must be positive, got {}",
                options.font_size
            )));
        }
        if [options.x, options.y]
            .into_iter()
            .flatten()
            .any(|v| !v.is_finite())
        {
            return Err(CanvasError::Validation(
                "Text position must be finite".to_string(),
            ));
        }
        let fill = Color::parse_hex(&options.color)?;

        let mut object = CanvasObject::text(content, options.font_size, fill, 0.0, 0.0);
        let (w, h) = object.intrinsic_size();
        let centered = self.scene.centered_origin(w, h);
        object.x = options.x.unwrap_or(centered.x);
        object.y = options.y.unwrap_or(centered.y);
        self.scene.add_object(object)
    }

    /// Add a decoded image, centered and capped to the canvas.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] if capping would shrink the image
    /// below [`MIN_BOX_SIZE`] on either axis, and an error if the generated
    /// id collides.
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    pub fn insert_image(&mut self, image: ImageAsset) -> CanvasResult<ObjectId> {
        let natural = (image.width() as f32, image.height() as f32);
        let (width, height) = self.scene.fit_to_canvas(natural.0, natural.1);
        if (width, height) != natural && (width < MIN_BOX_SIZE || height < MIN_BOX_SIZE) {
            return Err(CanvasError::Validation(format!(
                "Image {}x{} fitted to the canvas is {width}x{height}, below the {MIN_BOX_SIZE}px floor",
                image.width(),
                image.height()
            )));
        }
        let origin = self.scene.centered_origin(width, height);
        let object = CanvasObject::image(image, width, height, origin.x, origin.y);
        self.scene.add_object(object)
    }

    /// Apply a partial geometry update. Unknown ids are a logged no-op.
    pub fn transform_object(&mut self, id: ObjectId, delta: &TransformDelta) -> TransformOutcome {
        match apply_delta(&mut self.scene, id, delta) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Ignoring transform of {id}: {e}");
                TransformOutcome::Missing
            }
        }
    }

    /// Delete an object. Returns whether anything was removed.
    pub fn delete_object(&mut self, id: ObjectId) -> bool {
        match self.scene.remove_object(id) {
            Some(object) => {
                self.interaction.forget(id);
                tracing::debug!("Deleted {} object {id}", object.kind_name());
                true
            }
            None => {
                tracing::debug!("Delete of unknown object {id} ignored");
                false
            }
        }
    }

    /// Select an object. Returns whether it exists.
    ///
    /// The click goes through the transform path with an empty delta, the
    /// same route a drag takes, before the selection changes.
    pub fn select_object(&mut self, id: ObjectId) -> bool {
        if self.transform_object(id, &TransformDelta::default()) == TransformOutcome::Missing {
            return false;
        }
        self.interaction.select(id);
        true
    }

    /// Deselect everything.
    pub fn clear_selection(&mut self) {
        self.interaction.clear();
    }

    /// Replace the canvas background.
    pub fn set_background(&mut self, background: Background) {
        self.scene.set_background(background);
    }

    /// Resolve a pointer position to what it would hit.
    ///
    /// Visible delete controls are tested before object bodies, topmost
    /// first. Geometry is taken as drawn, with any held handle state applied.
    #[must_use]
    pub fn target_at(&self, x: f32, y: f32) -> PointerTarget {
        let radius = self.adapter.style().delete_radius;
        let shown: Vec<CanvasObject> = self
            .scene
            .objects()
            .iter()
            .map(|o| preview(o, &self.interaction.live_transform(o.id)))
            .collect();

        let hit_control = shown
            .iter()
            .rev()
            .filter(|o| self.interaction.shows_delete_affordance(o))
            .find(|o| {
                let c = delete_affordance_center(o);
                (c.x - x).hypot(c.y - y) <= radius
            });
        if let Some(object) = hit_control {
            return PointerTarget::DeleteAffordance(object.id);
        }

        shown
            .iter()
            .rev()
            .find(|o| o.contains_point(x, y))
            .map_or(PointerTarget::Background, |o| PointerTarget::Object(o.id))
    }

    /// Run one event through the interaction state machine.
    pub fn handle_event(&mut self, event: CanvasEvent) -> EventOutcome {
        if let Some(id) = event.object_id() {
            if !self.scene.contains(id) {
                tracing::debug!("Event {event:?} refers to a missing object");
                return EventOutcome::Ignored;
            }
        }

        match event {
            CanvasEvent::Click { target } => match target {
                PointerTarget::Background => {
                    self.clear_selection();
                    EventOutcome::Interaction
                }
                PointerTarget::Object(id) => {
                    self.select_object(id);
                    EventOutcome::Interaction
                }
                PointerTarget::DeleteAffordance(id) => {
                    self.delete_object(id);
                    EventOutcome::Deleted { id }
                }
            },

            CanvasEvent::DragStart { id } => {
                self.interaction.begin_drag(id);
                EventOutcome::Interaction
            }

            CanvasEvent::DragMove { id, x, y } => {
                if self.interaction.dragging_id() != Some(id) {
                    self.interaction.begin_drag(id);
                }
                let result = self.move_snapped(id, Point::new(x, y));
                EventOutcome::Transformed { result }
            }

            CanvasEvent::DragEnd { id, x, y } => {
                let result = self.move_snapped(id, Point::new(x, y));
                self.interaction.end_drag(id);
                EventOutcome::Transformed { result }
            }

            CanvasEvent::HoverEnter { id } => {
                let is_image = self.scene.get_object(id).is_some_and(CanvasObject::is_image);
                if !is_image {
                    return EventOutcome::Ignored;
                }
                self.interaction.hover_enter(id);
                EventOutcome::Interaction
            }

            CanvasEvent::HoverLeave { id } => {
                if !self.interaction.is_hovered(id) {
                    return EventOutcome::Ignored;
                }
                self.interaction.hover_leave(id);
                EventOutcome::Interaction
            }

            CanvasEvent::TransformStart { id } => {
                self.interaction.begin_transform(id);
                EventOutcome::Interaction
            }

            CanvasEvent::TransformMove { id, live } => {
                self.interaction.update_transform(id, live);
                EventOutcome::Interaction
            }

            CanvasEvent::TransformEnd { id, live } => {
                let result = match self.scene.get_object(id).map(|o| bake(o, &live)) {
                    Some(delta) => self.transform_object(id, &delta),
                    None => TransformOutcome::Missing,
                };
                self.interaction.end_transform(id);
                EventOutcome::Transformed { result }
            }
        }
    }

    /// Full frame including interaction overlays.
    pub fn draw(&mut self) -> DrawList {
        self.adapter.project(&self.scene, &self.interaction)
    }

    /// Background and objects only.
    pub fn draw_content(&mut self) -> DrawList {
        self.adapter.project_content(&self.scene)
    }

    fn move_snapped(&mut self, id: ObjectId, proposed: Point) -> TransformOutcome {
        let Some(object) = self.scene.get_object(id) else {
            return TransformOutcome::Missing;
        };
        let snapped = snap_to_center(&self.scene, object, proposed);
        self.transform_object(id, &TransformDelta::position(snapped.x, snapped.y))
    }
}

/// Turn released handle state into an absolute delta.
///
/// Scale is multiplied into the stored value rather than kept live, so the
/// next frame draws it exactly once.
#[allow(clippy::float_cmp)]
fn bake(object: &CanvasObject, live: &LiveTransform) -> TransformDelta {
    let rescaled = live.scale_x != 1.0 || live.scale_y != 1.0;
    TransformDelta {
        left: live.left,
        top: live.top,
        scale_x: rescaled.then(|| object.scale_x * live.scale_x),
        scale_y: rescaled.then(|| object.scale_y * live.scale_y),
        angle: live.angle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::RejectReason;

    fn editor_with_image(width: u32, height: u32) -> (Editor, ObjectId) {
        let mut editor = Editor::new(1920.0, 1080.0);
        let asset = ImageAsset::from_rgba(width, height, vec![0; (width * height * 4) as usize])
            .expect("asset");
        let id = editor.insert_image(asset).expect("insert");
        (editor, id)
    }

    #[test]
    fn test_add_text_at_position_does_not_select() {
        let mut editor = Editor::default();
        let id = editor
            .add_text("Hello", &TextOptions::at(960.0, 540.0))
            .expect("add");
        assert_eq!(editor.objects().len(), 1);
        let obj = editor.get_object(id).expect("object");
        assert_eq!((obj.x, obj.y), (960.0, 540.0));
        assert!(editor.selected_object().is_none());
    }

    #[test]
    fn test_add_text_validation() {
        let mut editor = Editor::default();
        assert!(matches!(
            editor.add_text("   ", &TextOptions::default()),
            Err(CanvasError::Validation(_))
        ));

        let bad_color = TextOptions {
            color: "blue".to_string(),
            ..TextOptions::default()
        };
        assert!(matches!(
            editor.add_text("Hi", &bad_color),
            Err(CanvasError::Validation(_))
        ));

        let bad_size = TextOptions {
            font_size: 0.0,
            ..TextOptions::default()
        };
        assert!(editor.add_text("Hi", &bad_size).is_err());
        assert!(editor.objects().is_empty());
    }

    #[test]
    fn test_add_text_defaults_to_centered() {
        let mut editor = Editor::new(1000.0, 500.0);
        let id = editor.add_text("Hi", &TextOptions::default()).expect("add");
        let center = editor.get_object(id).expect("object").center();
        assert!((center.x - 500.0).abs() < 1e-3);
        assert!((center.y - 250.0).abs() < 1e-3);
    }

    #[test]
    fn test_insert_image_is_centered() {
        let (editor, id) = editor_with_image(100, 50);
        let obj = editor.get_object(id).expect("object");
        assert_eq!((obj.x, obj.y), (910.0, 515.0));
        assert_eq!(obj.intrinsic_size(), (100.0, 50.0));
    }

    #[test]
    fn test_oversized_image_is_capped() {
        let mut editor = Editor::new(100.0, 100.0);
        let asset = ImageAsset::from_rgba(400, 200, vec![0; 400 * 200 * 4]).expect("asset");
        let id = editor.insert_image(asset).expect("insert");
        let obj = editor.get_object(id).expect("object");
        assert_eq!(obj.intrinsic_size(), (100.0, 50.0));
        assert_eq!((obj.x, obj.y), (0.0, 25.0));
        assert_eq!((obj.scale_x, obj.scale_y), (1.0, 1.0));
    }

    #[test]
    fn test_sliver_image_not_capped_below_floor() {
        let mut editor = Editor::new(100.0, 100.0);
        let asset = ImageAsset::from_rgba(1000, 4, vec![0; 1000 * 4 * 4]).expect("asset");
        assert!(matches!(
            editor.insert_image(asset),
            Err(CanvasError::Validation(_))
        ));
        assert!(editor.objects().is_empty());

        // Natural size is kept even when it is small.
        let asset = ImageAsset::from_rgba(2, 2, vec![0; 16]).expect("asset");
        assert!(editor.insert_image(asset).is_ok());
    }

    #[test]
    fn test_tiny_scale_rejected_without_error() {
        let (mut editor, id) = editor_with_image(100, 100);
        let before = editor.get_object(id).cloned();
        let outcome = editor.transform_object(id, &TransformDelta::scale(0.001, 0.001));
        assert_eq!(
            outcome,
            TransformOutcome::Rejected(RejectReason::BelowMinimumSize)
        );
        assert_eq!(editor.get_object(id).cloned(), before);
    }

    #[test]
    fn test_transform_unknown_id_is_noop() {
        let (mut editor, _) = editor_with_image(10, 10);
        let before: Vec<_> = editor.objects().to_vec();
        let outcome = editor.transform_object(ObjectId::new(), &TransformDelta::position(1.0, 1.0));
        assert_eq!(outcome, TransformOutcome::Missing);
        assert_eq!(editor.objects(), before.as_slice());
    }

    #[test]
    fn test_delete_selected_clears_selection() {
        let (mut editor, id) = editor_with_image(10, 10);
        assert!(editor.select_object(id));
        assert!(editor.delete_object(id));
        assert!(editor.selected_object().is_none());
        assert!(!editor.delete_object(id));
    }

    #[test]
    fn test_select_unknown_id_keeps_selection() {
        let (mut editor, id) = editor_with_image(10, 10);
        editor.select_object(id);
        assert!(!editor.select_object(ObjectId::new()));
        assert_eq!(editor.selected_object().map(|o| o.id), Some(id));
    }

    #[test]
    fn test_click_background_clears_selection() {
        let (mut editor, id) = editor_with_image(10, 10);
        editor.handle_event(CanvasEvent::Click {
            target: PointerTarget::Object(id),
        });
        assert_eq!(editor.selected_object().map(|o| o.id), Some(id));

        editor.handle_event(CanvasEvent::Click {
            target: PointerTarget::Background,
        });
        assert!(editor.selected_object().is_none());
    }

    #[test]
    fn test_click_delete_affordance_deletes_without_selecting() {
        let (mut editor, a) = editor_with_image(10, 10);
        let b = editor
            .add_text("B", &TextOptions::at(0.0, 0.0))
            .expect("add");
        editor.select_object(b);

        let outcome = editor.handle_event(CanvasEvent::Click {
            target: PointerTarget::DeleteAffordance(a),
        });
        assert_eq!(outcome, EventOutcome::Deleted { id: a });
        assert!(editor.get_object(a).is_none());
        assert_eq!(editor.selected_object().map(|o| o.id), Some(b));
    }

    #[test]
    fn test_drag_lifecycle_snaps_and_toggles_guides() {
        let (mut editor, id) = editor_with_image(100, 50);
        editor.handle_event(CanvasEvent::DragStart { id });
        assert!(editor.interaction().show_guides());
        assert_eq!(editor.selected_object().map(|o| o.id), Some(id));

        editor.handle_event(CanvasEvent::DragMove {
            id,
            x: 200.0,
            y: 507.0,
        });
        let obj = editor.get_object(id).expect("object");
        assert_eq!((obj.x, obj.y), (200.0, 515.0));

        editor.handle_event(CanvasEvent::DragEnd {
            id,
            x: 916.0,
            y: 100.0,
        });
        let obj = editor.get_object(id).expect("object");
        assert_eq!((obj.x, obj.y), (910.0, 100.0));
        assert!(!editor.interaction().show_guides());
        assert_eq!(editor.selected_object().map(|o| o.id), Some(id));
    }

    #[test]
    fn test_transform_end_bakes_scale_once() {
        let (mut editor, id) = editor_with_image(100, 100);
        editor.transform_object(id, &TransformDelta::scale(2.0, 2.0));

        editor.handle_event(CanvasEvent::TransformStart { id });
        editor.handle_event(CanvasEvent::TransformMove {
            id,
            live: LiveTransform::scaled(1.5, 0.5),
        });
        let outcome = editor.handle_event(CanvasEvent::TransformEnd {
            id,
            live: LiveTransform::scaled(1.5, 0.5),
        });
        assert_eq!(
            outcome,
            EventOutcome::Transformed {
                result: TransformOutcome::Applied
            }
        );

        let obj = editor.get_object(id).expect("object");
        assert_eq!((obj.scale_x, obj.scale_y), (3.0, 1.0));
        assert!(editor.interaction().live_transform(id).is_identity());
    }

    #[test]
    fn test_transform_end_below_floor_keeps_box() {
        let (mut editor, id) = editor_with_image(100, 100);
        editor.handle_event(CanvasEvent::TransformStart { id });
        let outcome = editor.handle_event(CanvasEvent::TransformEnd {
            id,
            live: LiveTransform {
                left: Some(40.0),
                ..LiveTransform::scaled(0.01, 1.0)
            },
        });
        assert_eq!(
            outcome,
            EventOutcome::Transformed {
                result: TransformOutcome::Rejected(RejectReason::BelowMinimumSize)
            }
        );
        let obj = editor.get_object(id).expect("object");
        assert_eq!((obj.x, obj.scale_x), (910.0, 1.0));
        assert!(editor.interaction().is_selected(id));
    }

    #[test]
    fn test_hover_only_tracks_images() {
        let (mut editor, img) = editor_with_image(10, 10);
        let txt = editor
            .add_text("T", &TextOptions::at(0.0, 0.0))
            .expect("add");

        assert_eq!(
            editor.handle_event(CanvasEvent::HoverEnter { id: txt }),
            EventOutcome::Ignored
        );
        assert_eq!(
            editor.handle_event(CanvasEvent::HoverEnter { id: img }),
            EventOutcome::Interaction
        );
        assert_eq!(editor.interaction().hovered_id(), Some(img));
        editor.handle_event(CanvasEvent::HoverLeave { id: img });
        assert!(editor.interaction().hovered_id().is_none());
    }

    #[test]
    fn test_events_for_missing_objects_are_ignored() {
        let mut editor = Editor::default();
        let ghost = ObjectId::new();
        for event in [
            CanvasEvent::DragStart { id: ghost },
            CanvasEvent::DragEnd {
                id: ghost,
                x: 0.0,
                y: 0.0,
            },
            CanvasEvent::Click {
                target: PointerTarget::DeleteAffordance(ghost),
            },
        ] {
            assert_eq!(editor.handle_event(event), EventOutcome::Ignored);
        }
        assert_eq!(editor.interaction().focus(), crate::Focus::Idle);
    }

    #[test]
    fn test_target_at_prefers_delete_control() {
        let (mut editor, id) = editor_with_image(100, 100);
        // Box spans (910, 490) .. (1010, 590); control centered at (1010, 490).
        assert_eq!(editor.target_at(1005.0, 495.0), PointerTarget::Object(id));
        editor.select_object(id);
        assert_eq!(
            editor.target_at(1005.0, 495.0),
            PointerTarget::DeleteAffordance(id)
        );
        assert_eq!(editor.target_at(950.0, 550.0), PointerTarget::Object(id));
        assert_eq!(editor.target_at(5.0, 5.0), PointerTarget::Background);
    }

    #[test]
    fn test_target_at_follows_live_transform() {
        let (mut editor, id) = editor_with_image(100, 100);
        editor.select_object(id);
        editor.handle_event(CanvasEvent::TransformStart { id });
        editor.handle_event(CanvasEvent::TransformMove {
            id,
            live: LiveTransform::scaled(2.0, 2.0),
        });

        // Previewed box spans (910, 490) .. (1110, 690).
        assert_eq!(
            editor.target_at(1105.0, 495.0),
            PointerTarget::DeleteAffordance(id)
        );
        assert_eq!(editor.target_at(1090.0, 650.0), PointerTarget::Object(id));
        assert_eq!(editor.target_at(1005.0, 495.0), PointerTarget::Object(id));

        editor.handle_event(CanvasEvent::TransformEnd {
            id,
            live: LiveTransform::IDENTITY,
        });
        assert_eq!(editor.target_at(1090.0, 650.0), PointerTarget::Background);
    }
}
