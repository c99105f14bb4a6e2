//! Selection and interaction state machine.
//!
//! Selection is a single value, never a set: [`Focus`] names the one object
//! that is selected, being dragged, or being transformed by its handles.
//! Hover is tracked alongside it and only affects affordance visibility.

use serde::Serialize;

use crate::{CanvasObject, LiveTransform, ObjectId};

/// What the user is currently doing with the selected object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Focus {
    /// Nothing selected.
    #[default]
    Idle,
    /// An object is selected.
    Selected {
        /// Selected object.
        id: ObjectId,
    },
    /// The selected object is being dragged; center guides are shown.
    Dragging {
        /// Dragged object.
        id: ObjectId,
    },
    /// The selected object's resize/rotate handles are held.
    Transforming {
        /// Manipulated object.
        id: ObjectId,
        /// Handle state not yet written to the scene.
        live: LiveTransform,
    },
}

impl Focus {
    /// The selected object, whatever the user is doing with it.
    #[must_use]
    pub fn id(&self) -> Option<ObjectId> {
        match *self {
            Self::Idle => None,
            Self::Selected { id } | Self::Dragging { id } | Self::Transforming { id, .. } => {
                Some(id)
            }
        }
    }
}

/// Ephemeral interaction state. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct InteractionState {
    focus: Focus,
    hovered: Option<ObjectId>,
}

impl InteractionState {
    /// Fresh idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current focus.
    #[must_use]
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// The selected object, if any.
    #[must_use]
    pub fn selected_id(&self) -> Option<ObjectId> {
        self.focus.id()
    }

    /// The object being dragged, if any.
    #[must_use]
    pub fn dragging_id(&self) -> Option<ObjectId> {
        match self.focus {
            Focus::Dragging { id } => Some(id),
            _ => None,
        }
    }

    /// The hovered object, if any.
    #[must_use]
    pub fn hovered_id(&self) -> Option<ObjectId> {
        self.hovered
    }

    /// Whether the dashed center guides are visible.
    #[must_use]
    pub fn show_guides(&self) -> bool {
        matches!(self.focus, Focus::Dragging { .. })
    }

    /// Whether `id` is the selected object.
    #[must_use]
    pub fn is_selected(&self, id: ObjectId) -> bool {
        self.selected_id() == Some(id)
    }

    /// Whether `id` is hovered.
    #[must_use]
    pub fn is_hovered(&self, id: ObjectId) -> bool {
        self.hovered == Some(id)
    }

    /// Handle state to preview on `id`; identity unless it is being
    /// transformed.
    #[must_use]
    pub fn live_transform(&self, id: ObjectId) -> LiveTransform {
        match self.focus {
            Focus::Transforming { id: active, live } if active == id => live,
            _ => LiveTransform::IDENTITY,
        }
    }

    /// Whether the delete control is drawn on `object`.
    ///
    /// Shown for the selected object, and for a hovered image. Text objects
    /// only get it through selection.
    #[must_use]
    pub fn shows_delete_affordance(&self, object: &CanvasObject) -> bool {
        self.is_selected(object.id) || (object.is_image() && self.is_hovered(object.id))
    }

    /// Select `id`, implicitly deselecting anything else.
    pub fn select(&mut self, id: ObjectId) {
        if self.selected_id() != Some(id) {
            tracing::debug!("Selected {id}");
        }
        self.focus = Focus::Selected { id };
    }

    /// Reset to idle with nothing hovered.
    pub fn clear(&mut self) {
        if self.focus != Focus::Idle {
            tracing::debug!("Selection cleared");
        }
        self.focus = Focus::Idle;
        self.hovered = None;
    }

    /// Enter the dragging state for `id`, selecting it.
    pub fn begin_drag(&mut self, id: ObjectId) {
        tracing::debug!("Drag started on {id}");
        self.focus = Focus::Dragging { id };
    }

    /// Leave the dragging state, keeping `id` selected.
    pub fn end_drag(&mut self, id: ObjectId) {
        tracing::debug!("Drag ended on {id}");
        self.focus = Focus::Selected { id };
    }

    /// Grab the handles of `id`, selecting it.
    pub fn begin_transform(&mut self, id: ObjectId) {
        self.focus = Focus::Transforming {
            id,
            live: LiveTransform::IDENTITY,
        };
    }

    /// Update the held handle state of `id`.
    pub fn update_transform(&mut self, id: ObjectId, live: LiveTransform) {
        self.focus = Focus::Transforming { id, live };
    }

    /// Release the handles; the live factors go back to identity and `id`
    /// stays selected.
    pub fn end_transform(&mut self, id: ObjectId) {
        self.focus = Focus::Selected { id };
    }

    /// Mark `id` hovered.
    pub fn hover_enter(&mut self, id: ObjectId) {
        self.hovered = Some(id);
    }

    /// Clear the hover if it is on `id`.
    pub fn hover_leave(&mut self, id: ObjectId) {
        if self.hovered == Some(id) {
            self.hovered = None;
        }
    }

    /// Drop every reference to a deleted object.
    pub fn forget(&mut self, id: ObjectId) {
        if self.selected_id() == Some(id) {
            self.focus = Focus::Idle;
        }
        self.hover_leave(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, ImageAsset};

    fn image() -> CanvasObject {
        let asset = ImageAsset::from_rgba(1, 1, vec![0; 4]).expect("asset");
        CanvasObject::image(asset, 10.0, 10.0, 0.0, 0.0)
    }

    #[test]
    fn test_starts_idle() {
        let state = InteractionState::new();
        assert_eq!(state.focus(), Focus::Idle);
        assert!(state.selected_id().is_none());
        assert!(!state.show_guides());
    }

    #[test]
    fn test_single_selection() {
        let mut state = InteractionState::new();
        let a = ObjectId::new();
        let b = ObjectId::new();
        state.select(a);
        state.select(b);
        assert!(state.is_selected(b));
        assert!(!state.is_selected(a));
    }

    #[test]
    fn test_drag_selects_and_shows_guides() {
        let mut state = InteractionState::new();
        let id = ObjectId::new();
        state.begin_drag(id);
        assert_eq!(state.selected_id(), Some(id));
        assert_eq!(state.dragging_id(), Some(id));
        assert!(state.show_guides());

        state.end_drag(id);
        assert_eq!(state.selected_id(), Some(id));
        assert!(state.dragging_id().is_none());
        assert!(!state.show_guides());
    }

    #[test]
    fn test_live_transform_only_for_active_object() {
        let mut state = InteractionState::new();
        let id = ObjectId::new();
        state.begin_transform(id);
        state.update_transform(id, LiveTransform::scaled(2.0, 3.0));
        assert_eq!(state.live_transform(id), LiveTransform::scaled(2.0, 3.0));
        assert!(state.live_transform(ObjectId::new()).is_identity());

        state.end_transform(id);
        assert!(state.live_transform(id).is_identity());
        assert!(state.is_selected(id));
    }

    #[test]
    fn test_forget_clears_selection_and_hover() {
        let mut state = InteractionState::new();
        let id = ObjectId::new();
        state.select(id);
        state.hover_enter(id);
        state.forget(id);
        assert!(state.selected_id().is_none());
        assert!(state.hovered_id().is_none());
    }

    #[test]
    fn test_forget_other_object_keeps_selection() {
        let mut state = InteractionState::new();
        let id = ObjectId::new();
        state.select(id);
        state.forget(ObjectId::new());
        assert!(state.is_selected(id));
    }

    #[test]
    fn test_delete_affordance_visibility() {
        let mut state = InteractionState::new();
        let img = image();
        let txt = CanvasObject::text("T", 12.0, Color::BLACK, 0.0, 0.0);

        assert!(!state.shows_delete_affordance(&img));
        state.hover_enter(img.id);
        assert!(state.shows_delete_affordance(&img));

        state.hover_enter(txt.id);
        assert!(!state.shows_delete_affordance(&txt));
        state.select(txt.id);
        assert!(state.shows_delete_affordance(&txt));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut state = InteractionState::new();
        let id = ObjectId::new();
        state.begin_drag(id);
        state.hover_enter(id);
        state.clear();
        assert_eq!(state, InteractionState::default());
    }
}
