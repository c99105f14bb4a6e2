//! Editor Integration Tests
//!
//! Drives the editor through complete user flows:
//! - Adding, selecting and deleting objects
//! - Drag with center snapping
//! - Handle-based resize and rotate
//! - Draw list projection with overlays

use stage_core::{
    CanvasEvent, DrawNode, Editor, EventOutcome, Focus, GuideAxis, ImageAsset, LiveTransform,
    ObjectId, PointerTarget, RejectReason, TextOptions, TransformDelta, TransformOutcome,
};

fn solid_image(width: u32, height: u32) -> ImageAsset {
    ImageAsset::from_rgba(width, height, vec![200; (width * height * 4) as usize])
        .expect("valid bitmap")
}

fn editor_with_image() -> (Editor, ObjectId) {
    let mut editor = Editor::new(1920.0, 1080.0);
    let id = editor.insert_image(solid_image(100, 100)).expect("insert");
    (editor, id)
}

fn click(editor: &mut Editor, x: f32, y: f32) -> EventOutcome {
    let target = editor.target_at(x, y);
    editor.handle_event(CanvasEvent::Click { target })
}

// ============================================================================
// Object Lifecycle Tests
// ============================================================================

#[test]
fn test_add_text_then_list() {
    let mut editor = Editor::new(1920.0, 1080.0);
    let id = editor
        .add_text("Hello", &TextOptions::at(960.0, 540.0))
        .expect("add text");

    assert_eq!(editor.objects().len(), 1);
    let text = &editor.objects()[0];
    assert_eq!(text.id, id);
    assert!(text.is_text());
    assert_eq!((text.x, text.y), (960.0, 540.0));
    assert_eq!(editor.interaction().focus(), Focus::Idle);
}

#[test]
fn test_paint_order_is_insertion_order() {
    let mut editor = Editor::new(400.0, 400.0);
    let a = editor.insert_image(solid_image(50, 50)).expect("a");
    let b = editor
        .add_text("B", &TextOptions::at(10.0, 10.0))
        .expect("b");
    let c = editor.insert_image(solid_image(60, 60)).expect("c");

    let order: Vec<_> = editor.objects().iter().map(|o| o.id).collect();
    assert_eq!(order, vec![a, b, c]);

    editor.delete_object(b);
    let order: Vec<_> = editor.objects().iter().map(|o| o.id).collect();
    assert_eq!(order, vec![a, c]);
}

#[test]
fn test_topmost_object_wins_hit_test() {
    let mut editor = Editor::new(400.0, 400.0);
    let _below = editor.insert_image(solid_image(100, 100)).expect("below");
    let above = editor.insert_image(solid_image(100, 100)).expect("above");
    assert_eq!(editor.target_at(200.0, 200.0), PointerTarget::Object(above));
}

#[test]
fn test_click_select_then_click_background() {
    let (mut editor, id) = editor_with_image();
    click(&mut editor, 960.0, 540.0);
    assert_eq!(editor.selected_object().map(|o| o.id), Some(id));

    click(&mut editor, 10.0, 10.0);
    assert!(editor.selected_object().is_none());
}

#[test]
fn test_click_delete_control_of_hovered_image() {
    let (mut editor, id) = editor_with_image();
    editor.handle_event(CanvasEvent::HoverEnter { id });

    // Top-right corner of the centered 100x100 image.
    let outcome = click(&mut editor, 1010.0, 490.0);
    assert_eq!(outcome, EventOutcome::Deleted { id });
    assert!(editor.objects().is_empty());
    assert_eq!(editor.interaction().hovered_id(), None);
}

#[test]
fn test_hovered_text_has_no_delete_control() {
    let mut editor = Editor::new(400.0, 400.0);
    let id = editor
        .add_text("Label", &TextOptions::at(100.0, 100.0))
        .expect("add");
    editor.handle_event(CanvasEvent::HoverEnter { id });
    let corner = editor.get_object(id).expect("text").corners()[1];
    assert_eq!(
        editor.target_at(corner.x + 5.0, corner.y),
        PointerTarget::Background
    );
}

// ============================================================================
// Drag and Snap Tests
// ============================================================================

#[test]
fn test_drag_near_center_snaps_both_axes() {
    let (mut editor, id) = editor_with_image();
    editor.handle_event(CanvasEvent::DragStart { id });
    editor.handle_event(CanvasEvent::DragMove {
        id,
        x: 915.0,
        y: 484.0,
    });
    editor.handle_event(CanvasEvent::DragEnd {
        id,
        x: 915.0,
        y: 484.0,
    });

    let obj = editor.get_object(id).expect("object");
    assert_eq!((obj.x, obj.y), (910.0, 490.0));
}

#[test]
fn test_drag_far_from_center_does_not_snap() {
    let (mut editor, id) = editor_with_image();
    editor.handle_event(CanvasEvent::DragStart { id });
    editor.handle_event(CanvasEvent::DragEnd {
        id,
        x: 100.0,
        y: 120.0,
    });
    let obj = editor.get_object(id).expect("object");
    assert_eq!((obj.x, obj.y), (100.0, 120.0));
}

#[test]
fn test_guides_visible_only_while_dragging() {
    let (mut editor, id) = editor_with_image();
    let has_guides = |editor: &mut Editor| {
        editor
            .draw()
            .overlays()
            .any(|n| matches!(n, DrawNode::Guide { .. }))
    };

    assert!(!has_guides(&mut editor));
    editor.handle_event(CanvasEvent::DragStart { id });

    let frame = editor.draw();
    let axes: Vec<_> = frame
        .overlays()
        .filter_map(|n| match n {
            DrawNode::Guide { axis, .. } => Some(*axis),
            _ => None,
        })
        .collect();
    assert_eq!(axes, vec![GuideAxis::Vertical, GuideAxis::Horizontal]);

    editor.handle_event(CanvasEvent::DragEnd {
        id,
        x: 910.0,
        y: 490.0,
    });
    assert!(!has_guides(&mut editor));
}

#[test]
fn test_drag_of_deleted_object_is_ignored() {
    let (mut editor, id) = editor_with_image();
    editor.handle_event(CanvasEvent::DragStart { id });
    editor.delete_object(id);

    let outcome = editor.handle_event(CanvasEvent::DragEnd {
        id,
        x: 0.0,
        y: 0.0,
    });
    assert_eq!(outcome, EventOutcome::Ignored);
    assert!(editor.objects().is_empty());
    assert_eq!(editor.interaction().focus(), Focus::Idle);
}

// ============================================================================
// Handle Transform Tests
// ============================================================================

#[test]
fn test_resize_below_floor_is_rejected() {
    let (mut editor, id) = editor_with_image();
    let outcome = editor.transform_object(id, &TransformDelta::scale(0.001, 0.001));
    assert_eq!(
        outcome,
        TransformOutcome::Rejected(RejectReason::BelowMinimumSize)
    );
    let obj = editor.get_object(id).expect("object");
    assert_eq!((obj.scale_x, obj.scale_y), (1.0, 1.0));
}

#[test]
fn test_resize_exactly_at_floor_is_accepted() {
    let (mut editor, id) = editor_with_image();
    let outcome = editor.transform_object(id, &TransformDelta::scale(0.05, 0.05));
    assert_eq!(outcome, TransformOutcome::Applied);
    assert_eq!(editor.get_object(id).expect("object").scaled_size(), (5.0, 5.0));
}

#[test]
fn test_rotate_via_handles() {
    let (mut editor, id) = editor_with_image();
    editor.handle_event(CanvasEvent::TransformStart { id });
    editor.handle_event(CanvasEvent::TransformMove {
        id,
        live: LiveTransform::rotated(45.0),
    });

    // Unwritten until release.
    assert_eq!(editor.get_object(id).expect("object").rotation, 0.0);

    editor.handle_event(CanvasEvent::TransformEnd {
        id,
        live: LiveTransform::rotated(45.0),
    });
    assert_eq!(editor.get_object(id).expect("object").rotation, 45.0);
}

#[test]
fn test_live_scale_previewed_in_draw_list() {
    let (mut editor, id) = editor_with_image();
    editor.handle_event(CanvasEvent::TransformStart { id });
    editor.handle_event(CanvasEvent::TransformMove {
        id,
        live: LiveTransform::scaled(2.0, 2.0),
    });

    let frame = editor.draw();
    let scale = frame.content().find_map(|n| match n {
        DrawNode::Image { id: node, scale_x, .. } if *node == id => Some(*scale_x),
        _ => None,
    });
    assert_eq!(scale, Some(2.0));
    assert_eq!(editor.get_object(id).expect("object").scale_x, 1.0);
}

#[test]
fn test_unknown_id_transform_does_not_disturb_scene() {
    let (mut editor, _) = editor_with_image();
    let snapshot = editor.objects().to_vec();
    let outcome = editor.transform_object(ObjectId::new(), &TransformDelta::rotation(90.0));
    assert_eq!(outcome, TransformOutcome::Missing);
    assert_eq!(editor.objects(), snapshot.as_slice());
}

// ============================================================================
// Draw List Tests
// ============================================================================

#[test]
fn test_content_draw_excludes_overlays() {
    let (mut editor, id) = editor_with_image();
    editor.select_object(id);
    editor.handle_event(CanvasEvent::HoverEnter { id });

    let frame = editor.draw();
    assert!(frame.overlays().count() > 0);

    let content = editor.draw_content();
    assert_eq!(content.overlays().count(), 0);
    assert_eq!(content.nodes.len(), 2);
}

#[test]
fn test_render_handles_are_stable_across_frames() {
    let (mut editor, id) = editor_with_image();
    editor.draw();
    let first = editor.adapter().handle_for(id).expect("handle");
    editor.transform_object(id, &TransformDelta::position(0.0, 0.0));
    editor.draw();
    assert_eq!(editor.adapter().handle_for(id), Some(first));

    editor.delete_object(id);
    editor.draw();
    assert!(editor.adapter().handle_for(id).is_none());
}
