//! Render adapter: projects the scene and interaction state into a draw list.
//!
//! The adapter keeps no geometry of its own. Each call to
//! [`RenderAdapter::project`] rebuilds the full list from the current model.
//! The one piece of state it owns is the [`RenderHandle`] map, which gives
//! every object a stable handle for the host's retained nodes.

use std::collections::HashMap;

use serde::Serialize;

use crate::element::rotate_about;
use crate::{
    Background, CanvasObject, Color, ImageAsset, InteractionState, LiveTransform, ObjectId,
    ObjectKind, Point, Scene,
};

/// Stable handle correlating an object with the host's drawable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RenderHandle(u64);

impl RenderHandle {
    /// Raw handle value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Styling for interaction overlays.
#[derive(Debug, Clone, Serialize)]
pub struct OverlayStyle {
    /// Stroke color of the center guides.
    pub guide_color: Color,
    /// Stroke width of the center guides.
    pub guide_width: f32,
    /// Dash pattern (on, off) of the center guides.
    pub guide_dash: [f32; 2],
    /// Color of the selection outline and handles.
    pub handle_color: Color,
    /// Side length of a square resize handle.
    pub handle_size: f32,
    /// Distance of the rotation handle above the top edge.
    pub rotate_handle_offset: f32,
    /// Radius of the delete control.
    pub delete_radius: f32,
    /// Fill of the delete control.
    pub delete_fill: Color,
    /// Color of the X glyph.
    pub delete_glyph: Color,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            guide_color: Color::rgb(0xec, 0x48, 0x99),
            guide_width: 1.0,
            guide_dash: [4.0, 4.0],
            handle_color: Color::rgb(0x3b, 0x82, 0xf6),
            handle_size: 10.0,
            rotate_handle_offset: 50.0,
            delete_radius: 12.0,
            delete_fill: Color::rgb(0xef, 0x44, 0x44),
            delete_glyph: Color::WHITE,
        }
    }
}

/// Orientation of a center guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideAxis {
    /// Vertical line through the horizontal center.
    Vertical,
    /// Horizontal line through the vertical center.
    Horizontal,
}

/// One drawable primitive.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum DrawNode {
    /// Full-canvas background fill.
    Background {
        /// Fill.
        background: Background,
        /// Canvas width.
        width: f32,
        /// Canvas height.
        height: f32,
    },

    /// A bitmap drawn in the object's `translate rotate scale` frame.
    Image {
        /// Object handle.
        handle: RenderHandle,
        /// Source object.
        id: ObjectId,
        /// Bitmap.
        image: ImageAsset,
        /// Left edge.
        x: f32,
        /// Top edge.
        y: f32,
        /// Width at scale 1.
        width: f32,
        /// Height at scale 1.
        height: f32,
        /// Horizontal scale.
        scale_x: f32,
        /// Vertical scale.
        scale_y: f32,
        /// Rotation in degrees.
        rotation: f32,
    },

    /// A text block drawn in the object's `translate rotate scale` frame.
    Text {
        /// Object handle.
        handle: RenderHandle,
        /// Source object.
        id: ObjectId,
        /// Content.
        text: String,
        /// Font size.
        font_size: f32,
        /// Fill color.
        fill: Color,
        /// Left edge.
        x: f32,
        /// Top edge.
        y: f32,
        /// Horizontal scale.
        scale_x: f32,
        /// Vertical scale.
        scale_y: f32,
        /// Rotation in degrees.
        rotation: f32,
    },

    /// Dashed canvas centerline shown while dragging.
    Guide {
        /// Orientation.
        axis: GuideAxis,
        /// X of a vertical guide or Y of a horizontal one.
        position: f32,
        /// Line length (canvas height or width).
        length: f32,
        /// Stroke color.
        color: Color,
        /// Stroke width.
        width: f32,
        /// Dash pattern.
        dash: [f32; 2],
    },

    /// Selection outline with resize and rotation handles.
    Handles {
        /// Selected object.
        id: ObjectId,
        /// Transformed box corners, clockwise from top-left.
        outline: [Point; 4],
        /// Centers of the eight resize handles.
        resize: [Point; 8],
        /// Center of the rotation handle.
        rotate: Point,
        /// Handle side length.
        size: f32,
        /// Outline and handle color.
        color: Color,
    },

    /// Circular delete control with an X glyph.
    DeleteAffordance {
        /// Object the control deletes.
        id: ObjectId,
        /// Circle center.
        center: Point,
        /// Circle radius.
        radius: f32,
        /// Circle fill.
        fill: Color,
        /// Glyph color.
        glyph: Color,
    },
}

impl DrawNode {
    /// Whether this node only exists for interaction and never reaches an
    /// export.
    #[must_use]
    pub fn is_overlay(&self) -> bool {
        matches!(
            self,
            Self::Guide { .. } | Self::Handles { .. } | Self::DeleteAffordance { .. }
        )
    }
}

/// A complete frame, back to front.
#[derive(Debug, Clone, Serialize)]
pub struct DrawList {
    /// Canvas width.
    pub width: f32,
    /// Canvas height.
    pub height: f32,
    /// Nodes in paint order.
    pub nodes: Vec<DrawNode>,
}

impl DrawList {
    /// Nodes that make up the picture itself.
    pub fn content(&self) -> impl Iterator<Item = &DrawNode> {
        self.nodes.iter().filter(|n| !n.is_overlay())
    }

    /// Interaction-only nodes.
    pub fn overlays(&self) -> impl Iterator<Item = &DrawNode> {
        self.nodes.iter().filter(|n| n.is_overlay())
    }
}

/// Projects a [`Scene`] into [`DrawList`]s and owns the id→handle map.
#[derive(Debug, Default)]
pub struct RenderAdapter {
    style: OverlayStyle,
    handles: HashMap<ObjectId, RenderHandle>,
    next_handle: u64,
}

impl RenderAdapter {
    /// Create an adapter with the given overlay style.
    #[must_use]
    pub fn new(style: OverlayStyle) -> Self {
        Self {
            style,
            handles: HashMap::new(),
            next_handle: 0,
        }
    }

    /// Overlay style in use.
    #[must_use]
    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Handle assigned to `id`, if it has been projected.
    #[must_use]
    pub fn handle_for(&self, id: ObjectId) -> Option<RenderHandle> {
        self.handles.get(&id).copied()
    }

    /// Object owning `handle`, if it is still live.
    #[must_use]
    pub fn object_for(&self, handle: RenderHandle) -> Option<ObjectId> {
        self.handles
            .iter()
            .find_map(|(id, h)| (*h == handle).then_some(*id))
    }

    /// Full frame: content plus interaction overlays.
    pub fn project(&mut self, scene: &Scene, interaction: &InteractionState) -> DrawList {
        self.sync_handles(scene);

        let mut nodes = Vec::with_capacity(scene.len() + 4);
        nodes.push(background_node(scene));
        for object in scene.objects() {
            let live = interaction.live_transform(object.id);
            let shown = preview(object, &live);
            nodes.push(self.object_node(&shown));
        }

        if interaction.show_guides() {
            let center = scene.center();
            nodes.push(self.guide(GuideAxis::Vertical, center.x, scene.height()));
            nodes.push(self.guide(GuideAxis::Horizontal, center.y, scene.width()));
        }

        if let Some(selected) = interaction
            .selected_id()
            .and_then(|id| scene.get_object(id))
        {
            let shown = preview(selected, &interaction.live_transform(selected.id));
            nodes.push(self.handles_node(&shown));
        }

        for object in scene.objects() {
            if interaction.shows_delete_affordance(object) {
                let shown = preview(object, &interaction.live_transform(object.id));
                nodes.push(DrawNode::DeleteAffordance {
                    id: object.id,
                    center: delete_affordance_center(&shown),
                    radius: self.style.delete_radius,
                    fill: self.style.delete_fill,
                    glyph: self.style.delete_glyph,
                });
            }
        }

        tracing::trace!("Projected {} draw nodes", nodes.len());
        DrawList {
            width: scene.width(),
            height: scene.height(),
            nodes,
        }
    }

    /// Background and objects only, as stored. Used for export.
    pub fn project_content(&mut self, scene: &Scene) -> DrawList {
        self.sync_handles(scene);

        let mut nodes = Vec::with_capacity(scene.len() + 1);
        nodes.push(background_node(scene));
        nodes.extend(scene.objects().iter().map(|o| self.object_node(o)));
        DrawList {
            width: scene.width(),
            height: scene.height(),
            nodes,
        }
    }

    fn sync_handles(&mut self, scene: &Scene) {
        let mut synced = HashMap::with_capacity(scene.len());
        for object in scene.objects() {
            let handle = match self.handles.remove(&object.id) {
                Some(handle) => handle,
                None => {
                    let handle = RenderHandle(self.next_handle);
                    self.next_handle += 1;
                    handle
                }
            };
            synced.insert(object.id, handle);
        }
        // Whatever is left belonged to removed objects
        self.handles = synced;
    }

    fn handle(&self, id: ObjectId) -> RenderHandle {
        // sync_handles runs before any node is built
        self.handles
            .get(&id)
            .copied()
            .unwrap_or(RenderHandle(u64::MAX))
    }

    fn object_node(&self, object: &CanvasObject) -> DrawNode {
        let handle = self.handle(object.id);
        match &object.kind {
            ObjectKind::Image {
                width,
                height,
                image,
            } => DrawNode::Image {
                handle,
                id: object.id,
                image: image.clone(),
                x: object.x,
                y: object.y,
                width: *width,
                height: *height,
                scale_x: object.scale_x,
                scale_y: object.scale_y,
                rotation: object.rotation,
            },
            ObjectKind::Text {
                text,
                font_size,
                fill,
            } => DrawNode::Text {
                handle,
                id: object.id,
                text: text.clone(),
                font_size: *font_size,
                fill: *fill,
                x: object.x,
                y: object.y,
                scale_x: object.scale_x,
                scale_y: object.scale_y,
                rotation: object.rotation,
            },
        }
    }

    fn guide(&self, axis: GuideAxis, position: f32, length: f32) -> DrawNode {
        DrawNode::Guide {
            axis,
            position,
            length,
            color: self.style.guide_color,
            width: self.style.guide_width,
            dash: self.style.guide_dash,
        }
    }

    fn handles_node(&self, object: &CanvasObject) -> DrawNode {
        let (w, h) = object.scaled_size();
        let at = |lx: f32, ly: f32| object.local_to_canvas(lx, ly);
        DrawNode::Handles {
            id: object.id,
            outline: object.corners(),
            resize: [
                at(0.0, 0.0),
                at(w / 2.0, 0.0),
                at(w, 0.0),
                at(w, h / 2.0),
                at(w, h),
                at(w / 2.0, h),
                at(0.0, h),
                at(0.0, h / 2.0),
            ],
            rotate: at(w / 2.0, -self.style.rotate_handle_offset),
            size: self.style.handle_size,
            color: self.style.handle_color,
        }
    }
}

/// Center of the delete control: the top-right corner of the transformed box.
#[must_use]
pub fn delete_affordance_center(object: &CanvasObject) -> Point {
    let (w, _) = object.scaled_size();
    rotate_about(object.x, object.y, object.rotation, w, 0.0)
}

/// The object as it should appear with the held handle state applied.
#[must_use]
pub fn preview(object: &CanvasObject, live: &LiveTransform) -> CanvasObject {
    let mut shown = object.clone();
    if live.is_identity() {
        return shown;
    }
    shown.scale_x *= live.scale_x;
    shown.scale_y *= live.scale_y;
    if let Some(angle) = live.angle {
        shown.rotation = angle;
    }
    if let Some(left) = live.left {
        shown.x = left;
    }
    if let Some(top) = live.top {
        shown.y = top;
    }
    shown
}

fn background_node(scene: &Scene) -> DrawNode {
    DrawNode::Background {
        background: *scene.background(),
        width: scene.width(),
        height: scene.height(),
    }
}
