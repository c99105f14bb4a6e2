//! The async editing session.
//!
//! [`EditorSession`] is the host-facing boundary: it owns the [`Editor`],
//! the bound render surface, the asset loader and the exporter, and is
//! driven through `&mut self` by a single owner. Loads run on their own
//! tasks; their results are folded back into the scene when awaited.

use std::sync::Arc;
use std::time::Duration;

use stage_core::scene::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use stage_core::{
    Background, CanvasEvent, CanvasObject, Editor, EventOutcome, InteractionState, ObjectId,
    OverlayStyle, PointerTarget, TextOptions, TransformDelta, TransformOutcome,
};

use crate::asset::AssetLimits;
use crate::backend::RenderSurface;
use crate::error::{RenderError, RenderResult};
use crate::export::{ExportFormat, ExportOptions, ExportedImage, SceneExporter};
use crate::loader::{
    short, AssetLoader, AssetSource, LoadTicket, LocalAssetSource, PendingLoad,
    DEFAULT_LOAD_TIMEOUT,
};
use crate::Renderer;

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Canvas width in pixels.
    pub width: f32,
    /// Canvas height in pixels.
    pub height: f32,
    /// Bound on each individual image load.
    pub load_timeout: Duration,
    /// How long an export waits on each pending load.
    pub asset_wait_timeout: Duration,
    /// Payload constraints for images.
    pub limits: AssetLimits,
    /// Overlay styling for interactive frames.
    pub overlay_style: OverlayStyle,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            asset_wait_timeout: DEFAULT_LOAD_TIMEOUT,
            limits: AssetLimits::default(),
            overlay_style: OverlayStyle::default(),
        }
    }
}

/// Result of a load folded into the scene.
#[derive(Debug)]
pub struct LoadReport {
    /// Ticket returned by [`EditorSession::start_image_load`].
    pub ticket: LoadTicket,
    /// The new object, or why the load failed.
    pub result: RenderResult<ObjectId>,
}

/// Editor plus surface, loader and exporter.
#[derive(Debug)]
pub struct EditorSession {
    config: SessionConfig,
    editor: Editor,
    renderer: Option<Renderer>,
    loader: AssetLoader,
    exporter: SceneExporter,
    pending: Vec<PendingLoad>,
}

impl EditorSession {
    /// Create a session that loads from local sources.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let source = Arc::new(LocalAssetSource::new(config.limits));
        Self::with_source(config, source)
    }

    /// Create a session that loads images through `source`.
    #[must_use]
    pub fn with_source(config: SessionConfig, source: Arc<dyn AssetSource>) -> Self {
        let editor = Editor::new(config.width, config.height)
            .with_overlay_style(config.overlay_style.clone());
        let loader = AssetLoader::new(source, config.limits, config.load_timeout);
        Self {
            config,
            editor,
            renderer: None,
            loader,
            exporter: SceneExporter::new(),
            pending: Vec::new(),
        }
    }

    /// Bind the render surface. A second call keeps the first surface.
    pub fn initialize(&mut self, surface: Box<dyn RenderSurface>) {
        if self.renderer.is_some() {
            tracing::debug!("Session already initialized; ignoring new surface");
            return;
        }
        tracing::info!(
            "Session initialized on {:?} surface ({}x{})",
            surface.kind(),
            self.config.width,
            self.config.height
        );
        self.renderer = Some(Renderer::new(surface));
        self.refresh();
    }

    /// Whether a surface is bound.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.renderer.is_some()
    }

    /// The session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The underlying editor.
    #[must_use]
    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    /// The bound renderer, if any.
    #[must_use]
    pub fn renderer(&self) -> Option<&Renderer> {
        self.renderer.as_ref()
    }

    /// Load an image and add it centered on the canvas.
    ///
    /// The object appears only after a successful decode.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::AssetLoad`] on fetch, validation or decode
    /// failure, or when the load times out.
    pub async fn add_image(&mut self, url: &str) -> RenderResult<ObjectId> {
        let load = self.loader.spawn(url.to_string());
        let asset = load.join().await.inspect_err(|e| {
            tracing::warn!("Image load failed for {}: {e}", short(url));
        })?;
        let id = self.editor.insert_image(asset)?;
        tracing::info!("Added image {id}");
        self.refresh();
        Ok(id)
    }

    /// Start loading an image without waiting for it.
    ///
    /// Completed loads are added in the order they were started, when
    /// [`finish_pending_loads`](Self::finish_pending_loads) or an export
    /// awaits them.
    pub fn start_image_load(&mut self, url: &str) -> LoadTicket {
        let load = self.loader.spawn(url.to_string());
        let ticket = load.ticket;
        self.pending.push(load);
        ticket
    }

    /// Number of loads started and not yet folded in.
    #[must_use]
    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    /// Await every pending load and add the successful ones.
    pub async fn finish_pending_loads(&mut self) -> Vec<LoadReport> {
        let mut reports = Vec::with_capacity(self.pending.len());
        for load in std::mem::take(&mut self.pending) {
            let ticket = load.ticket;
            let url = load.url.clone();
            let result = match load.join().await {
                Ok(asset) => self.editor.insert_image(asset).map_err(RenderError::from),
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                tracing::warn!("Dropped {ticket} ({}): {e}", short(&url));
            }
            reports.push(LoadReport { ticket, result });
        }
        self.refresh();
        reports
    }

    /// Add a text object.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty content, a malformed color or a
    /// bad font size.
    pub fn add_text(&mut self, content: &str, options: &TextOptions) -> RenderResult<ObjectId> {
        let id = self.editor.add_text(content, options)?;
        self.refresh();
        Ok(id)
    }

    /// Apply a partial geometry update.
    pub fn transform_object(&mut self, id: ObjectId, delta: &TransformDelta) -> TransformOutcome {
        let outcome = self.editor.transform_object(id, delta);
        if outcome.changed() {
            self.refresh();
        }
        outcome
    }

    /// Delete an object. Returns whether it existed.
    pub fn delete_object(&mut self, id: ObjectId) -> bool {
        let deleted = self.editor.delete_object(id);
        if deleted {
            self.refresh();
        }
        deleted
    }

    /// Select an object. Returns whether it exists.
    pub fn select_object(&mut self, id: ObjectId) -> bool {
        let selected = self.editor.select_object(id);
        self.refresh();
        selected
    }

    /// Deselect everything.
    pub fn clear_selection(&mut self) {
        self.editor.clear_selection();
        self.refresh();
    }

    /// Feed one interaction event.
    pub fn handle_event(&mut self, event: CanvasEvent) -> EventOutcome {
        let outcome = self.editor.handle_event(event);
        if outcome != EventOutcome::Ignored {
            self.refresh();
        }
        outcome
    }

    /// Hit-test a pointer position.
    #[must_use]
    pub fn target_at(&self, x: f32, y: f32) -> PointerTarget {
        self.editor.target_at(x, y)
    }

    /// Replace the background.
    pub fn set_background(&mut self, background: Background) {
        self.editor.set_background(background);
        self.refresh();
    }

    /// All objects in paint order.
    #[must_use]
    pub fn objects(&self) -> &[CanvasObject] {
        self.editor.objects()
    }

    /// The selected object, if any.
    #[must_use]
    pub fn selected_object(&self) -> Option<&CanvasObject> {
        self.editor.selected_object()
    }

    /// Interaction state.
    #[must_use]
    pub fn interaction(&self) -> &InteractionState {
        self.editor.interaction()
    }

    /// Export the canvas content.
    ///
    /// # Errors
    ///
    /// See [`export_with`](Self::export_with).
    pub async fn export_canvas(
        &mut self,
        format: ExportFormat,
        quality: f32,
    ) -> RenderResult<ExportedImage> {
        self.export_with(ExportOptions::new(format, quality)).await
    }

    /// Export the canvas content with full options.
    ///
    /// Pending loads are awaited first; failed ones are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Validation`] for bad options,
    /// [`RenderError::AssetNotReady`] if a load is still running after the
    /// wait bound, and [`RenderError::Export`] if rasterization fails.
    pub async fn export_with(&mut self, options: ExportOptions) -> RenderResult<ExportedImage> {
        options.validate()?;
        self.settle_pending_loads().await?;

        let frame = self.editor.draw_content();
        let exporter = self.exporter.clone();
        tokio::task::spawn_blocking(move || exporter.export(&frame, &options))
            .await
            .map_err(|e| RenderError::Export(format!("Export task failed: {e}")))?
    }

    /// Project the interactive frame and present it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Surface`] if no surface is bound or the
    /// surface rejects the frame.
    pub fn redraw(&mut self) -> RenderResult<()> {
        let renderer = self
            .renderer
            .as_mut()
            .ok_or_else(|| RenderError::Surface("Session is not initialized".to_string()))?;
        let frame = self.editor.draw();
        renderer.render(&frame)
    }

    /// Redraw if a surface is bound.
    fn refresh(&mut self) {
        if self.renderer.is_none() {
            return;
        }
        if let Err(e) = self.redraw() {
            tracing::warn!("Redraw failed: {e}");
        }
    }

    /// Fold finished loads into the scene, waiting on each up to the bound.
    async fn settle_pending_loads(&mut self) -> RenderResult<()> {
        let wait = self.config.asset_wait_timeout;
        let mut queue = std::mem::take(&mut self.pending).into_iter();
        let mut first_error = None;

        while let Some(load) = queue.next() {
            let ticket = load.ticket;
            match load.join_within(wait).await {
                Ok(Ok(asset)) => {
                    if let Err(e) = self.editor.insert_image(asset) {
                        tracing::warn!("Could not place {ticket} before export: {e}");
                        first_error.get_or_insert(RenderError::from(e));
                    }
                }
                Ok(Err(e)) => tracing::warn!("Dropped {ticket} before export: {e}"),
                Err(still_running) => {
                    let url = short(&still_running.url).to_string();
                    self.pending.push(still_running);
                    self.pending.extend(queue);
                    self.refresh();
                    return Err(RenderError::AssetNotReady(format!(
                        "{ticket} ({url}) still loading after {}ms",
                        wait.as_millis()
                    )));
                }
            }
        }
        self.refresh();
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        for load in &self.pending {
            load.cancel();
        }
    }
}
