//! WebAssembly bindings for stage-core.
//!
//! Structured arguments and results cross the boundary as JSON strings.
//! Image decoding happens on the JS side; [`WasmEditor::add_decoded_image`]
//! receives raw RGBA.

use wasm_bindgen::prelude::*;

use crate::{
    Background, CanvasEvent, Editor, ImageAsset, ObjectId, PointerTarget, TextOptions,
    TransformDelta,
};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Editor instance for WASM.
#[wasm_bindgen]
pub struct WasmEditor {
    editor: Editor,
}

#[wasm_bindgen]
impl WasmEditor {
    /// Create an editor with the given canvas size.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            editor: Editor::new(width, height),
        }
    }

    /// Add a text object. `options_json` is an optional `TextOptions` object.
    ///
    /// # Errors
    ///
    /// Returns an error string if the options are malformed or invalid.
    #[wasm_bindgen(js_name = addText)]
    pub fn add_text(&mut self, content: &str, options_json: Option<String>) -> Result<String, String> {
        let options: TextOptions = match options_json.as_deref() {
            Some(json) if !json.trim().is_empty() => {
                serde_json::from_str(json).map_err(|e| e.to_string())?
            }
            _ => TextOptions::default(),
        };
        let id = self
            .editor
            .add_text(content, &options)
            .map_err(|e| e.to_string())?;
        Ok(id.to_string())
    }

    /// Add an image already decoded to RGBA by the host.
    ///
    /// # Errors
    ///
    /// Returns an error string if the buffer does not match the dimensions.
    #[wasm_bindgen(js_name = addDecodedImage)]
    pub fn add_decoded_image(&mut self, width: u32, height: u32, rgba: Vec<u8>) -> Result<String, String> {
        let asset = ImageAsset::from_rgba(width, height, rgba).map_err(|e| e.to_string())?;
        let id = self.editor.insert_image(asset).map_err(|e| e.to_string())?;
        Ok(id.to_string())
    }

    /// Apply a partial transform; returns the outcome as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if the id or delta cannot be parsed.
    #[wasm_bindgen(js_name = transformObject)]
    pub fn transform_object(&mut self, id: &str, delta_json: &str) -> Result<String, String> {
        let id = ObjectId::parse(id).map_err(|e| e.to_string())?;
        let delta: TransformDelta = serde_json::from_str(delta_json).map_err(|e| e.to_string())?;
        let outcome = self.editor.transform_object(id, &delta);
        serde_json::to_string(&outcome).map_err(|e| e.to_string())
    }

    /// Delete an object; returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error string if the id cannot be parsed.
    #[wasm_bindgen(js_name = deleteObject)]
    pub fn delete_object(&mut self, id: &str) -> Result<bool, String> {
        let id = ObjectId::parse(id).map_err(|e| e.to_string())?;
        Ok(self.editor.delete_object(id))
    }

    /// Select an object; returns whether it exists.
    ///
    /// # Errors
    ///
    /// Returns an error string if the id cannot be parsed.
    #[wasm_bindgen(js_name = selectObject)]
    pub fn select_object(&mut self, id: &str) -> Result<bool, String> {
        let id = ObjectId::parse(id).map_err(|e| e.to_string())?;
        Ok(self.editor.select_object(id))
    }

    /// Deselect everything.
    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&mut self) {
        self.editor.clear_selection();
    }

    /// Replace the background from a JSON `Background`.
    ///
    /// # Errors
    ///
    /// Returns an error string if the JSON is invalid.
    #[wasm_bindgen(js_name = setBackground)]
    pub fn set_background(&mut self, background_json: &str) -> Result<(), String> {
        let background: Background =
            serde_json::from_str(background_json).map_err(|e| e.to_string())?;
        self.editor.set_background(background);
        Ok(())
    }

    /// Feed one interaction event (JSON `CanvasEvent`); returns the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error string if the event JSON is invalid.
    #[wasm_bindgen(js_name = handleEvent)]
    pub fn handle_event(&mut self, event_json: &str) -> Result<String, String> {
        let event: CanvasEvent = serde_json::from_str(event_json).map_err(|e| e.to_string())?;
        let outcome = self.editor.handle_event(event);
        serde_json::to_string(&outcome).map_err(|e| e.to_string())
    }

    /// Hit-test a pointer position; returns a JSON `PointerTarget`.
    #[wasm_bindgen(js_name = targetAt)]
    #[must_use]
    pub fn target_at(&self, x: f32, y: f32) -> String {
        let target: PointerTarget = self.editor.target_at(x, y);
        serde_json::to_string(&target).unwrap_or_default()
    }

    /// All objects in paint order, as JSON.
    #[wasm_bindgen(js_name = getObjectsJson)]
    #[must_use]
    pub fn get_objects_json(&self) -> String {
        serde_json::to_string(self.editor.objects()).unwrap_or_default()
    }

    /// The selected object as JSON, or `null`.
    #[wasm_bindgen(js_name = getSelectedJson)]
    #[must_use]
    pub fn get_selected_json(&self) -> String {
        serde_json::to_string(&self.editor.selected_object()).unwrap_or_default()
    }

    /// The next frame's draw list as JSON.
    #[wasm_bindgen(js_name = drawJson)]
    #[must_use]
    pub fn draw_json(&mut self) -> String {
        serde_json::to_string(&self.editor.draw()).unwrap_or_default()
    }
}

impl Default for WasmEditor {
    fn default() -> Self {
        Self::new(
            crate::scene::DEFAULT_CANVAS_WIDTH,
            crate::scene::DEFAULT_CANVAS_HEIGHT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_text_with_json_options() {
        let mut editor = WasmEditor::default();
        let id = editor
            .add_text("Hello", Some(r##"{"fontSize":32,"color":"#ff0000","x":10,"y":20}"##.to_string()))
            .expect("add");
        assert!(ObjectId::parse(&id).is_ok());
        let objects: serde_json::Value =
            serde_json::from_str(&editor.get_objects_json()).expect("json");
        assert_eq!(objects[0]["font_size"], 32.0);
        assert_eq!(objects[0]["fill"], "#ff0000");
    }

    #[test]
    fn test_bad_color_surfaces_as_error_string() {
        let mut editor = WasmEditor::default();
        let err = editor
            .add_text("Hi", Some(r#"{"color":"nope"}"#.to_string()))
            .expect_err("invalid color");
        assert!(err.contains("nope"));
    }

    #[test]
    fn test_decoded_image_and_selection() {
        let mut editor = WasmEditor::new(100.0, 100.0);
        let id = editor
            .add_decoded_image(2, 2, vec![255; 16])
            .expect("image");
        assert!(editor.select_object(&id).expect("select"));
        assert_ne!(editor.get_selected_json(), "null");
        assert!(editor.delete_object(&id).expect("delete"));
        assert_eq!(editor.get_selected_json(), "null");
    }

    #[test]
    fn test_handle_event_json() {
        let mut editor = WasmEditor::default();
        let outcome = editor
            .handle_event(r#"{"type":"click","target":{"target":"background"}}"#)
            .expect("event");
        assert!(outcome.contains("interaction"));
    }
}
