//! Canvas export to raster formats.
//!
//! Renders a content [`DrawList`] to PNG or JPEG using an SVG intermediate
//! representation and the resvg/tiny-skia rasterization pipeline.

use std::fmt::Write;
use std::str::FromStr;
use std::sync::Arc;

use base64::Engine;
use image::ImageEncoder;
use serde::{Deserialize, Serialize};
use stage_core::{Background, Color, DrawList, DrawNode};

use crate::asset::png_data_uri;
use crate::error::{RenderError, RenderResult};

/// Largest accepted pixel ratio.
pub const MAX_PIXEL_RATIO: u32 = 5;

/// Default JPEG quality on the 0..=1 scale.
pub const DEFAULT_QUALITY: f32 = 0.92;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG image.
    #[default]
    Png,
    /// JPEG image.
    #[serde(alias = "jpg")]
    Jpeg,
}

impl ExportFormat {
    /// MIME type of the encoded bytes.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// File extension without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            other => Err(RenderError::Validation(format!(
                "Unknown export format: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Configuration for one export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Output format.
    pub format: ExportFormat,
    /// JPEG quality in `0.0..=1.0`; ignored for PNG.
    pub quality: f32,
    /// Output pixels per canvas pixel, `1..=5`.
    pub pixel_ratio: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: DEFAULT_QUALITY,
            pixel_ratio: 1,
        }
    }
}

impl ExportOptions {
    /// Options for `format` at `quality`, pixel ratio 1.
    #[must_use]
    pub fn new(format: ExportFormat, quality: f32) -> Self {
        Self {
            format,
            quality,
            ..Self::default()
        }
    }

    /// Check quality and pixel ratio ranges.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Validation`] if either is out of range.
    pub fn validate(&self) -> RenderResult<()> {
        if !self.quality.is_finite() || !(0.0..=1.0).contains(&self.quality) {
            return Err(RenderError::Validation(format!(
                "Quality must be within 0..=1, got {}",
                self.quality
            )));
        }
        if !(1..=MAX_PIXEL_RATIO).contains(&self.pixel_ratio) {
            return Err(RenderError::Validation(format!(
                "Pixel ratio must be within 1..={MAX_PIXEL_RATIO}, got {}",
                self.pixel_ratio
            )));
        }
        Ok(())
    }

    /// Encoder quality: `round(quality * 100)` clamped to `1..=100`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// An encoded export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    /// Encoding.
    pub format: ExportFormat,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Encoded bytes.
    pub bytes: Vec<u8>,
}

impl ExportedImage {
    /// MIME type of [`Self::bytes`].
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// File extension without the dot.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    /// `data:<mime>;base64,...` form.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{encoded}", self.mime_type())
    }

    /// Download-style file name `stage-<unix-ms>.<ext>`.
    #[must_use]
    pub fn file_name(&self, unix_ms: u128) -> String {
        format!("stage-{unix_ms}.{}", self.extension())
    }
}

/// Rasterizes content draw lists.
#[derive(Clone)]
pub struct SceneExporter {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for SceneExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneExporter")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl Default for SceneExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneExporter {
    /// Create an exporter using the system fonts for text.
    #[must_use]
    pub fn new() -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        tracing::debug!("Loaded {} font faces for export", fontdb.len());
        Self {
            fontdb: Arc::new(fontdb),
        }
    }

    /// Render and encode `frame`.
    ///
    /// Overlay nodes are skipped, so a full interactive frame exports the
    /// same pixels as its content-only projection.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Validation`] for out-of-range options and
    /// [`RenderError::Export`] if the canvas is empty or encoding fails.
    pub fn export(&self, frame: &DrawList, options: &ExportOptions) -> RenderResult<ExportedImage> {
        options.validate()?;
        let svg = self.render_to_svg(frame, options.pixel_ratio)?;
        let pixmap = self.rasterize_svg(&svg)?;
        let (width, height) = (pixmap.width(), pixmap.height());

        let bytes = match options.format {
            ExportFormat::Png => pixmap
                .encode_png()
                .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))?,
            ExportFormat::Jpeg => encode_jpeg(&pixmap, options.jpeg_quality())?,
        };
        if bytes.is_empty() {
            return Err(RenderError::Export("Encoder produced no bytes".to_string()));
        }

        tracing::info!(
            "Exported {width}x{height} {} ({} bytes)",
            options.format,
            bytes.len()
        );
        Ok(ExportedImage {
            format: options.format,
            width,
            height,
            bytes,
        })
    }

    /// Render `frame` to an SVG document at `pixel_ratio`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Export`] if the canvas has no area or an image
    /// cannot be embedded.
    pub fn render_to_svg(&self, frame: &DrawList, pixel_ratio: u32) -> RenderResult<String> {
        let (out_w, out_h) = output_dimensions(frame, pixel_ratio)?;

        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {} {}\">",
            frame.width, frame.height,
        );

        for node in frame.content() {
            render_node_svg(&mut svg, node)?;
        }

        svg.push_str("</svg>");
        Ok(svg)
    }

    /// Rasterize an SVG string to a tiny-skia Pixmap.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize_svg(&self, svg_string: &str) -> RenderResult<tiny_skia::Pixmap> {
        let opt = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(svg_string, &opt)
            .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

        let px_w = tree.size().width().round() as u32;
        let px_h = tree.size().height().round() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w, px_h)
            .ok_or_else(|| RenderError::Export(format!("Cannot allocate {px_w}x{px_h} surface")))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(pixmap)
    }
}

/// Output pixel size, rejecting empty canvases.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn output_dimensions(frame: &DrawList, pixel_ratio: u32) -> RenderResult<(u32, u32)> {
    let ratio = pixel_ratio as f32;
    let out_w = (frame.width * ratio).round();
    let out_h = (frame.height * ratio).round();
    if !(out_w.is_finite() && out_h.is_finite()) || out_w < 1.0 || out_h < 1.0 {
        return Err(RenderError::Export(format!(
            "Canvas has no area ({}x{})",
            frame.width, frame.height
        )));
    }
    Ok((out_w as u32, out_h as u32))
}

/// Flatten onto white and encode as JPEG.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn encode_jpeg(pixmap: &tiny_skia::Pixmap, quality: u8) -> RenderResult<Vec<u8>> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let mut rgb_data = Vec::with_capacity((width * height * 3) as usize);
    // Pixmap data is premultiplied.
    for pixel in pixmap.data().chunks_exact(4) {
        let inv = 255.0 - f32::from(pixel[3]);
        for &channel in &pixel[..3] {
            rgb_data.push((f32::from(channel) + inv).min(255.0) as u8);
        }
    }

    let mut buf = std::io::Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .write_image(&rgb_data, width, height, image::ColorType::Rgb8.into())
        .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;

    Ok(buf.into_inner())
}

/// Render a single content node to SVG.
fn render_node_svg(svg: &mut String, node: &DrawNode) -> RenderResult<()> {
    match node {
        DrawNode::Background {
            background,
            width,
            height,
        } => render_background_svg(svg, background, *width, *height),

        DrawNode::Image {
            image,
            x,
            y,
            width,
            height,
            scale_x,
            scale_y,
            rotation,
            ..
        } => {
            let href = png_data_uri(image)?;
            let _ = write!(
                svg,
                "<g transform=\"translate({x},{y}) rotate({rotation}) scale({scale_x},{scale_y})\"><image width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"none\" href=\"{href}\"/></g>",
            );
        }

        DrawNode::Text {
            text,
            font_size,
            fill,
            x,
            y,
            scale_x,
            scale_y,
            rotation,
            ..
        } => {
            let _ = write!(
                svg,
                "<g transform=\"translate({x},{y}) rotate({rotation}) scale({scale_x},{scale_y})\"><text font-size=\"{font_size}\" fill=\"{fill}\" font-family=\"sans-serif\">",
            );
            for (line_no, line) in text.lines().enumerate() {
                #[allow(clippy::cast_precision_loss)]
                let baseline = font_size * (line_no as f32 + 1.0);
                let _ = write!(
                    svg,
                    "<tspan x=\"0\" y=\"{baseline}\" xml:space=\"preserve\">{}</tspan>",
                    escape_xml(line)
                );
            }
            svg.push_str("</text></g>");
        }

        DrawNode::Guide { .. } | DrawNode::Handles { .. } | DrawNode::DeleteAffordance { .. } => {}
    }
    Ok(())
}

fn render_background_svg(svg: &mut String, background: &Background, width: f32, height: f32) {
    match *background {
        Background::Solid { color } => {
            let _ = write!(
                svg,
                "<rect width=\"{width}\" height=\"{height}\" fill=\"{color}\"/>",
            );
        }
        Background::LinearGradient { from, to, angle } => {
            let (x1, y1, x2, y2) = gradient_line(width, height, angle);
            let _ = write!(
                svg,
                "<defs><linearGradient id=\"bg\" gradientUnits=\"userSpaceOnUse\" x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\">{}{}</linearGradient></defs><rect width=\"{width}\" height=\"{height}\" fill=\"url(#bg)\"/>",
                stop(0.0, from),
                stop(1.0, to),
            );
        }
    }
}

fn stop(offset: f32, color: Color) -> String {
    format!("<stop offset=\"{offset}\" stop-color=\"{color}\"/>")
}

/// Endpoints of a gradient line through the canvas center that just covers
/// every corner.
fn gradient_line(width: f32, height: f32, angle: f32) -> (f32, f32, f32, f32) {
    let (dy, dx) = angle.to_radians().sin_cos();
    let half = (width * dx).abs().mul_add(0.5, (height * dy).abs() * 0.5);
    let (cx, cy) = (width / 2.0, height / 2.0);
    (cx - dx * half, cy - dy * half, cx + dx * half, cy + dy * half)
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
