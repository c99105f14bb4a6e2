//! Integration tests for canvas export (stage-renderer).
//!
//! Tests exported pixels, pixel ratios, overlay exclusion, JPEG quality and
//! option validation through the session boundary.

use base64::Engine;
use stage_core::{Background, CanvasEvent, Color, TextOptions, TransformDelta};
use stage_renderer::{
    EditorSession, ExportFormat, ExportOptions, ExportedImage, RenderError, SessionConfig,
};

/// Encode a solid-color PNG as a data URI.
fn solid_png_uri(width: u32, height: u32, rgba: [u8; 4]) -> String {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    encode_uri(&img)
}

/// Encode a noisy PNG as a data URI; noise makes JPEG size track quality.
fn noise_png_uri(width: u32, height: u32) -> String {
    let mut state = 0x2545_f491_u32;
    let img = image::RgbaImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        image::Rgba([r, g, b, 255])
    });
    encode_uri(&img)
}

fn encode_uri(img: &image::RgbaImage) -> String {
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    let encoded = base64::engine::general_purpose::STANDARD.encode(buf.into_inner());
    format!("data:image/png;base64,{encoded}")
}

fn session(width: f32, height: f32) -> EditorSession {
    EditorSession::new(SessionConfig {
        width,
        height,
        ..SessionConfig::default()
    })
}

fn pixel(image: &ExportedImage, x: u32, y: u32) -> [u8; 4] {
    let decoded = image::load_from_memory(&image.bytes)
        .expect("decode export")
        .to_rgba8();
    decoded.get_pixel(x, y).0
}

// ==========================================================================
// Dimensions and encoding
// ==========================================================================

#[tokio::test]
async fn test_png_export_matches_canvas_size() {
    let mut session = session(64.0, 32.0);
    let image = session
        .export_canvas(ExportFormat::Png, 1.0)
        .await
        .expect("export");
    assert_eq!((image.width, image.height), (64, 32));
    assert_eq!(&image.bytes[0..4], &[137, 80, 78, 71]);
    assert_eq!(pixel(&image, 10, 10), [255, 255, 255, 255]);
}

#[tokio::test]
async fn test_pixel_ratio_multiplies_output() {
    let mut session = session(64.0, 32.0);
    let image = session
        .export_with(ExportOptions {
            pixel_ratio: 2,
            ..ExportOptions::default()
        })
        .await
        .expect("export");
    assert_eq!((image.width, image.height), (128, 64));
}

#[tokio::test]
async fn test_jpeg_export_is_opaque_jpeg() {
    let mut session = session(32.0, 32.0);
    let image = session
        .export_canvas(ExportFormat::Jpeg, 0.92)
        .await
        .expect("export");
    assert_eq!(&image.bytes[0..2], &[0xFF, 0xD8]);
    assert_eq!(image.mime_type(), "image/jpeg");
    assert!(image.to_data_uri().starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn test_lower_quality_is_smaller() {
    let mut session = session(96.0, 96.0);
    session
        .add_image(&noise_png_uri(96, 96))
        .await
        .expect("noise image");

    let low = session
        .export_canvas(ExportFormat::Jpeg, 0.1)
        .await
        .expect("low");
    let high = session
        .export_canvas(ExportFormat::Jpeg, 1.0)
        .await
        .expect("high");
    assert!(
        low.bytes.len() < high.bytes.len(),
        "low {} >= high {}",
        low.bytes.len(),
        high.bytes.len()
    );
}

// ==========================================================================
// Content
// ==========================================================================

#[tokio::test]
async fn test_background_color_fills_canvas() {
    let mut session = session(40.0, 40.0);
    session.set_background(Background::solid(Color::rgb(255, 0, 0)));
    let image = session
        .export_canvas(ExportFormat::Png, 1.0)
        .await
        .expect("export");
    assert_eq!(pixel(&image, 0, 0), [255, 0, 0, 255]);
    assert_eq!(pixel(&image, 39, 39), [255, 0, 0, 255]);
}

#[tokio::test]
async fn test_image_drawn_centered() {
    let mut session = session(40.0, 40.0);
    session
        .add_image(&solid_png_uri(10, 10, [0, 0, 255, 255]))
        .await
        .expect("image");

    let image = session
        .export_canvas(ExportFormat::Png, 1.0)
        .await
        .expect("export");
    assert_eq!(pixel(&image, 20, 20), [0, 0, 255, 255]);
    assert_eq!(pixel(&image, 5, 5), [255, 255, 255, 255]);
}

#[tokio::test]
async fn test_scale_applies_to_exported_image() {
    let mut session = session(40.0, 40.0);
    let id = session
        .add_image(&solid_png_uri(10, 10, [0, 0, 255, 255]))
        .await
        .expect("image");
    session.transform_object(
        id,
        &TransformDelta {
            left: Some(0.0),
            top: Some(0.0),
            scale_x: Some(2.0),
            scale_y: Some(2.0),
            angle: None,
        },
    );

    let image = session
        .export_canvas(ExportFormat::Png, 1.0)
        .await
        .expect("export");
    assert_eq!(pixel(&image, 15, 15), [0, 0, 255, 255]);
    assert_eq!(pixel(&image, 30, 30), [255, 255, 255, 255]);
}

#[tokio::test]
async fn test_overlays_never_exported() {
    let mut session = session(60.0, 60.0);
    let id = session
        .add_image(&solid_png_uri(20, 20, [0, 128, 0, 255]))
        .await
        .expect("image");
    session
        .add_text("x", &TextOptions::at(2.0, 2.0))
        .expect("text");

    let plain = session
        .export_canvas(ExportFormat::Png, 1.0)
        .await
        .expect("plain");

    session.select_object(id);
    session.handle_event(CanvasEvent::HoverEnter { id });
    session.handle_event(CanvasEvent::DragStart { id });
    assert!(session.interaction().show_guides());

    let busy = session
        .export_canvas(ExportFormat::Png, 1.0)
        .await
        .expect("busy");
    assert_eq!(plain.bytes, busy.bytes);
}

// ==========================================================================
// Validation
// ==========================================================================

#[tokio::test]
async fn test_out_of_range_options_rejected() {
    let mut session = session(10.0, 10.0);
    for options in [
        ExportOptions::new(ExportFormat::Jpeg, 1.01),
        ExportOptions {
            pixel_ratio: 6,
            ..ExportOptions::default()
        },
    ] {
        let err = session.export_with(options).await.expect_err("invalid");
        assert!(matches!(err, RenderError::Validation(_)), "{err}");
    }
}

#[tokio::test]
async fn test_empty_canvas_fails_export() {
    let mut session = session(0.0, 0.0);
    let err = session
        .export_canvas(ExportFormat::Png, 1.0)
        .await
        .expect_err("no area");
    assert!(matches!(err, RenderError::Export(_)));
}
