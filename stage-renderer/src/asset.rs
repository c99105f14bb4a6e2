//! Image payload handling.
//!
//! Validates and decodes image bytes into [`ImageAsset`]s, parses data URIs,
//! and re-encodes bitmaps as PNG for embedding in the export document.

use base64::Engine;
use image::ImageEncoder;
use stage_core::ImageAsset;

use crate::error::{RenderError, RenderResult};

/// Largest accepted encoded payload (10 MB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/webp" => Self::WebP,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }

    /// Whether images of this format may be placed on the canvas.
    #[must_use]
    pub fn is_supported(self) -> bool {
        self != Self::Unknown
    }
}

/// Constraints applied to every image payload before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetLimits {
    /// Largest accepted encoded size in bytes.
    pub max_bytes: usize,
}

impl Default for AssetLimits {
    fn default() -> Self {
        Self {
            max_bytes: MAX_IMAGE_BYTES,
        }
    }
}

impl AssetLimits {
    /// Check size, declared type and magic bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::AssetLoad`] for oversize, empty or
    /// unsupported payloads.
    pub fn validate(&self, bytes: &[u8], declared_mime: Option<&str>) -> RenderResult<ImageFormat> {
        if bytes.is_empty() {
            return Err(RenderError::AssetLoad("Image payload is empty".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(RenderError::AssetLoad(format!(
                "Image payload is {} bytes, limit is {}",
                bytes.len(),
                self.max_bytes
            )));
        }
        if let Some(mime) = declared_mime.filter(|m| !m.is_empty()) {
            if !ImageFormat::from_mime(mime).is_supported() {
                return Err(RenderError::AssetLoad(format!(
                    "Unsupported image type: {mime}"
                )));
            }
        }

        let format = ImageFormat::from_magic_bytes(bytes);
        if !format.is_supported() {
            return Err(RenderError::AssetLoad(
                "Payload is not a PNG, JPEG or WebP image".to_string(),
            ));
        }
        Ok(format)
    }
}

/// A parsed `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Declared MIME type, possibly empty.
    pub mime: String,
    /// Decoded payload.
    pub bytes: Vec<u8>,
}

/// Parse a data URI such as `data:image/png;base64,iVBORw0KGgo...`.
///
/// # Errors
///
/// Returns an error if the URI is malformed or its payload cannot be decoded.
pub fn parse_data_uri(uri: &str) -> RenderResult<DataUri> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::AssetLoad("Not a data URI".to_string()))?;

    // Find the comma separating metadata from data
    let (metadata, encoded_data) = uri_data
        .split_once(',')
        .ok_or_else(|| RenderError::AssetLoad("Invalid data URI: missing comma".to_string()))?;

    let is_base64 = metadata.contains(";base64");
    let mime = metadata.split(';').next().unwrap_or_default().to_string();

    let bytes = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(encoded_data.trim())
            .map_err(|e| RenderError::AssetLoad(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(encoded_data)?
    };

    Ok(DataUri { mime, bytes })
}

/// Percent-decode a URL fragment.
fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let mut result = Vec::with_capacity(input.len());
    let mut bytes = input.bytes();

    while let Some(b) = bytes.next() {
        if b == b'%' {
            let hex: Vec<u8> = bytes.by_ref().take(2).collect();
            let byte = std::str::from_utf8(&hex)
                .ok()
                .filter(|h| h.len() == 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| RenderError::AssetLoad("Invalid URL encoding".to_string()))?;
            result.push(byte);
        } else {
            result.push(b);
        }
    }

    Ok(result)
}

/// Decode raw image bytes into an RGBA bitmap.
///
/// # Errors
///
/// Returns an error if the image cannot be decoded.
pub fn decode_image(data: &[u8]) -> RenderResult<ImageAsset> {
    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::AssetLoad(format!("Failed to decode image: {e}")))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::debug!("Decoded {width}x{height} image");
    Ok(ImageAsset::from_rgba(width, height, rgba.into_raw())?)
}

/// Encode a bitmap as a `data:image/png;base64,...` URI.
///
/// # Errors
///
/// Returns an error if PNG encoding fails.
pub fn png_data_uri(asset: &ImageAsset) -> RenderResult<String> {
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            asset.pixels(),
            asset.width(),
            asset.height(),
            image::ColorType::Rgba8.into(),
        )
        .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&buf);
    Ok(format!("data:image/png;base64,{encoded}"))
}
