//! Hex colors used for text fills and backgrounds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CanvasError, CanvasResult};

/// An opaque sRGB color.
///
/// Parsed from `#rgb` or `#rrggbb` (case-insensitive) and always displayed
/// as lowercase `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Pure black, the default text fill.
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Pure white, the default background.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Background swatches offered by the color picker.
    pub const PRESETS: [Self; 12] = [
        Self::rgb(0xff, 0xff, 0xff),
        Self::rgb(0x00, 0x00, 0x00),
        Self::rgb(0xf3, 0xf4, 0xf6),
        Self::rgb(0xef, 0x44, 0x44),
        Self::rgb(0x3b, 0x82, 0xf6),
        Self::rgb(0x10, 0xb9, 0x81),
        Self::rgb(0xf5, 0x9e, 0x0b),
        Self::rgb(0x8b, 0x5c, 0xf6),
        Self::rgb(0xec, 0x48, 0x99),
        Self::rgb(0x06, 0xb6, 0xd4),
        Self::rgb(0x84, 0xcc, 0x16),
        Self::rgb(0xf9, 0x73, 0x16),
    ];

    /// Build a color from its channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rgb` or `#rrggbb` hex string.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] if the string is not a hex color.
    pub fn parse_hex(input: &str) -> CanvasResult<Self> {
        let invalid = || CanvasError::Validation(format!("Malformed hex color: {input:?}"));

        let digits = input.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        match digits.len() {
            3 => {
                let mut channels = [0u8; 3];
                for (slot, c) in channels.iter_mut().zip(digits.chars()) {
                    let nibble = c.to_digit(16).ok_or_else(invalid)?;
                    // 0xf -> 0xff
                    *slot = u8::try_from(nibble * 17).map_err(|_| invalid())?;
                }
                Ok(Self::rgb(channels[0], channels[1], channels[2]))
            }
            6 => {
                let channel = |range: std::ops::Range<usize>| {
                    u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
                };
                Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
            }
            _ => Err(invalid()),
        }
    }

    /// Lowercase `#rrggbb` form.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels as an opaque RGBA quadruple.
    #[must_use]
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = CanvasError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}
