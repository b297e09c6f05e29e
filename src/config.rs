//! Watermark configuration types.
//!
//! [`WatermarkConfig`] is a plain value consumed once per render call.
//! Channel and opacity values are clamped on construction so a config
//! handed to the renderer is always in range.
//!
//! [`Color`] and [`Position`] carry the serde representations used by the
//! template format: colors are stored as a 3-element integer array (a
//! 4-element RGBA array is accepted on read), positions as either a named
//! anchor string or a 2-element `[x, y]` array.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// An RGB color, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Create a color from its channels.
    #[must_use]
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// White.
    #[must_use]
    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Black.
    #[must_use]
    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.r, self.g, self.b].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let channels = Vec::<i64>::deserialize(deserializer)?;
        if channels.len() != 3 && channels.len() != 4 {
            return Err(D::Error::invalid_length(
                channels.len(),
                &"a 3- or 4-element color array",
            ));
        }
        let clamp = |v: i64| v.clamp(0, 255) as u8;
        Ok(Self::new(
            clamp(channels[0]),
            clamp(channels[1]),
            clamp(channels[2]),
        ))
    }
}

/// Parse a hex color string into RGB components.
///
/// Supports both `#RGB` and `#RRGGBB` formats.
///
/// # Errors
///
/// Returns [`Error::InvalidColor`] if the string is not a valid hex color.
pub fn parse_hex_color(hex: &str) -> Result<Color, Error> {
    let digits = hex
        .strip_prefix('#')
        .ok_or_else(|| Error::InvalidColor(format!("'{hex}' must start with '#'")))?;

    let channel = |s: &str| {
        u8::from_str_radix(s, 16).map_err(|_| Error::InvalidColor(format!("'{hex}' has an invalid hex digit")))
    };

    match digits.len() {
        3 => {
            // Each digit doubles: 0xF -> 0xFF
            let r = channel(&digits[0..1])?;
            let g = channel(&digits[1..2])?;
            let b = channel(&digits[2..3])?;
            Ok(Color::new(r * 17, g * 17, b * 17))
        }
        6 => Ok(Color::new(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        n => Err(Error::InvalidColor(format!(
            "'{hex}' must be #RGB or #RRGGBB, got {n} digits"
        ))),
    }
}

/// One of the nine named placement anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Top-left corner.
    TopLeft,
    /// Top edge, horizontally centered.
    TopCenter,
    /// Top-right corner.
    TopRight,
    /// Left edge, vertically centered.
    MiddleLeft,
    /// Exact center.
    Center,
    /// Right edge, vertically centered.
    MiddleRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom edge, horizontally centered.
    BottomCenter,
    /// Bottom-right corner.
    BottomRight,
}

impl Anchor {
    /// Look up an anchor by its wire name (e.g. `"top_left"`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "top_left" => Some(Self::TopLeft),
            "top_center" => Some(Self::TopCenter),
            "top_right" => Some(Self::TopRight),
            "middle_left" => Some(Self::MiddleLeft),
            "center" => Some(Self::Center),
            "middle_right" => Some(Self::MiddleRight),
            "bottom_left" => Some(Self::BottomLeft),
            "bottom_center" => Some(Self::BottomCenter),
            "bottom_right" => Some(Self::BottomRight),
            _ => None,
        }
    }

    /// The wire name of this anchor.
    #[must_use]
    pub fn as_name(self) -> &'static str {
        match self {
            Self::TopLeft => "top_left",
            Self::TopCenter => "top_center",
            Self::TopRight => "top_right",
            Self::MiddleLeft => "middle_left",
            Self::Center => "center",
            Self::MiddleRight => "middle_right",
            Self::BottomLeft => "bottom_left",
            Self::BottomCenter => "bottom_center",
            Self::BottomRight => "bottom_right",
        }
    }
}

/// Where the watermark goes: a named anchor or an explicit pixel offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// One of the nine named anchors.
    Anchor(Anchor),
    /// An explicit top-left origin in pixels. May be negative.
    Offset {
        /// Horizontal offset from the left edge.
        x: i64,
        /// Vertical offset from the top edge.
        y: i64,
    },
}

impl Position {
    /// Parse a position from its wire form: an anchor name or `"x,y"`.
    ///
    /// Unknown anchor names yield `None`; callers that need the decode-side
    /// fall-back-to-center behavior get it from the template codec instead.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(anchor) = Anchor::from_name(s) {
            return Some(Self::Anchor(anchor));
        }
        let (x, y) = s.split_once(',')?;
        let x = x.trim().parse().ok()?;
        let y = y.trim().parse().ok()?;
        Some(Self::Offset { x, y })
    }
}

/// Serde shape for [`Position`]: a string or a 2-element array.
#[derive(Deserialize)]
#[serde(untagged)]
enum PositionRepr {
    Named(String),
    Offset([i64; 2]),
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Self::Anchor(anchor) => serializer.serialize_str(anchor.as_name()),
            Self::Offset { x, y } => [x, y].serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match PositionRepr::deserialize(deserializer)? {
            // Unknown anchor names fall back to center rather than failing.
            PositionRepr::Named(name) => {
                Self::Anchor(Anchor::from_name(&name).unwrap_or(Anchor::Center))
            }
            PositionRepr::Offset([x, y]) => Self::Offset { x, y },
        })
    }
}

/// All configurable attributes of a text watermark.
///
/// A config is built once, handed to a render call, and carries no state
/// beyond that call. Out-of-range opacity is clamped by the setter and
/// again before alpha derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkConfig {
    /// The watermark text. Empty text fails the render call.
    pub text: String,
    /// Requested font family name (e.g. `"SimHei"`).
    pub font_name: String,
    /// Font size in pixels.
    pub font_size: u32,
    /// Prefer a bold face if the family has one.
    pub font_bold: bool,
    /// Prefer an italic face if the family has one.
    pub font_italic: bool,
    /// Text color.
    pub color: Color,
    /// Opacity in percent, 0-100.
    pub opacity: u8,
    /// Placement on the image.
    pub position: Position,
    /// Rotation in degrees, counter-clockwise for positive values.
    pub rotation: i32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_name: "SimHei".to_string(),
            font_size: 24,
            font_bold: false,
            font_italic: false,
            color: Color::white(),
            opacity: 50,
            position: Position::Anchor(Anchor::Center),
            rotation: 0,
        }
    }
}

impl WatermarkConfig {
    /// Set the watermark text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the font family, size, and style hints.
    #[must_use]
    pub fn with_font(mut self, name: impl Into<String>, size: u32, bold: bool, italic: bool) -> Self {
        self.font_name = name.into();
        self.font_size = size.max(1);
        self.font_bold = bold;
        self.font_italic = italic;
        self
    }

    /// Set the text color.
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set the opacity in percent, clamped to 0-100.
    #[must_use]
    pub fn with_opacity(mut self, percent: i64) -> Self {
        self.opacity = percent.clamp(0, 100) as u8;
        self
    }

    /// Set the placement.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Set the rotation in degrees.
    #[must_use]
    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation = degrees;
        self
    }

    /// The alpha value derived from `opacity`: `round(opacity * 2.55)`,
    /// clamped to 0-255.
    #[must_use]
    pub fn alpha(&self) -> u8 {
        (f32::from(self.opacity.min(100)) * 2.55).round().clamp(0.0, 255.0) as u8
    }
}
