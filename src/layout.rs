//! Text measurement and anchor-point computation.
//!
//! Placement works on top-left origins. Named anchors keep a fixed
//! 10-pixel margin from the edges they touch; centered axes use floor
//! division, so centering may be off by one pixel for odd differences.
//! That rounding matches the original tool and is relied on by saved
//! templates.
//!
//! The rotated path re-keys the same anchor table to the rotated bounding
//! box and, under [`AnchorMode::Legacy`], applies no edge margin at all.
//! [`AnchorMode::Strict`] reconciles the two paths by using the standard
//! margin in both.

use ab_glyph::{Font, GlyphId, ScaleFont};

use crate::config::{Anchor, Position};
use crate::font::ResolvedFont;

/// Margin in pixels kept between a named anchor and the image edge.
pub const EDGE_MARGIN: i64 = 10;

/// Selects between the historical and the reconciled anchor behavior for
/// the rotated path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorMode {
    /// Rotated placement uses the anchor table with no edge margin; this
    /// is the original tool's behavior and the default.
    #[default]
    Legacy,
    /// Rotated placement uses the same 10-pixel margin as the unrotated
    /// path.
    Strict,
}

/// Measure rendered text from real glyph metrics.
///
/// Width is the kerned sum of glyph advances; height is the scaled
/// ascent-to-descent span. A fixed-width estimate would be wrong for
/// variable-width and CJK glyphs, so the font is consulted per glyph.
#[must_use]
pub fn measure_text(text: &str, font: &ResolvedFont) -> (u32, u32) {
    let scaled = font.font().as_scaled(font.scale());

    let mut width = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }

    (width.ceil().max(0.0) as u32, scaled.height().ceil().max(0.0) as u32)
}

/// Top-left origin for a box of `box_size` anchored inside `img_size`.
///
/// Centered axes compute `(image - box).div_euclid(2)`: floor division,
/// matching the original's `//` operator, including for boxes larger than
/// the image (negative origins).
#[must_use]
pub fn anchor_point(
    anchor: Anchor,
    img_size: (u32, u32),
    box_size: (u32, u32),
    margin: i64,
) -> (i64, i64) {
    let img_w = i64::from(img_size.0);
    let img_h = i64::from(img_size.1);
    let box_w = i64::from(box_size.0);
    let box_h = i64::from(box_size.1);
    let center_x = (img_w - box_w).div_euclid(2);
    let center_y = (img_h - box_h).div_euclid(2);

    match anchor {
        Anchor::TopLeft => (margin, margin),
        Anchor::TopCenter => (center_x, margin),
        Anchor::TopRight => (img_w - box_w - margin, margin),
        Anchor::MiddleLeft => (margin, center_y),
        Anchor::Center => (center_x, center_y),
        Anchor::MiddleRight => (img_w - box_w - margin, center_y),
        Anchor::BottomLeft => (margin, img_h - box_h - margin),
        Anchor::BottomCenter => (center_x, img_h - box_h - margin),
        Anchor::BottomRight => (img_w - box_w - margin, img_h - box_h - margin),
    }
}

/// Placement of the unrotated text box: explicit offsets verbatim, named
/// anchors with the standard edge margin.
#[must_use]
pub fn placement(position: Position, img_size: (u32, u32), text_size: (u32, u32)) -> (i64, i64) {
    match position {
        Position::Offset { x, y } => (x, y),
        Position::Anchor(anchor) => anchor_point(anchor, img_size, text_size, EDGE_MARGIN),
    }
}

/// Paste origin for the rotated bounding box.
///
/// Explicit offsets are used verbatim here too, which places the rotated
/// box (not the text) at the given point; visually different from the
/// unrotated path, and preserved that way under [`AnchorMode::Legacy`].
#[must_use]
pub fn rotated_placement(
    position: Position,
    img_size: (u32, u32),
    rotated_size: (u32, u32),
    mode: AnchorMode,
) -> (i64, i64) {
    let margin = match mode {
        AnchorMode::Legacy => 0,
        AnchorMode::Strict => EDGE_MARGIN,
    };
    match position {
        Position::Offset { x, y } => (x, y),
        Position::Anchor(anchor) => anchor_point(anchor, img_size, rotated_size, margin),
    }
}
