//! Pixel-level compositing: glyph rasterization, alpha blending, and
//! bounds-expanding rotation.
//!
//! Blending is Porter-Duff "over": `out_a = top_a + bottom_a * (1 - top_a)`,
//! with channels un-premultiplied. Rotation resamples bilinearly into a
//! destination sized to the rotated bounding box, so glyphs are never
//! clipped; positive angles rotate counter-clockwise.

use ab_glyph::{point, Font, GlyphId, ScaleFont};
use image::{Rgba, RgbaImage};

use crate::config::Color;
use crate::font::ResolvedFont;

/// Alpha below which an output pixel is treated as fully transparent.
const ALPHA_EPSILON: f32 = 0.001;

/// Draw `text` onto `canvas` with its box's top-left at `origin`.
///
/// Glyph coverage is scaled by `alpha` and blended over whatever is
/// already on the canvas. Pixels outside the canvas are discarded, so
/// negative origins are fine.
pub(crate) fn draw_text(
    canvas: &mut RgbaImage,
    font: &ResolvedFont,
    text: &str,
    origin: (i64, i64),
    color: Color,
    alpha: u8,
) {
    let scaled = font.font().as_scaled(font.scale());
    let canvas_w = i64::from(canvas.width());
    let canvas_h = i64::from(canvas.height());

    let baseline = origin.1 as f32 + scaled.ascent();
    let mut cursor = origin.0 as f32;
    let mut prev: Option<GlyphId> = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            cursor += scaled.kern(prev, id);
        }

        let glyph = id.with_scale_and_position(font.scale(), point(cursor, baseline));
        if let Some(outlined) = font.font().outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = i64::from(px) + bounds.min.x as i64;
                let y = i64::from(py) + bounds.min.y as i64;
                if x < 0 || y < 0 || x >= canvas_w || y >= canvas_h {
                    return;
                }
                let a = (coverage * f32::from(alpha)).round().clamp(0.0, 255.0) as u8;
                if a == 0 {
                    return;
                }
                let src = Rgba([color.r, color.g, color.b, a]);
                let dst = *canvas.get_pixel(x as u32, y as u32);
                canvas.put_pixel(x as u32, y as u32, blend_pixel(dst, src));
            });
        }

        cursor += scaled.h_advance(id);
        prev = Some(id);
    }
}

/// Blend `top` over `bottom` with the Porter-Duff "over" operator.
pub(crate) fn blend_pixel(bottom: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    let top_a = f32::from(top[3]) / 255.0;
    let bottom_a = f32::from(bottom[3]) / 255.0;
    let out_a = top_a + bottom_a * (1.0 - top_a);

    if out_a < ALPHA_EPSILON {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |t: u8, b: u8| -> u8 {
        let t = f32::from(t) / 255.0;
        let b = f32::from(b) / 255.0;
        let v = (t * top_a + b * bottom_a * (1.0 - top_a)) / out_a;
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(top[0], bottom[0]),
        channel(top[1], bottom[1]),
        channel(top[2], bottom[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Blend `layer` onto `target` with its top-left at `(ox, oy)`.
///
/// The visible region is clipped to the target; fully transparent layer
/// pixels are skipped.
pub(crate) fn overlay_at(target: &mut RgbaImage, layer: &RgbaImage, ox: i64, oy: i64) {
    let target_w = i64::from(target.width());
    let target_h = i64::from(target.height());
    let layer_w = i64::from(layer.width());
    let layer_h = i64::from(layer.height());

    let x_start = ox.max(0);
    let y_start = oy.max(0);
    let x_end = (ox + layer_w).min(target_w);
    let y_end = (oy + layer_h).min(target_h);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let lx = (tx - ox) as u32;
            let ly = (ty - oy) as u32;
            let top = *layer.get_pixel(lx, ly);
            if top[3] == 0 {
                continue;
            }
            let bottom = *target.get_pixel(tx as u32, ty as u32);
            target.put_pixel(tx as u32, ty as u32, blend_pixel(bottom, top));
        }
    }
}

/// Rotate an image by `degrees`, growing the output to fit the rotated
/// content (no clipping). Positive angles rotate counter-clockwise; the
/// angle is effectively taken mod 360.
pub(crate) fn rotate_expand(src: &RgbaImage, degrees: f32) -> RgbaImage {
    let radians = -degrees.to_radians();
    let cos = radians.cos();
    let sin = radians.sin();

    let src_w = src.width() as f32;
    let src_h = src.height() as f32;
    let cx = src_w / 2.0;
    let cy = src_h / 2.0;

    // Bounding box of the rotated corners.
    let corners = [
        (-cx, -cy),
        (src_w - cx, -cy),
        (-cx, src_h - cy),
        (src_w - cx, src_h - cy),
    ];
    let mut min_x = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for (x, y) in corners {
        let rx = x * cos - y * sin;
        let ry = x * sin + y * cos;
        min_x = min_x.min(rx);
        max_x = max_x.max(rx);
        min_y = min_y.min(ry);
        max_y = max_y.max(ry);
    }

    let dst_w = ((max_x - min_x).ceil() as u32).max(1);
    let dst_h = ((max_y - min_y).ceil() as u32).max(1);
    let mut dst = RgbaImage::new(dst_w, dst_h);

    let dst_cx = dst_w as f32 / 2.0;
    let dst_cy = dst_h as f32 / 2.0;

    // Inverse mapping: walk destination pixels, sample the source.
    let inv_cos = (-radians).cos();
    let inv_sin = (-radians).sin();

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let rx = dx as f32 - dst_cx;
            let ry = dy as f32 - dst_cy;
            let sx = rx * inv_cos - ry * inv_sin + cx;
            let sy = rx * inv_sin + ry * inv_cos + cy;

            if sx >= 0.0 && sx < src_w - 1.0 && sy >= 0.0 && sy < src_h - 1.0 {
                dst.put_pixel(dx, dy, sample_bilinear(src, sx, sy));
            }
        }
    }

    dst
}

/// Bilinear sample at a fractional source coordinate.
fn sample_bilinear(src: &RgbaImage, sx: f32, sy: f32) -> Rgba<u8> {
    let x0 = sx.floor() as u32;
    let y0 = sy.floor() as u32;
    let fx = sx - x0 as f32;
    let fy = sy - y0 as f32;

    let p00 = src.get_pixel(x0, y0);
    let p10 = src.get_pixel(x0 + 1, y0);
    let p01 = src.get_pixel(x0, y0 + 1);
    let p11 = src.get_pixel(x0 + 1, y0 + 1);

    let mut out = [0u8; 4];
    for (ch, slot) in out.iter_mut().enumerate() {
        let v = f32::from(p00[ch]) * (1.0 - fx) * (1.0 - fy)
            + f32::from(p10[ch]) * fx * (1.0 - fy)
            + f32::from(p01[ch]) * (1.0 - fx) * fy
            + f32::from(p11[ch]) * fx * fy;
        *slot = v.clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_opaque_top_replaces_bottom() {
        let bottom = Rgba([10, 20, 30, 255]);
        let top = Rgba([200, 100, 50, 255]);
        assert_eq!(blend_pixel(bottom, top), top);
    }

    #[test]
    fn blend_transparent_top_keeps_bottom() {
        let bottom = Rgba([10, 20, 30, 255]);
        let top = Rgba([200, 100, 50, 0]);
        assert_eq!(blend_pixel(bottom, top), bottom);
    }

    #[test]
    fn blend_half_alpha_mixes_channels() {
        let bottom = Rgba([0, 0, 0, 255]);
        let top = Rgba([255, 255, 255, 128]);
        let out = blend_pixel(bottom, top);
        // Roughly 50% gray over black, alpha stays full.
        assert!(out[0] > 120 && out[0] < 135);
        assert_eq!(out[3], 255);
    }

    #[test]
    fn blend_both_transparent_is_transparent() {
        let out = blend_pixel(Rgba([50, 60, 70, 0]), Rgba([1, 2, 3, 0]));
        assert_eq!(out, Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn overlay_clips_to_target_bounds() {
        let mut target = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        let layer = RgbaImage::from_pixel(6, 6, Rgba([255, 0, 0, 255]));

        // Half the layer hangs off the top-left corner.
        overlay_at(&mut target, &layer, -3, -3);

        assert_eq!(*target.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*target.get_pixel(2, 2), Rgba([255, 0, 0, 255]));
        assert_eq!(*target.get_pixel(3, 3), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn overlay_fully_outside_changes_nothing() {
        let mut target = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        let before = target.clone();
        let layer = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));

        overlay_at(&mut target, &layer, 100, 100);
        overlay_at(&mut target, &layer, -50, -50);

        assert_eq!(target, before);
    }

    #[test]
    fn rotate_90_swaps_dimensions() {
        let src = RgbaImage::from_pixel(40, 20, Rgba([255, 255, 255, 255]));
        let rotated = rotate_expand(&src, 90.0);
        // Within a pixel of the swapped size.
        assert!(rotated.width().abs_diff(20) <= 1, "width {}", rotated.width());
        assert!(rotated.height().abs_diff(40) <= 1, "height {}", rotated.height());
    }

    #[test]
    fn rotate_45_expands_bounds() {
        let src = RgbaImage::from_pixel(40, 40, Rgba([255, 255, 255, 255]));
        let rotated = rotate_expand(&src, 45.0);
        // 40 * sqrt(2) ~= 57
        assert!(rotated.width() >= 56 && rotated.width() <= 58);
        assert!(rotated.height() >= 56 && rotated.height() <= 58);
    }

    #[test]
    fn rotate_keeps_content_visible() {
        let mut src = RgbaImage::new(30, 30);
        for x in 10..20 {
            for y in 10..20 {
                src.put_pixel(x, y, Rgba([0, 255, 0, 255]));
            }
        }
        let rotated = rotate_expand(&src, 33.0);
        let visible = rotated.pixels().filter(|p| p[3] > 0).count();
        assert!(visible > 0, "rotated content disappeared");
    }

    #[test]
    fn rotate_full_turn_is_near_identity_size() {
        let src = RgbaImage::from_pixel(25, 15, Rgba([1, 2, 3, 255]));
        let rotated = rotate_expand(&src, 360.0);
        assert!(rotated.width().abs_diff(25) <= 1);
        assert!(rotated.height().abs_diff(15) <= 1);
    }
}
