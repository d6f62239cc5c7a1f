// ============================================================================
// ADJUSTMENT HELPERS: per-pixel transforms and HSL colour space
// ============================================================================
//
// Transforms run row-parallel via rayon and always produce a new buffer, so
// callers can keep the original for history.
// ============================================================================

use image::Rgba;
use rayon::prelude::*;

use crate::canvas::PixelBuffer;

/// Apply a per-pixel transform to a copy of `source`.
/// `transform` receives (r, g, b, a) as f32 in 0..255 and returns the same.
pub fn apply_pixel_transform<F>(source: &PixelBuffer, transform: F) -> PixelBuffer
where
    F: Fn(f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let w = source.width() as usize;
    let h = source.height() as usize;
    let mut out = source.clone();
    if w == 0 || h == 0 {
        return out;
    }

    let stride = w * 4;
    out.as_raw_mut().par_chunks_mut(stride).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            let (nr, ng, nb, na) = transform(px[0] as f32, px[1] as f32, px[2] as f32, px[3] as f32);
            px[0] = nr.round().clamp(0.0, 255.0) as u8;
            px[1] = ng.round().clamp(0.0, 255.0) as u8;
            px[2] = nb.round().clamp(0.0, 255.0) as u8;
            px[3] = na.round().clamp(0.0, 255.0) as u8;
        }
    });
    out
}

/// Shift a colour's HSL lightness by `delta` (-1..1), clamped.  Alpha is kept.
pub fn shift_lightness(color: Rgba<u8>, delta: f32) -> Rgba<u8> {
    let [r, g, b, a] = color.0;
    let (h, s, l) = rgb_to_hsl(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let (nr, ng, nb) = hsl_to_rgb(h, s, (l + delta).clamp(0.0, 1.0));
    Rgba([to_u8(nr), to_u8(ng), to_u8(nb), a])
}

/// HSL lightness (0..1) of a colour.
pub fn lightness(color: Rgba<u8>) -> f32 {
    let [r, g, b, _] = color.0;
    rgb_to_hsl(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0).2
}

#[inline]
pub(crate) fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

// ============================================================================
// COLOR SPACE HELPERS
// ============================================================================

/// RGB (0..1) → HSL (H: 0..1, S: 0..1, L: 0..1)
pub fn rgb_to_hsl(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < 1e-6 {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };

    let h = if (max - r).abs() < 1e-6 {
        let mut h = (g - b) / d;
        if h < 0.0 { h += 6.0; }
        h / 6.0
    } else if (max - g).abs() < 1e-6 {
        ((b - r) / d + 2.0) / 6.0
    } else {
        ((r - g) / d + 4.0) / 6.0
    };

    (h, s, l)
}

/// HSL (H: 0..1, S: 0..1, L: 0..1) → RGB (0..1)
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    if s.abs() < 1e-6 {
        return (l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    (r, g, b)
}

pub fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 { t += 1.0; }
    if t > 1.0 { t -= 1.0; }
    if t < 1.0 / 6.0 { return p + (q - p) * 6.0 * t; }
    if t < 1.0 / 2.0 { return q; }
    if t < 2.0 / 3.0 { return p + (q - p) * (2.0 / 3.0 - t) * 6.0; }
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn hsl_of_primaries() {
        let (h, s, l) = rgb_to_hsl(1.0, 0.0, 0.0);
        assert_abs_diff_eq!(h, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(s, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(l, 0.5, epsilon = 1e-6);

        let (h, _, _) = rgb_to_hsl(0.0, 1.0, 0.0);
        assert_abs_diff_eq!(h, 1.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn hsl_round_trip_preserves_bytes() {
        for color in [[12u8, 200, 90], [255, 255, 255], [0, 0, 0], [128, 64, 32]] {
            let (h, s, l) = rgb_to_hsl(color[0] as f32 / 255.0, color[1] as f32 / 255.0, color[2] as f32 / 255.0);
            let (r, g, b) = hsl_to_rgb(h, s, l);
            assert_eq!([to_u8(r), to_u8(g), to_u8(b)], color);
        }
    }

    #[test]
    fn shift_lightness_clamps() {
        let white = shift_lightness(Rgba([200, 200, 200, 77]), 1.0);
        assert_eq!(white, Rgba([255, 255, 255, 77]));
        let black = shift_lightness(Rgba([10, 40, 90, 255]), -1.0);
        assert_eq!(black, Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn pixel_transform_leaves_source_untouched() {
        let src = PixelBuffer::new_filled(3, 2, Rgba([10, 20, 30, 40]));
        let out = apply_pixel_transform(&src, |r, g, b, a| (255.0 - r, g, b, a));
        assert_eq!(src.get(0, 0), Ok(Rgba([10, 20, 30, 40])));
        assert_eq!(out.get(2, 1), Ok(Rgba([245, 20, 30, 40])));
    }
}
