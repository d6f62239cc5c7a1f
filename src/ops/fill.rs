// ============================================================================
// BUCKET FILL: bounded flood fill and global colour replace
// ============================================================================
//
// Matching is exact: a texel is replaced only when all four channels equal the
// seed texel.  Camo and blend vary each replaced texel through an injected
// `RandomSource`, so tests can seed it and interactive use can seed from time.
// ============================================================================

use image::Rgba;

use crate::canvas::PixelBuffer;
use crate::error::EditError;
use crate::ops::adjustments::shift_lightness;

/// Lightness spread used when the blend palette is derived from the target.
const DERIVED_BLEND_SPREAD: f32 = 0.15;

// ============================================================================
// RANDOM SOURCE
// ============================================================================

pub trait RandomSource {
    fn next_u32(&mut self) -> u32;

    /// Uniform in [0, 1).
    fn next_f32(&mut self) -> f32 {
        (self.next_u32() & 0x00FF_FFFF) as f32 / 16_777_216.0
    }

    /// Uniform in [lo, hi].
    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }

    /// Uniform index into a slice of `len` items.  `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        (self.next_f32() * len as f32) as usize % len.max(1)
    }
}

/// Counter-based integer-hash generator.  Same seed, same sequence.
#[derive(Clone, Debug)]
pub struct HashRng {
    seed: u32,
    counter: u32,
}

impl HashRng {
    pub fn new(seed: u32) -> Self {
        Self { seed, counter: 0 }
    }

    pub fn from_time() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
            .unwrap_or(0x5EED);
        Self::new(nanos)
    }
}

impl RandomSource for HashRng {
    fn next_u32(&mut self) -> u32 {
        self.counter = self.counter.wrapping_add(1);
        hash_u32(self.counter.wrapping_mul(374761393).wrapping_add(self.seed))
    }
}

#[inline]
fn hash_u32(mut x: u32) -> u32 {
    x = x.wrapping_mul(0x9E3779B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;
    x
}

// ============================================================================
// REQUEST / PALETTE
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillRequest {
    pub x: i64,
    pub y: i64,
    pub color: Rgba<u8>,
    /// Replace every matching texel instead of the connected area only.
    pub replace_all: bool,
    /// Per-texel lightness jitter of ± this amount.
    pub camo: Option<f32>,
    pub blend: bool,
}

impl FillRequest {
    pub fn bounded(x: i64, y: i64, color: Rgba<u8>) -> Self {
        Self {
            x,
            y,
            color,
            replace_all: false,
            camo: None,
            blend: false,
        }
    }

    pub fn global(x: i64, y: i64, color: Rgba<u8>) -> Self {
        Self {
            replace_all: true,
            ..Self::bounded(x, y, color)
        }
    }
}

/// Colours the blend modifier picks from.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct BlendPalette {
    /// Fixed colours.  When empty, variants of the fill colour are used.
    pub colors: Vec<Rgba<u8>>,
    /// Number of derived lightness variants.
    pub steps: u32,
}

impl BlendPalette {
    pub fn new(colors: Vec<Rgba<u8>>, steps: u32) -> Self {
        Self { colors, steps }
    }

    pub fn colors_for(&self, target: Rgba<u8>) -> Vec<Rgba<u8>> {
        if !self.colors.is_empty() {
            return self.colors.clone();
        }
        let steps = self.steps.max(1);
        if steps == 1 {
            return vec![target];
        }
        (0..steps)
            .map(|i| {
                let t = i as f32 / (steps - 1) as f32;
                shift_lightness(target, (t * 2.0 - 1.0) * DERIVED_BLEND_SPREAD)
            })
            .collect()
    }
}

// ============================================================================
// FILL
// ============================================================================

/// Fill `buffer` per `request`, returning the new buffer.
pub fn fill(
    buffer: &PixelBuffer,
    request: &FillRequest,
    palette: &BlendPalette,
    rng: &mut dyn RandomSource,
) -> Result<PixelBuffer, EditError> {
    let seed_color = buffer.get(request.x, request.y)?;
    // Modifiers never repaint a region that already has the fill colour.
    if seed_color == request.color {
        return Err(EditError::NoOpEdit);
    }

    let mask = if request.replace_all {
        global_mask(buffer, seed_color)
    } else {
        flood_mask(buffer, request.x as u32, request.y as u32, seed_color)
    };

    let choices = if request.blend {
        palette.colors_for(request.color)
    } else {
        Vec::new()
    };

    let w = buffer.width() as usize;
    let mut out = buffer.clone();
    for (idx, _) in mask.iter().enumerate().filter(|(_, m)| **m) {
        let mut color = if choices.is_empty() {
            request.color
        } else {
            choices[rng.index(choices.len())]
        };
        if let Some(range) = request.camo {
            let range = range.abs();
            color = shift_lightness(color, rng.range(-range, range));
        }
        out.put_texel((idx % w) as u32, (idx / w) as u32, color);
    }

    if out == *buffer {
        return Err(EditError::NoOpEdit);
    }
    Ok(out)
}

/// Texels exactly equal to `color`, anywhere in the buffer.
fn global_mask(buffer: &PixelBuffer, color: Rgba<u8>) -> Vec<bool> {
    buffer.pixels().map(|p| *p == color).collect()
}

/// 4-connected region of texels equal to `color` around the seed.  The mask
/// doubles as the visited set.
fn flood_mask(buffer: &PixelBuffer, start_x: u32, start_y: u32, color: Rgba<u8>) -> Vec<bool> {
    let wu = buffer.width() as usize;
    let hu = buffer.height() as usize;
    let mut mask = vec![false; wu * hu];
    if start_x as usize >= wu || start_y as usize >= hu {
        return mask;
    }

    let raw = buffer.as_raw();
    let matches = |idx: usize| {
        let o = idx * 4;
        raw[o..o + 4] == color.0
    };

    let seed_idx = start_y as usize * wu + start_x as usize;
    let mut stack: Vec<usize> = Vec::with_capacity(256);
    mask[seed_idx] = true;
    stack.push(seed_idx);

    while let Some(idx) = stack.pop() {
        let x = idx % wu;
        let y = idx / wu;

        let mut visit = |n: usize| {
            if !mask[n] && matches(n) {
                mask[n] = true;
                stack.push(n);
            }
        };
        if x > 0 {
            visit(idx - 1);
        }
        if x + 1 < wu {
            visit(idx + 1);
        }
        if y > 0 {
            visit(idx - wu);
        }
        if y + 1 < hu {
            visit(idx + wu);
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::adjustments::lightness;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn rng() -> HashRng {
        HashRng::new(7)
    }

    #[test]
    fn bucket_fills_uniform_region() {
        let buf = PixelBuffer::new_filled(4, 4, BLACK);
        let out = fill(&buf, &FillRequest::bounded(1, 1, RED), &BlendPalette::default(), &mut rng()).unwrap();
        assert!(out.pixels().all(|p| *p == RED));

        let again = fill(&out, &FillRequest::bounded(1, 1, RED), &BlendPalette::default(), &mut rng());
        assert_eq!(again, Err(EditError::NoOpEdit));
    }

    #[test]
    fn bounded_equals_global_on_uniform_canvas() {
        let buf = PixelBuffer::new_filled(9, 5, WHITE);
        let palette = BlendPalette::default();
        let bounded = fill(&buf, &FillRequest::bounded(3, 2, RED), &palette, &mut rng()).unwrap();
        let global = fill(&buf, &FillRequest::global(3, 2, RED), &palette, &mut rng()).unwrap();
        assert_eq!(bounded, global);
    }

    #[test]
    fn bounded_fill_does_not_cross_a_border() {
        // Column 3 is a black wall between two white halves.
        let mut buf = PixelBuffer::new_filled(7, 4, WHITE);
        for y in 0..4 {
            buf.set(3, y, BLACK).unwrap();
        }
        let out = fill(&buf, &FillRequest::bounded(0, 0, RED), &BlendPalette::default(), &mut rng()).unwrap();
        for y in 0..4 {
            for x in 0..3 {
                assert_eq!(out.get(x, y), Ok(RED));
            }
            assert_eq!(out.get(3, y), Ok(BLACK));
            for x in 4..7 {
                assert_eq!(out.get(x, y), Ok(WHITE));
            }
        }

        let global = fill(&buf, &FillRequest::global(0, 0, RED), &BlendPalette::default(), &mut rng()).unwrap();
        assert_eq!(global.get(6, 3), Ok(RED));
    }

    #[test]
    fn diagonal_neighbours_are_not_connected() {
        let mut buf = PixelBuffer::new_filled(2, 2, BLACK);
        buf.set(0, 0, WHITE).unwrap();
        buf.set(1, 1, WHITE).unwrap();
        let out = fill(&buf, &FillRequest::bounded(0, 0, RED), &BlendPalette::default(), &mut rng()).unwrap();
        assert_eq!(out.get(0, 0), Ok(RED));
        assert_eq!(out.get(1, 1), Ok(WHITE));
    }

    #[test]
    fn seed_outside_buffer_is_rejected() {
        let buf = PixelBuffer::new(4, 4);
        assert!(matches!(
            fill(&buf, &FillRequest::bounded(4, 0, RED), &BlendPalette::default(), &mut rng()),
            Err(EditError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn camo_stays_within_range() {
        let grey = Rgba([128, 128, 128, 255]);
        let buf = PixelBuffer::new_filled(16, 16, BLACK);
        let request = FillRequest {
            camo: Some(0.1),
            ..FillRequest::bounded(0, 0, grey)
        };
        let out = fill(&buf, &request, &BlendPalette::default(), &mut rng()).unwrap();

        let target = lightness(grey);
        let mut distinct = std::collections::HashSet::new();
        for p in out.pixels() {
            assert!((lightness(*p) - target).abs() <= 0.1 + 1.0 / 255.0, "{:?}", p);
            assert_eq!(p[3], 255);
            distinct.insert(p.0);
        }
        assert!(distinct.len() > 1, "camo produced a flat fill");
    }

    #[test]
    fn blend_only_uses_palette_colours() {
        let palette = BlendPalette::new(vec![RED, Rgba([0, 255, 0, 255]), Rgba([0, 0, 255, 255])], 5);
        let buf = PixelBuffer::new_filled(8, 8, WHITE);
        let request = FillRequest {
            blend: true,
            ..FillRequest::global(0, 0, RED)
        };
        let out = fill(&buf, &request, &palette, &mut rng()).unwrap();
        for p in out.pixels() {
            assert!(palette.colors.contains(p), "{:?}", p);
        }
    }

    #[test]
    fn same_colour_seed_is_skipped_with_modifiers() {
        let buf = PixelBuffer::new_filled(4, 4, RED);
        let palette = BlendPalette::new(vec![WHITE, BLACK], 5);
        let camo = FillRequest {
            camo: Some(0.1),
            ..FillRequest::bounded(1, 1, RED)
        };
        assert_eq!(fill(&buf, &camo, &palette, &mut rng()), Err(EditError::NoOpEdit));

        let blend = FillRequest {
            blend: true,
            ..FillRequest::global(1, 1, RED)
        };
        assert_eq!(fill(&buf, &blend, &palette, &mut rng()), Err(EditError::NoOpEdit));
    }

    #[test]
    fn derived_palette_has_requested_steps() {
        let palette = BlendPalette::new(Vec::new(), 5);
        let colors = palette.colors_for(Rgba([100, 60, 30, 255]));
        assert_eq!(colors.len(), 5);
        assert_eq!(colors[2], Rgba([100, 60, 30, 255]));
    }

    #[test]
    fn hash_rng_is_deterministic() {
        let mut a = HashRng::new(42);
        let mut b = HashRng::new(42);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
        let v = a.next_f32();
        assert!((0.0..1.0).contains(&v));
    }
}
