// ============================================================================
// STROKES: shaped brush stamps with optional left/right mirroring
// ============================================================================

use image::Rgba;

use crate::canvas::PixelBuffer;
use crate::error::EditError;
use crate::ops::skin_layout::{self, SkinVariant, SKIN_HEIGHT, SKIN_WIDTH};

pub const MIN_BRUSH_SIZE: u32 = 1;
pub const MAX_BRUSH_SIZE: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BrushShape {
    #[default]
    Square,
    Circle,
}

impl BrushShape {
    pub fn label(&self) -> &'static str {
        match self {
            BrushShape::Square => "Square",
            BrushShape::Circle => "Circle",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Brush {
    pub shape: BrushShape,
    size: u32,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            shape: BrushShape::Square,
            size: MIN_BRUSH_SIZE,
        }
    }
}

impl Brush {
    pub fn new(shape: BrushShape, size: u32) -> Self {
        Self {
            shape,
            size: size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn mask(&self) -> Vec<(i64, i64)> {
        stamp_mask(self.shape, self.size)
    }
}

/// What a stamp writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Paint {
    Color(Rgba<u8>),
    Erase,
}

impl Paint {
    fn texel(self) -> Rgba<u8> {
        match self {
            Paint::Color(c) => c,
            Paint::Erase => Rgba([0, 0, 0, 0]),
        }
    }
}

/// Offsets covered by a brush, relative to the target texel.  Size 2 has no
/// centre texel, so it extends right and down from the target.
pub fn stamp_mask(shape: BrushShape, size: u32) -> Vec<(i64, i64)> {
    let size = size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
    match (shape, size) {
        (_, 1) => vec![(0, 0)],
        (_, 2) => vec![(0, 0), (1, 0), (0, 1), (1, 1)],
        (BrushShape::Circle, _) => vec![(0, -1), (-1, 0), (0, 0), (1, 0), (0, 1)],
        (BrushShape::Square, _) => {
            let mut out = Vec::with_capacity(9);
            for dy in -1..=1 {
                for dx in -1..=1 {
                    out.push((dx, dy));
                }
            }
            out
        }
    }
}

/// Stamp the brush at (x, y).  With `mirror` set, every written texel is also
/// written at its mirror in the skin layout; texels outside the layout have no
/// mirror.  Fails only when no texel of the stamp lands inside the buffer.
pub fn stamp(
    buffer: &mut PixelBuffer,
    x: i64,
    y: i64,
    brush: &Brush,
    paint: Paint,
    mirror: Option<SkinVariant>,
) -> Result<(), EditError> {
    let texel = paint.texel();
    let mirror = mirror.filter(|_| buffer.dimensions() == (SKIN_WIDTH, SKIN_HEIGHT));
    let mut landed = false;

    for (dx, dy) in brush.mask() {
        let (px, py) = (x + dx, y + dy);
        if !buffer.contains(px, py) {
            continue;
        }
        landed = true;
        let (ux, uy) = (px as u32, py as u32);
        buffer.put_texel(ux, uy, texel);
        if let Some(variant) = mirror
            && let Some((mx, my)) = skin_layout::mirror_point(ux, uy, variant)
        {
            buffer.put_texel(mx, my, texel);
        }
    }

    if landed {
        Ok(())
    } else {
        Err(EditError::out_of_bounds(x, y, buffer.width(), buffer.height()))
    }
}

/// Stamp along a polyline, filling gaps between consecutive points.
pub fn stroke(
    buffer: &mut PixelBuffer,
    points: &[(i64, i64)],
    brush: &Brush,
    paint: Paint,
    mirror: Option<SkinVariant>,
) -> Result<(), EditError> {
    let Some(&first) = points.first() else {
        return Err(EditError::NoOpEdit);
    };

    let mut first_err = None;
    let mut any = false;
    let mut visit = |buffer: &mut PixelBuffer, (x, y): (i64, i64)| match stamp(buffer, x, y, brush, paint, mirror) {
        Ok(()) => any = true,
        Err(e) => {
            first_err.get_or_insert(e);
        }
    };

    visit(buffer, first);
    for pair in points.windows(2) {
        // The start point was stamped by the previous segment.
        for p in line_points(pair[0], pair[1]).into_iter().skip(1) {
            visit(buffer, p);
        }
    }

    match (any, first_err) {
        (false, Some(e)) => Err(e),
        _ => Ok(()),
    }
}

/// Bresenham line, both endpoints included.
pub fn line_points(from: (i64, i64), to: (i64, i64)) -> Vec<(i64, i64)> {
    let (mut x0, mut y0) = from;
    let (x1, y1) = to;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut out = Vec::with_capacity((dx.max(-dy) + 1) as usize);
    loop {
        out.push((x0, y0));
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::skin_layout::{BodyPart, Face, Plane, Region};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn painted(buf: &PixelBuffer) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        for y in 0..buf.height() {
            for x in 0..buf.width() {
                if buf.texel(x, y)[3] != 0 {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn masks_have_expected_shapes() {
        assert_eq!(stamp_mask(BrushShape::Square, 1).len(), 1);
        assert_eq!(stamp_mask(BrushShape::Square, 2).len(), 4);
        assert_eq!(stamp_mask(BrushShape::Square, 3).len(), 9);
        assert_eq!(stamp_mask(BrushShape::Circle, 3).len(), 5);
        assert_eq!(stamp_mask(BrushShape::Circle, 9), stamp_mask(BrushShape::Circle, 3));
        assert_eq!(Brush::new(BrushShape::Square, 0).size(), 1);
    }

    #[test]
    fn stamp_clips_at_edges() {
        let mut buf = PixelBuffer::new(4, 4);
        stamp(&mut buf, 0, 0, &Brush::new(BrushShape::Square, 3), Paint::Color(RED), None).unwrap();
        assert_eq!(painted(&buf), vec![(0, 0), (1, 0), (0, 1), (1, 1)]);

        let err = stamp(&mut buf, 10, 10, &Brush::default(), Paint::Color(RED), None);
        assert!(matches!(err, Err(EditError::InvalidBounds { .. })));
    }

    #[test]
    fn erase_writes_transparent() {
        let mut buf = PixelBuffer::new_filled(3, 3, RED);
        stamp(&mut buf, 1, 1, &Brush::new(BrushShape::Circle, 3), Paint::Erase, None).unwrap();
        assert_eq!(buf.get(1, 0), Ok(Rgba([0, 0, 0, 0])));
        assert_eq!(buf.get(0, 0), Ok(RED));
    }

    #[test]
    fn mirrored_stamp_has_identical_shape_at_partner() {
        let variant = SkinVariant::Classic;
        let right = Region::new(BodyPart::RightLeg, Plane::Base, Face::Front, variant);
        let left = Region::new(BodyPart::LeftLeg, Plane::Base, Face::Front, variant);

        let mut buf = PixelBuffer::new(SKIN_WIDTH, SKIN_HEIGHT);
        let (cx, cy) = (right.rect.x as i64 + 1, right.rect.y as i64 + 4);
        stamp(&mut buf, cx, cy, &Brush::new(BrushShape::Circle, 3), Paint::Color(RED), Some(variant)).unwrap();

        let mut in_right: Vec<_> = painted(&buf)
            .into_iter()
            .filter(|&(x, y)| right.rect.contains(x, y))
            .map(|(x, y)| (right.rect.width - 1 - (x - right.rect.x), y - right.rect.y))
            .collect();
        let mut in_left: Vec<_> = painted(&buf)
            .into_iter()
            .filter(|&(x, y)| left.rect.contains(x, y))
            .map(|(x, y)| (x - left.rect.x, y - left.rect.y))
            .collect();
        in_right.sort();
        in_left.sort();
        assert_eq!(in_right.len(), 5);
        assert_eq!(in_right, in_left);
    }

    #[test]
    fn mirror_reflects_within_region_at_seams() {
        // Size-2 square at the right edge of the head front spills into the
        // head's left side; each half reflects within its own face.
        let variant = SkinVariant::Classic;
        let mut buf = PixelBuffer::new(SKIN_WIDTH, SKIN_HEIGHT);
        stamp(&mut buf, 15, 8, &Brush::new(BrushShape::Square, 2), Paint::Color(RED), Some(variant)).unwrap();

        // Front (15, 8) ↔ (8, 8); left side (16, 8) ↔ right side (7, 8).
        for (x, y) in [(15, 8), (8, 8), (16, 8), (7, 8), (15, 9), (8, 9), (16, 9), (7, 9)] {
            assert_eq!(buf.texel(x, y), RED, "({}, {})", x, y);
        }
        assert_eq!(painted(&buf).len(), 8);
    }

    #[test]
    fn stroke_fills_gaps_between_points() {
        let mut buf = PixelBuffer::new(8, 8);
        stroke(&mut buf, &[(0, 0), (7, 0), (7, 7)], &Brush::default(), Paint::Color(RED), None).unwrap();
        assert_eq!(painted(&buf).len(), 15);
        assert_eq!(line_points((0, 0), (3, 1)).len(), 4);
    }
}
