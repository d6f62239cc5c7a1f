// ============================================================================
// SKIN LAYOUT: named body-part regions of a 64×64 skin texture
// ============================================================================
//
// Every body part is a cuboid (w, h, d) unwrapped at a texture origin (u, v):
//
//           u   u+d   u+d+w  u+2d+w  u+2d+2w
//      v        | top  | bottom|
//      v+d | right| front| left  | back  |
//      v+d+h
//
// Each part has a base and an overlay unwrap.  The mirror map pairs every
// texel of a region with the texel it lands on after a left/right reflection
// of the model, which is what the mirrored brush and the left/right swap use.
// ============================================================================

use serde::{Deserialize, Serialize};

pub const SKIN_WIDTH: u32 = 64;
pub const SKIN_HEIGHT: u32 = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinVariant {
    /// 4-texel wide arms.
    #[default]
    Classic,
    /// 3-texel wide arms.
    Slim,
}

impl SkinVariant {
    pub fn label(&self) -> &'static str {
        match self {
            SkinVariant::Classic => "classic",
            SkinVariant::Slim => "slim",
        }
    }

    pub fn all() -> &'static [SkinVariant] {
        &[SkinVariant::Classic, SkinVariant::Slim]
    }

    fn arm_width(self) -> u32 {
        match self {
            SkinVariant::Classic => 4,
            SkinVariant::Slim => 3,
        }
    }
}

impl std::str::FromStr for SkinVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classic" | "wide" | "steve" => Ok(SkinVariant::Classic),
            "slim" | "alex" => Ok(SkinVariant::Slim),
            other => Err(format!("unknown skin variant '{}' (expected classic or slim)", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyPart {
    Head,
    Body,
    RightArm,
    LeftArm,
    RightLeg,
    LeftLeg,
}

impl BodyPart {
    pub fn all() -> &'static [BodyPart] {
        &[
            BodyPart::Head,
            BodyPart::Body,
            BodyPart::RightArm,
            BodyPart::LeftArm,
            BodyPart::RightLeg,
            BodyPart::LeftLeg,
        ]
    }

    /// The part a left/right reflection maps this one onto.
    pub fn mirrored(self) -> BodyPart {
        match self {
            BodyPart::RightArm => BodyPart::LeftArm,
            BodyPart::LeftArm => BodyPart::RightArm,
            BodyPart::RightLeg => BodyPart::LeftLeg,
            BodyPart::LeftLeg => BodyPart::RightLeg,
            other => other,
        }
    }

    /// Cuboid size (w, h, d).
    pub fn size(self, variant: SkinVariant) -> (u32, u32, u32) {
        match self {
            BodyPart::Head => (8, 8, 8),
            BodyPart::Body => (8, 12, 4),
            BodyPart::RightArm | BodyPart::LeftArm => (variant.arm_width(), 12, 4),
            BodyPart::RightLeg | BodyPart::LeftLeg => (4, 12, 4),
        }
    }

    /// Texture origin (u, v) of the unwrap.
    pub fn origin(self, plane: Plane) -> (u32, u32) {
        match (self, plane) {
            (BodyPart::Head, Plane::Base) => (0, 0),
            (BodyPart::Head, Plane::Overlay) => (32, 0),
            (BodyPart::Body, Plane::Base) => (16, 16),
            (BodyPart::Body, Plane::Overlay) => (16, 32),
            (BodyPart::RightArm, Plane::Base) => (40, 16),
            (BodyPart::RightArm, Plane::Overlay) => (40, 32),
            (BodyPart::LeftArm, Plane::Base) => (32, 48),
            (BodyPart::LeftArm, Plane::Overlay) => (48, 48),
            (BodyPart::RightLeg, Plane::Base) => (0, 16),
            (BodyPart::RightLeg, Plane::Overlay) => (0, 32),
            (BodyPart::LeftLeg, Plane::Base) => (16, 48),
            (BodyPart::LeftLeg, Plane::Overlay) => (0, 48),
        }
    }
}

/// Inner skin or the outer "second layer" (hat, jacket, sleeves, pants).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Plane {
    Base,
    Overlay,
}

impl Plane {
    pub fn other(self) -> Plane {
        match self {
            Plane::Base => Plane::Overlay,
            Plane::Overlay => Plane::Base,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    Top,
    Bottom,
    Right,
    Front,
    Left,
    Back,
}

impl Face {
    pub fn all() -> &'static [Face] {
        &[Face::Top, Face::Bottom, Face::Right, Face::Front, Face::Left, Face::Back]
    }

    /// Face hit by a left/right reflection.
    pub fn mirrored(self) -> Face {
        match self {
            Face::Right => Face::Left,
            Face::Left => Face::Right,
            other => other,
        }
    }

    /// Face hit by a front/back reflection.
    pub fn reversed(self) -> Face {
        match self {
            Face::Front => Face::Back,
            Face::Back => Face::Front,
            other => other,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// One face of one part in one plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    pub part: BodyPart,
    pub plane: Plane,
    pub face: Face,
    pub rect: Rect,
}

/// How local coordinates are reflected when content moves between regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flip {
    None,
    Horizontal,
    Vertical,
}

impl Region {
    pub fn new(part: BodyPart, plane: Plane, face: Face, variant: SkinVariant) -> Self {
        let (w, h, d) = part.size(variant);
        let (u, v) = part.origin(plane);
        let rect = match face {
            Face::Top => Rect { x: u + d, y: v, width: w, height: d },
            Face::Bottom => Rect { x: u + d + w, y: v, width: w, height: d },
            Face::Right => Rect { x: u, y: v + d, width: d, height: h },
            Face::Front => Rect { x: u + d, y: v + d, width: w, height: h },
            Face::Left => Rect { x: u + d + w, y: v + d, width: d, height: h },
            Face::Back => Rect { x: u + 2 * d + w, y: v + d, width: w, height: h },
        };
        Self { part, plane, face, rect }
    }

    /// Same part and face on the other plane.
    pub fn counterpart(&self, variant: SkinVariant) -> Region {
        Region::new(self.part, self.plane.other(), self.face, variant)
    }

    /// Partner region under a left/right reflection.
    pub fn mirror(&self, variant: SkinVariant) -> Region {
        Region::new(self.part.mirrored(), self.plane, self.face.mirrored(), variant)
    }

    /// Map a texel of this region into `target`, reflecting as asked.  Both
    /// regions must have the same size, which holds for every pairing above.
    pub fn map_into(&self, target: &Region, x: u32, y: u32, flip: Flip) -> (u32, u32) {
        let lx = x - self.rect.x;
        let ly = y - self.rect.y;
        let (tx, ty) = match flip {
            Flip::None => (lx, ly),
            Flip::Horizontal => (target.rect.width - 1 - lx, ly),
            Flip::Vertical => (lx, target.rect.height - 1 - ly),
        };
        (target.rect.x + tx, target.rect.y + ty)
    }

    pub fn texels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let r = self.rect;
        (r.y..r.y + r.height).flat_map(move |y| (r.x..r.x + r.width).map(move |x| (x, y)))
    }
}

/// Every region of the layout, base plane first.
pub fn regions(variant: SkinVariant) -> Vec<Region> {
    let mut out = Vec::with_capacity(BodyPart::all().len() * Face::all().len() * 2);
    for &plane in &[Plane::Base, Plane::Overlay] {
        for &part in BodyPart::all() {
            for &face in Face::all() {
                out.push(Region::new(part, plane, face, variant));
            }
        }
    }
    out
}

pub fn regions_in(variant: SkinVariant, plane: Plane) -> impl Iterator<Item = Region> {
    regions(variant).into_iter().filter(move |r| r.plane == plane)
}

/// The region a texel belongs to, if any.
pub fn region_at(x: u32, y: u32, variant: SkinVariant) -> Option<Region> {
    regions(variant).into_iter().find(|r| r.rect.contains(x, y))
}

/// Left/right mirror of a texel.  `None` for texels outside every region.
pub fn mirror_point(x: u32, y: u32, variant: SkinVariant) -> Option<(u32, u32)> {
    let region = region_at(x, y, variant)?;
    let partner = region.mirror(variant);
    Some(region.map_into(&partner, x, y, Flip::Horizontal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_fit_the_texture_without_overlap() {
        for &variant in SkinVariant::all() {
            let all = regions(variant);
            assert_eq!(all.len(), 72);
            for (i, a) in all.iter().enumerate() {
                assert!(a.rect.x + a.rect.width <= SKIN_WIDTH, "{:?}", a);
                assert!(a.rect.y + a.rect.height <= SKIN_HEIGHT, "{:?}", a);
                for b in &all[i + 1..] {
                    assert!(!a.rect.overlaps(&b.rect), "{:?} overlaps {:?}", a, b);
                }
            }
        }
    }

    #[test]
    fn known_faces_land_where_expected() {
        let head_front = Region::new(BodyPart::Head, Plane::Base, Face::Front, SkinVariant::Classic);
        assert_eq!(head_front.rect, Rect { x: 8, y: 8, width: 8, height: 8 });

        let slim_arm_back = Region::new(BodyPart::RightArm, Plane::Base, Face::Back, SkinVariant::Slim);
        assert_eq!(slim_arm_back.rect, Rect { x: 51, y: 20, width: 3, height: 12 });
    }

    #[test]
    fn mirror_is_an_involution() {
        for &variant in SkinVariant::all() {
            for y in 0..SKIN_HEIGHT {
                for x in 0..SKIN_WIDTH {
                    if let Some((mx, my)) = mirror_point(x, y, variant) {
                        assert_eq!(mirror_point(mx, my, variant), Some((x, y)));
                    }
                }
            }
        }
    }

    #[test]
    fn mirror_pairs_limbs_and_reflects_head_in_place() {
        // Right arm front (44, 20) ↔ left arm front, flipped.
        let right_front = Region::new(BodyPart::RightArm, Plane::Base, Face::Front, SkinVariant::Classic);
        let left_front = Region::new(BodyPart::LeftArm, Plane::Base, Face::Front, SkinVariant::Classic);
        assert_eq!(
            mirror_point(right_front.rect.x, right_front.rect.y, SkinVariant::Classic),
            Some((left_front.rect.x + left_front.rect.width - 1, left_front.rect.y))
        );

        // Head front column 8 ↔ column 15.
        assert_eq!(mirror_point(8, 10, SkinVariant::Classic), Some((15, 10)));

        // Head right side ↔ head left side.
        assert_eq!(mirror_point(0, 8, SkinVariant::Classic), Some((23, 8)));

        // Unused corner of the texture has no mirror.
        assert_eq!(mirror_point(0, 0, SkinVariant::Classic), None);
    }

    #[test]
    fn variant_parses_from_cli_names() {
        assert_eq!("slim".parse::<SkinVariant>(), Ok(SkinVariant::Slim));
        assert_eq!("Classic".parse::<SkinVariant>(), Ok(SkinVariant::Classic));
        assert!("huge".parse::<SkinVariant>().is_err());
    }
}
