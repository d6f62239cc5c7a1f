// ============================================================================
// TEXTURE OPERATIONS: region-aware swaps, clears and overlay flattening
// ============================================================================
//
// Each operation takes a skin texture and returns a new one; the input is
// never touched, so the result can be wrapped in an `UpdateTexture` history
// entry together with the original.
// ============================================================================

use crate::canvas::{blend_over, Layer, PixelBuffer};
use crate::error::EditError;
use crate::ops::skin_layout::{self, Face, Flip, Plane, Region, SkinVariant, SKIN_HEIGHT, SKIN_WIDTH};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureOp {
    SwapFrontBack,
    SwapLeftRight,
    SwapBodyOverlay,
    ClearBase,
    ClearOverlay,
    FlattenOverlay,
}

impl TextureOp {
    pub fn label(&self) -> &'static str {
        match self {
            TextureOp::SwapFrontBack => "Swap Front/Back",
            TextureOp::SwapLeftRight => "Swap Left/Right",
            TextureOp::SwapBodyOverlay => "Swap Body/Overlay",
            TextureOp::ClearBase => "Clear Base",
            TextureOp::ClearOverlay => "Clear Overlay",
            TextureOp::FlattenOverlay => "Flatten Overlay",
        }
    }

    pub fn all() -> &'static [TextureOp] {
        &[
            TextureOp::SwapFrontBack,
            TextureOp::SwapLeftRight,
            TextureOp::SwapBodyOverlay,
            TextureOp::ClearBase,
            TextureOp::ClearOverlay,
            TextureOp::FlattenOverlay,
        ]
    }

    pub fn apply(self, texture: &PixelBuffer, variant: SkinVariant) -> Result<PixelBuffer, EditError> {
        match self {
            TextureOp::SwapFrontBack => swap_front_back(texture, variant),
            TextureOp::SwapLeftRight => swap_left_right(texture, variant),
            TextureOp::SwapBodyOverlay => swap_body_overlay(texture, variant),
            TextureOp::ClearBase => clear_plane(texture, variant, Plane::Base),
            TextureOp::ClearOverlay => clear_plane(texture, variant, Plane::Overlay),
            TextureOp::FlattenOverlay => flatten_overlay(texture, variant),
        }
    }
}

fn require_skin(texture: &PixelBuffer) -> Result<(), EditError> {
    if texture.dimensions() != (SKIN_WIDTH, SKIN_HEIGHT) {
        return Err(EditError::SizeMismatch {
            expected_width: SKIN_WIDTH,
            expected_height: SKIN_HEIGHT,
            width: texture.width(),
            height: texture.height(),
        });
    }
    Ok(())
}

/// Copy every region of `src` to the region picked by `route`.  Texels
/// outside the layout are carried over unchanged.
fn remap<F>(src: &PixelBuffer, variant: SkinVariant, route: F) -> Result<PixelBuffer, EditError>
where
    F: Fn(&Region) -> (Region, Flip),
{
    require_skin(src)?;
    let mut out = src.clone();
    for region in skin_layout::regions(variant) {
        let (target, flip) = route(&region);
        for (x, y) in region.texels() {
            let (tx, ty) = region.map_into(&target, x, y, flip);
            out.put_texel(tx, ty, src.texel(x, y));
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
//  Reflections
// ---------------------------------------------------------------------------

/// Reflect the model through its coronal plane.  Front and back faces trade
/// places, sides flip horizontally and top/bottom flip vertically in place.
pub fn swap_front_back(texture: &PixelBuffer, variant: SkinVariant) -> Result<PixelBuffer, EditError> {
    remap(texture, variant, |region| {
        let target = Region::new(region.part, region.plane, region.face.reversed(), variant);
        let flip = match region.face {
            Face::Top | Face::Bottom => Flip::Vertical,
            _ => Flip::Horizontal,
        };
        (target, flip)
    })
}

/// Reflect the model through its sagittal plane.  Limbs trade places with
/// their partner, head and body mirror in place.
pub fn swap_left_right(texture: &PixelBuffer, variant: SkinVariant) -> Result<PixelBuffer, EditError> {
    remap(texture, variant, |region| (region.mirror(variant), Flip::Horizontal))
}

pub fn swap_body_overlay(texture: &PixelBuffer, variant: SkinVariant) -> Result<PixelBuffer, EditError> {
    remap(texture, variant, |region| (region.counterpart(variant), Flip::None))
}

// ---------------------------------------------------------------------------
//  Plane edits
// ---------------------------------------------------------------------------

pub fn clear_base(texture: &PixelBuffer, variant: SkinVariant) -> Result<PixelBuffer, EditError> {
    clear_plane(texture, variant, Plane::Base)
}

pub fn clear_overlay(texture: &PixelBuffer, variant: SkinVariant) -> Result<PixelBuffer, EditError> {
    clear_plane(texture, variant, Plane::Overlay)
}

fn clear_plane(texture: &PixelBuffer, variant: SkinVariant, plane: Plane) -> Result<PixelBuffer, EditError> {
    require_skin(texture)?;
    let mut out = texture.clone();
    for region in skin_layout::regions_in(variant, plane) {
        for (x, y) in region.texels() {
            out.put_texel(x, y, image::Rgba([0, 0, 0, 0]));
        }
    }
    Ok(out)
}

/// Alpha-over every overlay region onto its base region, then clear the
/// overlay.
pub fn flatten_overlay(texture: &PixelBuffer, variant: SkinVariant) -> Result<PixelBuffer, EditError> {
    require_skin(texture)?;
    let mut out = texture.clone();
    for region in skin_layout::regions_in(variant, Plane::Overlay) {
        let base = region.counterpart(variant);
        for (x, y) in region.texels() {
            let (bx, by) = region.map_into(&base, x, y, Flip::None);
            let merged = blend_over(out.texel(bx, by), texture.texel(x, y));
            out.put_texel(bx, by, merged);
            out.put_texel(x, y, image::Rgba([0, 0, 0, 0]));
        }
    }
    Ok(out)
}

impl Layer {
    /// Run a texture operation on the base buffer.
    pub fn transformed_base(&self, op: TextureOp, variant: SkinVariant) -> Result<PixelBuffer, EditError> {
        op.apply(self.base(), variant)
    }
}
