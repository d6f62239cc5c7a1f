// ============================================================================
// LAYER FILTERS: non-destructive opacity / hue / saturation / brightness
// ============================================================================
//
// A layer keeps an ordered list of `Filter`s exactly as the sliders produced
// them.  At composite time the list is resolved into a `FilterPipeline`, which
// always runs Opacity → Hue → Saturation → Brightness no matter how the list
// was ordered, so recomposition is deterministic.
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::canvas::PixelBuffer;
use crate::ops::adjustments::{apply_pixel_transform, hsl_to_rgb, rgb_to_hsl};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    Opacity,
    Hue,
    Saturation,
    Brightness,
}

impl FilterKind {
    /// Pipeline order.
    pub fn all() -> &'static [FilterKind] {
        &[
            FilterKind::Opacity,
            FilterKind::Hue,
            FilterKind::Saturation,
            FilterKind::Brightness,
        ]
    }

    pub fn default_value(self) -> f32 {
        match self {
            FilterKind::Opacity => 1.0,
            FilterKind::Hue | FilterKind::Saturation | FilterKind::Brightness => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterKind::Opacity => "Opacity",
            FilterKind::Hue => "Hue",
            FilterKind::Saturation => "Saturation",
            FilterKind::Brightness => "Brightness",
        }
    }

    /// Bring a raw slider value into the kind's valid range.
    pub fn normalize(self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.default_value();
        }
        match self {
            FilterKind::Opacity => value.clamp(0.0, 1.0),
            FilterKind::Hue => value.rem_euclid(360.0),
            FilterKind::Saturation | FilterKind::Brightness => value.clamp(-1.0, 1.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub kind: FilterKind,
    pub value: f32,
}

impl Filter {
    pub fn new(kind: FilterKind, value: f32) -> Self {
        Self {
            kind,
            value: kind.normalize(value),
        }
    }

    pub fn opacity(value: f32) -> Self {
        Self::new(FilterKind::Opacity, value)
    }

    pub fn hue(degrees: f32) -> Self {
        Self::new(FilterKind::Hue, degrees)
    }

    pub fn saturation(value: f32) -> Self {
        Self::new(FilterKind::Saturation, value)
    }

    pub fn brightness(value: f32) -> Self {
        Self::new(FilterKind::Brightness, value)
    }

    pub fn is_default(&self) -> bool {
        self.kind.normalize(self.value) == self.kind.default_value()
    }
}

/// `true` iff any filter differs from its default.
pub fn has_filters(filters: &[Filter]) -> bool {
    filters.iter().any(|f| !f.is_default())
}

/// Two lists are equivalent when they resolve to the same pipeline.
pub fn filters_equivalent(a: &[Filter], b: &[Filter]) -> bool {
    FilterPipeline::from_filters(a) == FilterPipeline::from_filters(b)
}

// ============================================================================
// PIPELINE
// ============================================================================

/// One resolved value per filter kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterPipeline {
    pub opacity: f32,
    /// Degrees, 0..360.
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self {
            opacity: FilterKind::Opacity.default_value(),
            hue: FilterKind::Hue.default_value(),
            saturation: FilterKind::Saturation.default_value(),
            brightness: FilterKind::Brightness.default_value(),
        }
    }
}

impl FilterPipeline {
    /// Resolve a filter list.  When a kind appears more than once the last
    /// entry wins.
    pub fn from_filters(filters: &[Filter]) -> Self {
        let mut pipeline = Self::default();
        for f in filters {
            pipeline.set(f.kind, f.value);
        }
        pipeline
    }

    pub fn get(&self, kind: FilterKind) -> f32 {
        match kind {
            FilterKind::Opacity => self.opacity,
            FilterKind::Hue => self.hue,
            FilterKind::Saturation => self.saturation,
            FilterKind::Brightness => self.brightness,
        }
    }

    pub fn set(&mut self, kind: FilterKind, value: f32) {
        let value = kind.normalize(value);
        match kind {
            FilterKind::Opacity => self.opacity = value,
            FilterKind::Hue => self.hue = value,
            FilterKind::Saturation => self.saturation = value,
            FilterKind::Brightness => self.brightness = value,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// The non-default filters, in pipeline order.
    pub fn to_filters(&self) -> Vec<Filter> {
        FilterKind::all()
            .iter()
            .map(|&k| Filter::new(k, self.get(k)))
            .filter(|f| !f.is_default())
            .collect()
    }

    /// Run the pipeline over a buffer.  Default-valued stages are skipped, so
    /// an identity pipeline returns an exact copy.
    pub fn apply(&self, source: &PixelBuffer) -> PixelBuffer {
        if self.is_identity() {
            return source.clone();
        }

        let opacity = self.opacity;
        let hue_shift = self.hue / 360.0;
        let saturation = self.saturation;
        let brightness = self.brightness;
        let touches_color = hue_shift != 0.0 || saturation != 0.0 || brightness != 0.0;

        apply_pixel_transform(source, move |r, g, b, a| {
            let a = a * opacity;
            if !touches_color {
                return (r, g, b, a);
            }
            let (mut h, mut s, mut l) = rgb_to_hsl(r / 255.0, g / 255.0, b / 255.0);
            if hue_shift != 0.0 {
                h = (h + hue_shift).rem_euclid(1.0);
            }
            if saturation != 0.0 {
                s = (s + saturation).clamp(0.0, 1.0);
            }
            if brightness != 0.0 {
                l = (l + brightness).clamp(0.0, 1.0);
            }
            let (nr, ng, nb) = hsl_to_rgb(h, s, l);
            (nr * 255.0, ng * 255.0, nb * 255.0, a)
        })
    }
}
