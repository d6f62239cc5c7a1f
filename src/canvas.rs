use image::{Rgba, RgbaImage};
use uuid::Uuid;

use crate::error::EditError;
use crate::events::{EditorEvent, Observers, SubscriptionId};
use crate::ops::filters::{self, Filter, FilterPipeline};
use crate::ops::skin_layout::{SKIN_HEIGHT, SKIN_WIDTH};

// ============================================================================
// PIXEL BUFFER – fixed-size RGBA texel grid
// ============================================================================

static TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Fixed-size RGBA image.  Dimensions are set at construction and never
/// change; every checked accessor rejects out-of-bounds coordinates instead of
/// clamping them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    // ---- construction -------------------------------------------------------

    /// Create a fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn new_filled(width: u32, height: u32, color: Rgba<u8>) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, color),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Wrap raw RGBA bytes.  Returns `None` when the byte count does not match.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, data).map(Self::from_image)
    }

    // ---- geometry -----------------------------------------------------------

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64
    }

    fn check(&self, x: i64, y: i64) -> Result<(u32, u32), EditError> {
        if self.contains(x, y) {
            Ok((x as u32, y as u32))
        } else {
            Err(EditError::out_of_bounds(x, y, self.width(), self.height()))
        }
    }

    // ---- pixel access -------------------------------------------------------

    pub fn get(&self, x: i64, y: i64) -> Result<Rgba<u8>, EditError> {
        let (x, y) = self.check(x, y)?;
        Ok(*self.image.get_pixel(x, y))
    }

    pub fn set(&mut self, x: i64, y: i64, pixel: Rgba<u8>) -> Result<(), EditError> {
        let (x, y) = self.check(x, y)?;
        self.image.put_pixel(x, y, pixel);
        Ok(())
    }

    /// Unchecked-by-contract read for loops that already iterate in bounds.
    /// Returns transparent instead of panicking if the contract is broken.
    #[inline]
    pub(crate) fn texel(&self, x: u32, y: u32) -> Rgba<u8> {
        if x < self.width() && y < self.height() {
            *self.image.get_pixel(x, y)
        } else {
            TRANSPARENT
        }
    }

    #[inline]
    pub(crate) fn put_texel(&mut self, x: u32, y: u32, pixel: Rgba<u8>) {
        if x < self.width() && y < self.height() {
            self.image.put_pixel(x, y, pixel);
        }
    }

    pub fn fill(&mut self, color: Rgba<u8>) {
        for p in self.image.pixels_mut() {
            *p = color;
        }
    }

    pub fn clear(&mut self) {
        self.fill(TRANSPARENT);
    }

    pub fn is_transparent(&self) -> bool {
        self.image.pixels().all(|p| p[3] == 0)
    }

    pub fn pixels(&self) -> impl Iterator<Item = &Rgba<u8>> {
        self.image.pixels()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub(crate) fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }

    pub fn memory_bytes(&self) -> usize {
        self.image.as_raw().len()
    }

    /// Alpha-over `top` onto this buffer, texel by texel.  Both buffers must
    /// share dimensions.
    pub fn blend_from(&mut self, top: &PixelBuffer) -> Result<(), EditError> {
        if self.dimensions() != top.dimensions() {
            return Err(EditError::SizeMismatch {
                expected_width: self.width(),
                expected_height: self.height(),
                width: top.width(),
                height: top.height(),
            });
        }
        for (dst, src) in self.image.pixels_mut().zip(top.image.pixels()) {
            *dst = blend_over(*dst, *src);
        }
        Ok(())
    }
}

/// Standard (straight-alpha) "source over" compositing of `top` onto `base`.
pub fn blend_over(base: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    // Fast path: fully transparent top pixel, nothing to blend
    if top[3] == 0 {
        return base;
    }
    // Fast path: opaque top pixel, or nothing underneath, just overwrite
    if top[3] == 255 || base[3] == 0 {
        return top;
    }

    let top_a = top[3] as f32 / 255.0;
    let base_a = base[3] as f32 / 255.0;
    let out_a = top_a + base_a * (1.0 - top_a);

    let channel = |t: u8, b: u8| {
        let t = t as f32 / 255.0;
        let b = b as f32 / 255.0;
        ((t * top_a + b * base_a * (1.0 - top_a)) / out_a * 255.0)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(top[0], base[0]),
        channel(top[1], base[1]),
        channel(top[2], base[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

// ============================================================================
// LAYER
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerId(Uuid);

impl LayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short form is enough to tell layers apart in the session log.
        let s = self.0.simple().to_string();
        write!(f, "{}", &s[..8])
    }
}

/// Which of a layer's two buffers a tool or history entry writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BufferTarget {
    #[default]
    Base,
    Overlay,
}

#[derive(Clone, Debug)]
pub struct Layer {
    id: LayerId,
    pub name: String,
    base: PixelBuffer,
    /// Optional separate buffer composited on top of `base`.
    overlay: Option<PixelBuffer>,
    visible: bool,
    filters: Vec<Filter>,
}

impl Layer {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self::from_buffer(name, PixelBuffer::new(width, height))
    }

    pub fn from_buffer(name: impl Into<String>, base: PixelBuffer) -> Self {
        Self {
            id: LayerId::new(),
            name: name.into(),
            base,
            overlay: None,
            visible: true,
            filters: Vec::new(),
        }
    }

    pub fn with_overlay(mut self, overlay: PixelBuffer) -> Self {
        if overlay.dimensions() == self.base.dimensions() {
            self.overlay = Some(overlay);
        }
        self
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.base.width()
    }

    pub fn height(&self) -> u32 {
        self.base.height()
    }

    pub fn base(&self) -> &PixelBuffer {
        &self.base
    }

    pub fn overlay(&self) -> Option<&PixelBuffer> {
        self.overlay.as_ref()
    }

    pub fn buffer(&self, target: BufferTarget) -> Option<&PixelBuffer> {
        match target {
            BufferTarget::Base => Some(&self.base),
            BufferTarget::Overlay => self.overlay.as_ref(),
        }
    }

    pub(crate) fn buffer_mut(&mut self, target: BufferTarget) -> Option<&mut PixelBuffer> {
        match target {
            BufferTarget::Base => Some(&mut self.base),
            BufferTarget::Overlay => self.overlay.as_mut(),
        }
    }

    /// Swap in a new buffer, returning the previous one.
    pub(crate) fn replace_buffer(
        &mut self,
        target: BufferTarget,
        buffer: PixelBuffer,
    ) -> Result<PixelBuffer, EditError> {
        if buffer.dimensions() != self.base.dimensions() {
            return Err(EditError::SizeMismatch {
                expected_width: self.width(),
                expected_height: self.height(),
                width: buffer.width(),
                height: buffer.height(),
            });
        }
        let slot = self
            .buffer_mut(target)
            .ok_or(EditError::MissingBuffer(target))?;
        Ok(std::mem::replace(slot, buffer))
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The live filter list.  Copy it (`to_vec`) before keeping it around.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn has_filters(&self) -> bool {
        filters::has_filters(&self.filters)
    }

    pub(crate) fn replace_filters(&mut self, filters: Vec<Filter>) -> Vec<Filter> {
        std::mem::replace(&mut self.filters, filters)
    }

    /// Base and overlay blended together, before filters.
    pub fn flattened(&self) -> PixelBuffer {
        let mut out = self.base.clone();
        if let Some(ref overlay) = self.overlay {
            // Dimensions are guaranteed equal by `with_overlay` / `replace_buffer`.
            let blended = out.blend_from(overlay);
            debug_assert!(blended.is_ok(), "overlay size differs from base: {:?}", blended);
        }
        out
    }

    /// The layer's output as it takes part in the stack composite.  A pure
    /// function of the buffers, filters and visibility.
    pub fn composite(&self) -> PixelBuffer {
        if !self.visible {
            return PixelBuffer::new(self.width(), self.height());
        }
        FilterPipeline::from_filters(&self.filters).apply(&self.flattened())
    }

    /// Base and overlay flattened with the filter pipeline baked in.  Unlike
    /// `composite` this ignores visibility.
    pub fn baked(&self) -> PixelBuffer {
        FilterPipeline::from_filters(&self.filters).apply(&self.flattened())
    }

    pub fn memory_bytes(&self) -> usize {
        self.base.memory_bytes() + self.overlay.as_ref().map_or(0, |o| o.memory_bytes())
    }
}

// ============================================================================
// LAYER STACK
// ============================================================================

/// Ordered layers (index 0 paints first, i.e. is the bottom) plus selection.
pub struct LayerStack {
    width: u32,
    height: u32,
    layers: Vec<Layer>,
    selected: Option<usize>,
    observers: Observers,
}

impl LayerStack {
    /// An empty stack.  Selection is `None` until the first layer is added.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layers: Vec::new(),
            selected: None,
            observers: Observers::new(),
        }
    }

    /// Empty stack sized for a skin texture.
    pub fn skin() -> Self {
        Self::new(SKIN_WIDTH, SKIN_HEIGHT)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&EditorEvent) + Send + 'static,
    {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub(crate) fn emit(&mut self, event: EditorEvent) {
        self.observers.emit(event);
    }

    // ---- lookup -------------------------------------------------------------

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id() == id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    pub(crate) fn layer_mut(&mut self, id: LayerId) -> Result<&mut Layer, EditError> {
        self.layers
            .iter_mut()
            .find(|l| l.id() == id)
            .ok_or(EditError::StaleTarget(id))
    }

    pub fn get(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selected.and_then(|i| self.layers.get(i))
    }

    pub fn selected_id(&self) -> Option<LayerId> {
        self.selected_layer().map(Layer::id)
    }

    // ---- structure ----------------------------------------------------------

    /// Add a blank layer on top and select it.
    pub fn add_layer(&mut self, name: impl Into<String>) -> LayerId {
        let layer = Layer::new(name, self.width, self.height);
        let id = layer.id();
        self.push_layer(layer);
        id
    }

    /// Add an existing layer on top and select it.
    pub fn insert_layer(&mut self, layer: Layer) -> Result<LayerId, EditError> {
        if (layer.width(), layer.height()) != (self.width, self.height) {
            return Err(EditError::SizeMismatch {
                expected_width: self.width,
                expected_height: self.height,
                width: layer.width(),
                height: layer.height(),
            });
        }
        let id = layer.id();
        self.push_layer(layer);
        Ok(id)
    }

    fn push_layer(&mut self, layer: Layer) {
        crate::log_info!("Layer added: {} ({})", layer.name, layer.id());
        self.layers.push(layer);
        self.selected = Some(self.layers.len() - 1);
        self.emit(EditorEvent::LayersRender);
        self.emit(EditorEvent::LayersSelect);
    }

    /// Copy a layer (pixels, filters, visibility) directly above the source.
    pub fn duplicate_layer(&mut self, id: LayerId) -> Result<LayerId, EditError> {
        let index = self.index_of(id).ok_or(EditError::StaleTarget(id))?;
        let mut copy = self.layers[index].clone();
        copy.id = LayerId::new();
        copy.name = format!("{} copy", copy.name);
        let new_id = copy.id;
        self.layers.insert(index + 1, copy);
        self.selected = Some(index + 1);
        self.emit(EditorEvent::LayersRender);
        self.emit(EditorEvent::LayersSelect);
        Ok(new_id)
    }

    /// Remove a layer.  The last remaining layer can never be removed.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<Layer, EditError> {
        let index = self.index_of(id).ok_or(EditError::StaleTarget(id))?;
        if self.layers.len() <= 1 {
            crate::log_warn!("Refusing to remove the last layer ({})", id);
            return Err(EditError::LastLayer);
        }
        let removed = self.layers.remove(index);

        let previous = self.selected;
        self.selected = match self.selected {
            Some(sel) if sel > index => Some(sel - 1),
            Some(sel) => Some(sel.min(self.layers.len() - 1)),
            None => None,
        };

        self.emit(EditorEvent::LayersRender);
        if previous != self.selected || previous == Some(index) {
            self.emit(EditorEvent::LayersSelect);
        }
        Ok(removed)
    }

    /// Move a layer from one paint position to another, keeping it selected
    /// if it was.
    pub fn move_layer(&mut self, from: usize, to: usize) -> Result<(), EditError> {
        let len = self.layers.len();
        if from >= len || to >= len {
            return Err(EditError::out_of_bounds(from as i64, to as i64, len as u32, 1));
        }
        if from == to {
            return Err(EditError::NoOpEdit);
        }
        let selected_id = self.selected_id();
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        self.selected = selected_id.and_then(|id| self.index_of(id));
        self.emit(EditorEvent::LayersRender);
        Ok(())
    }

    pub fn select(&mut self, index: usize) -> Result<(), EditError> {
        if index >= self.layers.len() {
            return Err(EditError::out_of_bounds(index as i64, 0, self.layers.len() as u32, 1));
        }
        if self.selected != Some(index) {
            self.selected = Some(index);
            self.emit(EditorEvent::LayersSelect);
        }
        Ok(())
    }

    pub fn select_layer(&mut self, id: LayerId) -> Result<(), EditError> {
        let index = self.index_of(id).ok_or(EditError::StaleTarget(id))?;
        self.select(index)
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> Result<(), EditError> {
        let layer = self.layer_mut(id)?;
        if layer.visible == visible {
            return Err(EditError::NoOpEdit);
        }
        layer.visible = visible;
        self.emit(EditorEvent::LayersRender);
        Ok(())
    }

    pub fn rename_layer(&mut self, id: LayerId, name: impl Into<String>) -> Result<(), EditError> {
        self.layer_mut(id)?.name = name.into();
        self.emit(EditorEvent::LayersRender);
        Ok(())
    }

    /// Attach or detach a layer's separate overlay buffer.
    pub fn set_overlay(&mut self, id: LayerId, overlay: Option<PixelBuffer>) -> Result<(), EditError> {
        let (width, height) = (self.width, self.height);
        if let Some(ref o) = overlay {
            if o.dimensions() != (width, height) {
                return Err(EditError::SizeMismatch {
                    expected_width: width,
                    expected_height: height,
                    width: o.width(),
                    height: o.height(),
                });
            }
        }
        self.layer_mut(id)?.overlay = overlay;
        self.emit(EditorEvent::LayersRender);
        Ok(())
    }

    // ---- mutation hooks used by history and tools -----------------------------

    /// Replace a layer's filter list, returning the previous list.
    pub(crate) fn set_filters(&mut self, id: LayerId, filters: Vec<Filter>) -> Result<Vec<Filter>, EditError> {
        let previous = self.layer_mut(id)?.replace_filters(filters);
        self.emit(EditorEvent::UpdateFilters(id));
        Ok(previous)
    }

    pub(crate) fn replace_buffer(
        &mut self,
        id: LayerId,
        target: BufferTarget,
        buffer: PixelBuffer,
    ) -> Result<PixelBuffer, EditError> {
        self.layer_mut(id)?.replace_buffer(target, buffer)
    }

    // ---- compositing ----------------------------------------------------------

    /// Painter's-algorithm composite of every visible layer, bottom first.
    pub fn composite(&self) -> PixelBuffer {
        let mut result = PixelBuffer::new(self.width, self.height);
        for layer in self.layers.iter().filter(|l| l.is_visible()) {
            let blended = result.blend_from(&layer.composite());
            debug_assert!(blended.is_ok(), "layer size differs from stack: {:?}", blended);
        }
        result
    }
}

impl std::fmt::Debug for LayerStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerStack")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layers", &self.layers.len())
            .field("selected", &self.selected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::recorder;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[test]
    fn pixel_buffer_rejects_out_of_bounds() {
        let mut buf = PixelBuffer::new(4, 4);
        assert!(buf.set(3, 3, RED).is_ok());
        assert_eq!(
            buf.set(4, 0, RED),
            Err(EditError::InvalidBounds { x: 4, y: 0, width: 4, height: 4 })
        );
        assert!(buf.get(-1, 2).is_err());
        assert_eq!(buf.get(3, 3), Ok(RED));
        assert_eq!(buf.dimensions(), (4, 4));
    }

    #[test]
    fn blend_over_matches_alpha_over() {
        assert_eq!(blend_over(RED, Rgba([0, 0, 0, 0])), RED);
        assert_eq!(blend_over(RED, BLUE), BLUE);
        assert_eq!(blend_over(Rgba([0, 0, 0, 0]), Rgba([10, 20, 30, 40])), Rgba([10, 20, 30, 40]));

        let half_blue = Rgba([0, 0, 255, 128]);
        let out = blend_over(RED, half_blue);
        assert_eq!(out[3], 255);
        assert!(out[0] > 120 && out[0] < 135);
        assert!(out[2] > 120 && out[2] < 135);
    }

    #[test]
    fn default_filters_composite_equals_base_over_overlay() {
        let mut base = PixelBuffer::new_filled(8, 8, RED);
        base.set(0, 0, Rgba([0, 0, 0, 0])).unwrap();
        let mut overlay = PixelBuffer::new(8, 8);
        overlay.set(1, 1, Rgba([0, 255, 0, 100])).unwrap();
        overlay.set(2, 2, BLUE).unwrap();

        let mut layer = Layer::from_buffer("skin", base.clone()).with_overlay(overlay.clone());
        layer.replace_filters(vec![
            Filter::new(crate::ops::filters::FilterKind::Hue, 0.0),
            Filter::new(crate::ops::filters::FilterKind::Opacity, 1.0),
        ]);
        assert!(!layer.has_filters());

        let mut expected = base;
        expected.blend_from(&overlay).unwrap();
        assert_eq!(layer.composite(), expected);
    }

    #[test]
    fn hidden_layer_composites_transparent() {
        let mut stack = LayerStack::new(4, 4);
        let id = stack.add_layer("a");
        stack.replace_buffer(id, BufferTarget::Base, PixelBuffer::new_filled(4, 4, RED)).unwrap();
        assert_eq!(stack.composite().get(0, 0), Ok(RED));

        stack.set_visible(id, false).unwrap();
        assert!(stack.composite().is_transparent());
        assert!(stack.layer(id).unwrap().composite().is_transparent());
    }

    #[test]
    fn composite_paints_bottom_first() {
        let mut stack = LayerStack::new(2, 2);
        let bottom = stack.add_layer("bottom");
        let top = stack.add_layer("top");
        stack.replace_buffer(bottom, BufferTarget::Base, PixelBuffer::new_filled(2, 2, RED)).unwrap();
        let mut top_px = PixelBuffer::new(2, 2);
        top_px.set(1, 1, BLUE).unwrap();
        stack.replace_buffer(top, BufferTarget::Base, top_px).unwrap();

        let out = stack.composite();
        assert_eq!(out.get(0, 0), Ok(RED));
        assert_eq!(out.get(1, 1), Ok(BLUE));
    }

    #[test]
    fn removing_the_only_layer_is_rejected() {
        let mut stack = LayerStack::skin();
        let id = stack.add_layer("only");
        assert_eq!(stack.remove_layer(id).err(), Some(EditError::LastLayer));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.selected_index(), Some(0));
    }

    #[test]
    fn selection_follows_structure_changes() {
        let mut stack = LayerStack::new(2, 2);
        assert_eq!(stack.selected_index(), None);
        let a = stack.add_layer("a");
        let b = stack.add_layer("b");
        let c = stack.add_layer("c");
        assert_eq!(stack.selected_id(), Some(c));

        stack.remove_layer(c).unwrap();
        assert_eq!(stack.selected_id(), Some(b));

        stack.select_layer(b).unwrap();
        stack.move_layer(1, 0).unwrap();
        assert_eq!(stack.selected_id(), Some(b));
        assert_eq!(stack.get(1).map(Layer::id), Some(a));

        let dup = stack.duplicate_layer(a).unwrap();
        assert_eq!(stack.index_of(dup), Some(2));
        assert_eq!(stack.selected_id(), Some(dup));
    }

    #[test]
    fn events_fire_for_selection_and_filters() {
        let mut stack = LayerStack::new(2, 2);
        let a = stack.add_layer("a");
        stack.add_layer("b");
        let log = recorder(&mut stack.observers);

        stack.select(0).unwrap();
        stack.select(0).unwrap();
        stack.set_filters(a, vec![Filter::new(crate::ops::filters::FilterKind::Hue, 30.0)]).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![EditorEvent::LayersSelect, EditorEvent::UpdateFilters(a)]
        );
    }

    #[test]
    fn stale_ids_are_rejected() {
        let mut stack = LayerStack::new(2, 2);
        stack.add_layer("a");
        let ghost = LayerId::new();
        assert_eq!(stack.set_visible(ghost, false), Err(EditError::StaleTarget(ghost)));
        assert!(stack.set_filters(ghost, Vec::new()).is_err());
    }

    #[test]
    fn replace_buffer_rejects_other_sizes_and_missing_overlay() {
        let mut stack = LayerStack::new(4, 4);
        let id = stack.add_layer("a");
        assert!(matches!(
            stack.replace_buffer(id, BufferTarget::Base, PixelBuffer::new(2, 2)),
            Err(EditError::SizeMismatch { .. })
        ));
        assert_eq!(
            stack.replace_buffer(id, BufferTarget::Overlay, PixelBuffer::new(4, 4)),
            Err(EditError::MissingBuffer(BufferTarget::Overlay))
        );
    }
}
