use crate::canvas::{BufferTarget, LayerId, LayerStack};
use crate::components::history::{HistoryEntry, HistoryManager};
use crate::components::tools::MutationResult;
use crate::error::EditError;
use crate::ops::filters::{filters_equivalent, Filter, FilterKind, FilterPipeline};
use crate::ops::skin_layout::SkinVariant;
use crate::ops::transform::TextureOp;

// ============================================================================
// LAYERS PANEL: filter sliders, filter clipboard and texture operations
// ============================================================================

/// Why the selected layer may not look the way the user expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerWarning {
    /// Drawing is disabled while the layer is hidden.
    Hidden,
    /// Pixels are drawn under non-default filters.
    HasFilters,
}

impl LayerWarning {
    pub fn message(&self) -> &'static str {
        match self {
            LayerWarning::Hidden => "This layer is hidden and cannot be drawn on",
            LayerWarning::HasFilters => "Filters are applied on top of what you draw",
        }
    }
}

/// Controller state behind the layers panel.  Operations act on the selected
/// layer of the stack they are handed.
#[derive(Clone, Debug, Default)]
pub struct LayersPanel {
    sliders: FilterPipeline,
    /// Owned copy of a layer's filters, compared by value on paste.
    clipboard: Option<Vec<Filter>>,
}

impl LayersPanel {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- sliders ------------------------------------------------------------

    pub fn slider(&self, kind: FilterKind) -> f32 {
        self.sliders.get(kind)
    }

    pub fn sliders(&self) -> &FilterPipeline {
        &self.sliders
    }

    /// Re-read the slider values from the selected layer.  Call on
    /// `LayersSelect` and after undo/redo.
    pub fn refresh(&mut self, layers: &LayerStack) {
        self.sliders = layers
            .selected_layer()
            .map(|l| FilterPipeline::from_filters(l.filters()))
            .unwrap_or_default();
    }

    /// Move one slider.  `commit == false` while dragging, `true` on release.
    /// The other sliders are re-read from the selected layer first, so a
    /// selection change the panel missed never leaks old values across.
    pub fn set_slider(
        &mut self,
        kind: FilterKind,
        value: f32,
        commit: bool,
        layers: &mut LayerStack,
        history: &mut HistoryManager,
    ) -> bool {
        self.refresh(layers);
        self.sliders.set(kind, value);
        self.sync_filters(commit, layers, history)
    }

    /// Push the slider state to the selected layer.
    pub fn sync_filters(&mut self, commit: bool, layers: &mut LayerStack, history: &mut HistoryManager) -> bool {
        let Some(id) = layers.selected_id() else {
            return false;
        };
        let entry = HistoryEntry::update_filters(id, self.sliders.to_filters(), commit);
        history.commit(entry, layers)
    }

    pub fn reset_slider(&mut self, kind: FilterKind, layers: &mut LayerStack, history: &mut HistoryManager) -> bool {
        self.set_slider(kind, kind.default_value(), true, layers, history)
    }

    /// Reset every filter of the selected layer in one undo step.
    pub fn reset_sliders(&mut self, layers: &mut LayerStack, history: &mut HistoryManager) -> bool {
        let Some(layer) = layers.selected_layer() else {
            return false;
        };
        if !layer.has_filters() {
            return false;
        }
        self.sliders = FilterPipeline::default();
        self.sync_filters(true, layers, history)
    }

    /// Bake the selected layer's filters into its pixels.
    pub fn merge_filters(&mut self, layers: &mut LayerStack, history: &mut HistoryManager) -> bool {
        let Some(layer) = layers.selected_layer() else {
            return false;
        };
        if !layer.has_filters() {
            return false;
        }
        let id = layer.id();
        let merged = history.commit(HistoryEntry::merge_filters(id), layers);
        self.refresh(layers);
        merged
    }

    // ---- clipboard ------------------------------------------------------------

    /// Copy the selected layer's filters.  Nothing is copied from a layer
    /// without filters.
    pub fn copy_filters(&mut self, layers: &LayerStack) -> bool {
        match layers.selected_layer() {
            Some(layer) if layer.has_filters() => {
                self.clipboard = Some(layer.filters().to_vec());
                true
            }
            _ => false,
        }
    }

    pub fn paste_filters(&mut self, layers: &mut LayerStack, history: &mut HistoryManager) -> bool {
        let Some(clip) = self.clipboard.clone() else {
            return false;
        };
        let Some(id) = layers.selected_id() else {
            return false;
        };
        if self.clipboard_matches(layers) {
            return false;
        }
        let pasted = history.commit(HistoryEntry::update_filters(id, clip, true), layers);
        self.refresh(layers);
        pasted
    }

    pub fn clipboard(&self) -> Option<&[Filter]> {
        self.clipboard.as_deref()
    }

    pub fn has_clipboard(&self) -> bool {
        self.clipboard.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Whether pasting would change nothing on the selected layer.
    pub fn clipboard_matches(&self, layers: &LayerStack) -> bool {
        match (&self.clipboard, layers.selected_layer()) {
            (Some(clip), Some(layer)) => filters_equivalent(clip, layer.filters()),
            _ => false,
        }
    }

    // ---- texture operations -------------------------------------------------

    /// Run a texture operation on the selected layer's base and commit it.
    pub fn texture_op(
        &mut self,
        op: TextureOp,
        variant: SkinVariant,
        layers: &mut LayerStack,
        history: &mut HistoryManager,
    ) -> MutationResult {
        let Some(layer) = layers.selected_layer() else {
            return MutationResult::Rejected(EditError::EmptyStack);
        };
        let id: LayerId = layer.id();
        let texture = match layer.transformed_base(op, variant) {
            Ok(t) => t,
            Err(e) => {
                crate::log_warn!("{}: {}", op.label(), e);
                return MutationResult::Rejected(e);
            }
        };
        if texture == *layer.base() {
            return MutationResult::Skipped(EditError::NoOpEdit);
        }
        let entry = HistoryEntry::update_texture(id, BufferTarget::Base, texture, op.label());
        if history.commit(entry, layers) {
            MutationResult::Committed
        } else {
            MutationResult::Rejected(EditError::StaleTarget(id))
        }
    }

    pub fn swap_front_back(&mut self, variant: SkinVariant, layers: &mut LayerStack, history: &mut HistoryManager) -> MutationResult {
        self.texture_op(TextureOp::SwapFrontBack, variant, layers, history)
    }

    pub fn swap_left_right(&mut self, variant: SkinVariant, layers: &mut LayerStack, history: &mut HistoryManager) -> MutationResult {
        self.texture_op(TextureOp::SwapLeftRight, variant, layers, history)
    }

    pub fn swap_body_overlay(&mut self, variant: SkinVariant, layers: &mut LayerStack, history: &mut HistoryManager) -> MutationResult {
        self.texture_op(TextureOp::SwapBodyOverlay, variant, layers, history)
    }

    pub fn clear_base(&mut self, variant: SkinVariant, layers: &mut LayerStack, history: &mut HistoryManager) -> MutationResult {
        self.texture_op(TextureOp::ClearBase, variant, layers, history)
    }

    pub fn clear_overlay(&mut self, variant: SkinVariant, layers: &mut LayerStack, history: &mut HistoryManager) -> MutationResult {
        self.texture_op(TextureOp::ClearOverlay, variant, layers, history)
    }

    pub fn flatten_overlay(&mut self, variant: SkinVariant, layers: &mut LayerStack, history: &mut HistoryManager) -> MutationResult {
        self.texture_op(TextureOp::FlattenOverlay, variant, layers, history)
    }

    // ---- state ----------------------------------------------------------------

    pub fn warning(&self, layers: &LayerStack) -> Option<LayerWarning> {
        let layer = layers.selected_layer()?;
        if !layer.is_visible() {
            Some(LayerWarning::Hidden)
        } else if layer.has_filters() {
            Some(LayerWarning::HasFilters)
        } else {
            None
        }
    }
}
