use std::collections::VecDeque;

use crate::canvas::{BufferTarget, LayerId, LayerStack, PixelBuffer};
use crate::error::EditError;
use crate::events::{EditorEvent, Observers, SubscriptionId};
use crate::ops::filters::{filters_equivalent, Filter};

/// Default undo depth.
pub const DEFAULT_MAX_HISTORY: usize = 50;
/// Default memory cap for both stacks together.
pub const DEFAULT_MAX_MEMORY_BYTES: usize = 100 * 1024 * 1024;

// ============================================================================
// HISTORY ENTRY - the closed family of undoable edits
// ============================================================================

/// One undoable edit.  The prior state is captured the first time the entry
/// is applied (or supplied up front for gestures that already drew live).
#[derive(Clone, Debug)]
pub enum HistoryEntry {
    /// Replace a layer's filter list.  `commit == false` marks a live-preview
    /// write that is applied but never pushed on its own.
    UpdateFilters {
        layer: LayerId,
        filters: Vec<Filter>,
        prior: Option<Vec<Filter>>,
        commit: bool,
    },
    /// Bake the filters (and the overlay, if any) into the base buffer, then
    /// clear the overlay and reset the filters.
    MergeFilters {
        layer: LayerId,
        prior: Option<MergePrior>,
    },
    /// Replace the base or overlay buffer.
    UpdateTexture {
        layer: LayerId,
        target: BufferTarget,
        texture: PixelBuffer,
        prior: Option<PixelBuffer>,
        description: String,
    },
}

/// What a filter merge replaced.
#[derive(Clone, Debug)]
pub struct MergePrior {
    base: PixelBuffer,
    overlay: Option<PixelBuffer>,
    filters: Vec<Filter>,
}

impl HistoryEntry {
    pub fn update_filters(layer: LayerId, filters: Vec<Filter>, commit: bool) -> Self {
        HistoryEntry::UpdateFilters {
            layer,
            filters,
            prior: None,
            commit,
        }
    }

    pub fn merge_filters(layer: LayerId) -> Self {
        HistoryEntry::MergeFilters { layer, prior: None }
    }

    pub fn update_texture(
        layer: LayerId,
        target: BufferTarget,
        texture: PixelBuffer,
        description: impl Into<String>,
    ) -> Self {
        HistoryEntry::UpdateTexture {
            layer,
            target,
            texture,
            prior: None,
            description: description.into(),
        }
    }

    /// Texture update whose new state is already on the layer (a finished
    /// stroke); `prior` is the buffer from before the gesture.
    pub fn update_texture_from(
        layer: LayerId,
        target: BufferTarget,
        prior: PixelBuffer,
        texture: PixelBuffer,
        description: impl Into<String>,
    ) -> Self {
        HistoryEntry::UpdateTexture {
            layer,
            target,
            texture,
            prior: Some(prior),
            description: description.into(),
        }
    }

    pub fn layer(&self) -> LayerId {
        match self {
            HistoryEntry::UpdateFilters { layer, .. }
            | HistoryEntry::MergeFilters { layer, .. }
            | HistoryEntry::UpdateTexture { layer, .. } => *layer,
        }
    }

    pub fn description(&self) -> String {
        match self {
            HistoryEntry::UpdateFilters { .. } => "Update Filters".to_string(),
            HistoryEntry::MergeFilters { .. } => "Merge Filters".to_string(),
            HistoryEntry::UpdateTexture { description, .. } => description.clone(),
        }
    }

    pub fn memory_size(&self) -> usize {
        let filters = |f: &[Filter]| std::mem::size_of_val(f);
        std::mem::size_of::<Self>()
            + match self {
                HistoryEntry::UpdateFilters { filters: new, prior, .. } => {
                    filters(new) + prior.as_deref().map_or(0, filters)
                }
                HistoryEntry::MergeFilters { prior, .. } => prior.as_ref().map_or(0, |p| {
                    p.base.memory_bytes()
                        + p.overlay.as_ref().map_or(0, PixelBuffer::memory_bytes)
                        + filters(&p.filters)
                }),
                HistoryEntry::UpdateTexture { texture, prior, .. } => {
                    texture.memory_bytes() + prior.as_ref().map_or(0, PixelBuffer::memory_bytes)
                }
            }
    }

    /// Forward effect.  Redo calls this again with the prior already set.
    pub fn apply(&mut self, layers: &mut LayerStack) -> Result<(), EditError> {
        match self {
            HistoryEntry::UpdateFilters { layer, filters, prior, .. } => {
                let previous = layers.set_filters(*layer, filters.clone())?;
                if prior.is_none() {
                    *prior = Some(previous);
                }
            }
            HistoryEntry::MergeFilters { layer, prior } => {
                let current = layers.layer(*layer).ok_or(EditError::StaleTarget(*layer))?;
                if !current.has_filters() {
                    return Err(EditError::NoOpEdit);
                }
                let baked = current.baked();
                let blank = current.overlay().map(|o| PixelBuffer::new(o.width(), o.height()));
                let base = layers.replace_buffer(*layer, BufferTarget::Base, baked)?;
                let overlay = match blank {
                    Some(blank) => Some(layers.replace_buffer(*layer, BufferTarget::Overlay, blank)?),
                    None => None,
                };
                let filters = layers.set_filters(*layer, Vec::new())?;
                *prior = Some(MergePrior { base, overlay, filters });
                layers.emit(EditorEvent::LayersRender);
            }
            HistoryEntry::UpdateTexture { layer, target, texture, prior, .. } => {
                if prior.as_ref() == Some(&*texture) {
                    return Err(EditError::NoOpEdit);
                }
                let previous = layers.replace_buffer(*layer, *target, texture.clone())?;
                if prior.is_none() {
                    if previous == *texture {
                        return Err(EditError::NoOpEdit);
                    }
                    *prior = Some(previous);
                }
                layers.emit(EditorEvent::LayersRender);
            }
        }
        Ok(())
    }

    /// Reverse effect: restore exactly what `apply` replaced.
    pub fn revert(&self, layers: &mut LayerStack) -> Result<(), EditError> {
        match self {
            HistoryEntry::UpdateFilters { layer, prior, .. } => {
                let prior = prior.clone().unwrap_or_default();
                layers.set_filters(*layer, prior)?;
            }
            HistoryEntry::MergeFilters { layer, prior } => {
                let Some(prior) = prior else {
                    return Err(EditError::NoOpEdit);
                };
                layers.replace_buffer(*layer, BufferTarget::Base, prior.base.clone())?;
                if let Some(overlay) = &prior.overlay {
                    layers.replace_buffer(*layer, BufferTarget::Overlay, overlay.clone())?;
                }
                layers.set_filters(*layer, prior.filters.clone())?;
                layers.emit(EditorEvent::LayersRender);
            }
            HistoryEntry::UpdateTexture { layer, target, prior, .. } => {
                let Some(prior) = prior else {
                    return Err(EditError::NoOpEdit);
                };
                layers.replace_buffer(*layer, *target, prior.clone())?;
                layers.emit(EditorEvent::LayersRender);
            }
        }
        Ok(())
    }
}

// ============================================================================
// HISTORY MANAGER - Manages undo/redo stacks with memory limits
// ============================================================================

/// A filter drag in progress: the layer and its filters before the drag.
#[derive(Clone, Debug)]
struct PendingGesture {
    layer: LayerId,
    prior: Vec<Filter>,
}

pub struct HistoryManager {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    max_history_size: usize,
    /// Optional memory cap in bytes.
    max_memory_bytes: Option<usize>,
    /// Running memory total across both stacks.
    total_memory: usize,
    pending: Option<PendingGesture>,
    observers: Observers,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl HistoryManager {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_size: max_history_size.max(1),
            max_memory_bytes: Some(DEFAULT_MAX_MEMORY_BYTES),
            total_memory: 0,
            pending: None,
            observers: Observers::new(),
        }
    }

    pub fn with_memory_limit(mut self, max_memory_bytes: Option<usize>) -> Self {
        self.max_memory_bytes = max_memory_bytes;
        self.prune();
        self
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

    /// Apply an entry and, when it is a final edit, push it.  Returns `true`
    /// if the entry took effect (provisional writes included).
    pub fn commit(&mut self, entry: HistoryEntry, layers: &mut LayerStack) -> bool {
        let layer = entry.layer();
        if !layers.contains(layer) {
            crate::log_warn!("History: rejected '{}' for stale layer {}", entry.description(), layer);
            return false;
        }

        match entry {
            HistoryEntry::UpdateFilters { layer, filters, commit: false, .. } => {
                self.provisional(layer, filters, layers)
            }
            HistoryEntry::UpdateFilters { layer, filters, commit: true, .. } => {
                self.commit_filters(layer, filters, layers)
            }
            mut entry => {
                // Any other edit ends a filter drag where it stands.
                self.pending = None;
                match entry.apply(layers) {
                    Ok(()) => {
                        self.push(entry);
                        true
                    }
                    Err(e) => {
                        log_rejection(&entry.description(), &e);
                        false
                    }
                }
            }
        }
    }

    fn provisional(&mut self, layer: LayerId, filters: Vec<Filter>, layers: &mut LayerStack) -> bool {
        let stale = self.pending.as_ref().map(|p| p.layer).filter(|&owner| owner != layer);
        if let Some(owner) = stale {
            crate::log_warn!("History: filter drag on {} abandoned by a write to {}", owner, layer);
            self.pending = None;
        }
        if self.pending.is_none() {
            let prior = layers.layer(layer).map(|l| l.filters().to_vec()).unwrap_or_default();
            self.pending = Some(PendingGesture { layer, prior });
        }
        match layers.set_filters(layer, filters) {
            Ok(_) => true,
            Err(e) => {
                log_rejection("Update Filters", &e);
                self.pending = None;
                false
            }
        }
    }

    fn commit_filters(&mut self, layer: LayerId, filters: Vec<Filter>, layers: &mut LayerStack) -> bool {
        let current = layers.layer(layer).map(|l| l.filters().to_vec()).unwrap_or_default();
        let gesture = match self.pending.take() {
            Some(pending) if pending.layer == layer => Some(pending.prior),
            _ => None,
        };
        let in_gesture = gesture.is_some();
        let prior = gesture.unwrap_or(current);

        if filters_equivalent(&prior, &filters) {
            if in_gesture {
                // Drag ended where it started: show the final value, keep history as is.
                let _ = layers.set_filters(layer, filters);
            }
            log_rejection("Update Filters", &EditError::NoOpEdit);
            return false;
        }

        let mut entry = HistoryEntry::UpdateFilters {
            layer,
            filters,
            prior: Some(prior),
            commit: true,
        };
        match entry.apply(layers) {
            Ok(()) => {
                self.push(entry);
                true
            }
            Err(e) => {
                log_rejection("Update Filters", &e);
                false
            }
        }
    }

    /// Roll a pending filter drag back to where it started.
    pub fn revert_provisional(&mut self, layers: &mut LayerStack) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        layers.set_filters(pending.layer, pending.prior).is_ok()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn push(&mut self, entry: HistoryEntry) {
        // Clear redo stack when a new action is performed
        for e in self.redo_stack.drain(..) {
            self.total_memory = self.total_memory.saturating_sub(e.memory_size());
        }

        self.total_memory += entry.memory_size();
        self.undo_stack.push_back(entry);

        self.prune();
        self.observers.emit(EditorEvent::Update);
    }

    pub fn undo(&mut self, layers: &mut LayerStack) -> Option<String> {
        self.revert_provisional(layers);
        let entry = self.undo_stack.pop_back()?;
        let description = entry.description();
        match entry.revert(layers) {
            Ok(()) => {
                self.redo_stack.push_back(entry);
                self.observers.emit(EditorEvent::Update);
                Some(description)
            }
            Err(e) => {
                self.total_memory = self.total_memory.saturating_sub(entry.memory_size());
                log_rejection(&description, &e);
                None
            }
        }
    }

    pub fn redo(&mut self, layers: &mut LayerStack) -> Option<String> {
        self.revert_provisional(layers);
        let mut entry = self.redo_stack.pop_back()?;
        let description = entry.description();
        match entry.apply(layers) {
            Ok(()) => {
                self.undo_stack.push_back(entry);
                self.observers.emit(EditorEvent::Update);
                Some(description)
            }
            Err(e) => {
                self.total_memory = self.total_memory.saturating_sub(entry.memory_size());
                log_rejection(&description, &e);
                None
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|e| e.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.back().map(|e| e.description())
    }

    /// Get all undo descriptions (most recent first)
    pub fn undo_history(&self) -> Vec<String> {
        self.undo_stack.iter().rev().map(|e| e.description()).collect()
    }

    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    /// Prune old entries to stay within limits
    fn prune(&mut self) {
        while self.undo_stack.len() > self.max_history_size {
            if let Some(removed) = self.undo_stack.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            }
        }

        if let Some(max_bytes) = self.max_memory_bytes {
            while self.total_memory > max_bytes && self.undo_stack.len() > 1 {
                if let Some(removed) = self.undo_stack.pop_front() {
                    self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_memory = 0;
        self.pending = None;
    }

    /// Undo `index` steps (position in `undo_history()`, 0 = most recent).
    pub fn undo_to(&mut self, index: usize, layers: &mut LayerStack) {
        for _ in 0..index {
            if self.undo(layers).is_none() {
                break;
            }
        }
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}

impl std::fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryManager")
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("memory", &self.total_memory)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

fn log_rejection(what: &str, err: &EditError) {
    if err.is_benign() {
        crate::log_info!("History: skipped '{}': {}", what, err);
    } else {
        crate::log_warn!("History: rejected '{}': {}", what, err);
    }
}
