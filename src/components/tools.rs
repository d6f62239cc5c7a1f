use image::Rgba;

use crate::canvas::{BufferTarget, LayerId, LayerStack, PixelBuffer};
use crate::components::history::{HistoryEntry, HistoryManager};
use crate::error::EditError;
use crate::events::EditorEvent;
use crate::ops::fill::{self, BlendPalette, FillRequest, RandomSource};
use crate::ops::skin_layout::SkinVariant;
use crate::ops::stroke::{self, Brush, Paint};

// ============================================================================
// TOOLS: the closed set of editing tools
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum Tool {
    Bucket(BucketOptions),
    Pencil(StrokeOptions),
    Erase(StrokeOptions),
}

impl Default for Tool {
    fn default() -> Self {
        Tool::Pencil(StrokeOptions::default())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BucketOptions {
    /// Replace every matching texel, not just the connected area.
    pub replace_all: bool,
    pub camo: bool,
    pub camo_range: f32,
    pub blend: bool,
    pub palette: BlendPalette,
}

impl Default for BucketOptions {
    fn default() -> Self {
        Self {
            replace_all: false,
            camo: false,
            camo_range: 0.1,
            blend: false,
            palette: BlendPalette::new(Vec::new(), 5),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct StrokeOptions {
    pub brush: Brush,
    /// Mirror every stamp across the skin's left/right axis.
    pub mirror: bool,
}

/// Everything a tool needs, passed explicitly instead of read from globals.
pub struct ToolContext<'a> {
    pub layers: &'a mut LayerStack,
    pub history: &'a mut HistoryManager,
    pub layer: LayerId,
    pub target: BufferTarget,
    pub color: Rgba<u8>,
    pub variant: SkinVariant,
    pub rng: &'a mut dyn RandomSource,
}

/// Outcome of a tool application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationResult {
    /// One history entry was pushed.
    Committed,
    /// Nothing to do (no-op edit); nothing pushed.
    Skipped(EditError),
    /// The request was invalid for the current state; nothing changed.
    Rejected(EditError),
}

impl MutationResult {
    pub fn is_committed(&self) -> bool {
        matches!(self, MutationResult::Committed)
    }

    fn from_error(err: EditError) -> Self {
        if err.is_benign() {
            MutationResult::Skipped(err)
        } else {
            MutationResult::Rejected(err)
        }
    }
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Bucket(_) => "Bucket",
            Tool::Pencil(_) => "Pencil",
            Tool::Erase(_) => "Erase",
        }
    }

    /// Run the tool over `points` (one point for a click, several for a drag)
    /// and commit the result as a single history entry.
    pub fn apply(&self, ctx: &mut ToolContext<'_>, points: &[(i64, i64)]) -> MutationResult {
        if let Err(e) = editable_buffer(ctx.layers, ctx.layer, ctx.target) {
            crate::log_warn!("{}: {}", self.label(), e);
            return MutationResult::Rejected(e);
        }
        let Some(&(x, y)) = points.first() else {
            return MutationResult::Skipped(EditError::NoOpEdit);
        };

        match self {
            Tool::Bucket(opts) => {
                let request = FillRequest {
                    x,
                    y,
                    color: ctx.color,
                    replace_all: opts.replace_all,
                    camo: opts.camo.then_some(opts.camo_range),
                    blend: opts.blend,
                };
                let filled = editable_buffer(ctx.layers, ctx.layer, ctx.target)
                    .and_then(|buf| fill::fill(buf, &request, &opts.palette, &mut *ctx.rng));
                match filled {
                    Ok(texture) => {
                        let entry = HistoryEntry::update_texture(ctx.layer, ctx.target, texture, self.label());
                        if ctx.history.commit(entry, ctx.layers) {
                            MutationResult::Committed
                        } else {
                            MutationResult::Skipped(EditError::NoOpEdit)
                        }
                    }
                    Err(e) => MutationResult::from_error(e),
                }
            }
            Tool::Pencil(opts) | Tool::Erase(opts) => {
                let paint = match self {
                    Tool::Erase(_) => Paint::Erase,
                    _ => Paint::Color(ctx.color),
                };
                let mirror = opts.mirror.then_some(ctx.variant);
                let mut tracker = StrokeTracker::default();
                if let Err(e) = tracker.start(ctx.layers, ctx.layer, ctx.target, opts.brush, paint, mirror, self.label()) {
                    return MutationResult::Rejected(e);
                }
                for &point in points {
                    if let Err(e) = tracker.stroke_to(ctx.layers, point)
                        && !matches!(e, EditError::InvalidBounds { .. })
                    {
                        tracker.cancel(ctx.layers);
                        return MutationResult::Rejected(e);
                    }
                }
                tracker.finish(ctx.layers, ctx.history)
            }
        }
    }
}

/// The buffer a tool would draw on, if drawing is allowed.
fn editable_buffer(layers: &LayerStack, id: LayerId, target: BufferTarget) -> Result<&PixelBuffer, EditError> {
    let layer = layers.layer(id).ok_or(EditError::StaleTarget(id))?;
    if !layer.is_visible() {
        return Err(EditError::HiddenLayer(id));
    }
    layer.buffer(target).ok_or(EditError::MissingBuffer(target))
}

// ============================================================================
// STROKE TRACKER: live drawing with a single undo step per gesture
// ============================================================================

/// Tracks one pencil/erase drag.  Stamps go straight onto the layer so the
/// composite updates live; `finish` commits the whole drag against the
/// snapshot taken at `start`.
#[derive(Debug, Default)]
pub struct StrokeTracker {
    /// Whether a stroke is currently in progress
    pub is_active: bool,
    layer: Option<LayerId>,
    target: BufferTarget,
    /// Buffer contents at stroke start
    snapshot: Option<PixelBuffer>,
    brush: Brush,
    paint: Option<Paint>,
    mirror: Option<SkinVariant>,
    last: Option<(i64, i64)>,
    /// Description of the stroke (e.g., "Pencil", "Erase")
    pub description: String,
}

impl StrokeTracker {
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        &mut self,
        layers: &LayerStack,
        layer: LayerId,
        target: BufferTarget,
        brush: Brush,
        paint: Paint,
        mirror: Option<SkinVariant>,
        description: &str,
    ) -> Result<(), EditError> {
        let buffer = editable_buffer(layers, layer, target)?;
        self.is_active = true;
        self.layer = Some(layer);
        self.target = target;
        self.snapshot = Some(buffer.clone());
        self.brush = brush;
        self.paint = Some(paint);
        self.mirror = mirror;
        self.last = None;
        self.description = description.to_string();
        Ok(())
    }

    /// Draw from the previous point to `point`.
    pub fn stroke_to(&mut self, layers: &mut LayerStack, point: (i64, i64)) -> Result<(), EditError> {
        let (Some(layer), Some(paint)) = (self.layer.filter(|_| self.is_active), self.paint) else {
            return Err(EditError::NoOpEdit);
        };
        let points: Vec<(i64, i64)> = match self.last {
            Some(last) => vec![last, point],
            None => vec![point],
        };
        self.last = Some(point);

        let buffer = layers
            .layer_mut(layer)?
            .buffer_mut(self.target)
            .ok_or(EditError::MissingBuffer(self.target))?;
        let drawn = stroke::stroke(buffer, &points, &self.brush, paint, self.mirror);
        layers.emit(EditorEvent::LayersRender);
        drawn
    }

    /// Commit the drag as one `UpdateTexture` entry.
    pub fn finish(&mut self, layers: &mut LayerStack, history: &mut HistoryManager) -> MutationResult {
        let (Some(layer), Some(snapshot)) = (self.layer, self.snapshot.take()) else {
            self.reset();
            return MutationResult::Skipped(EditError::NoOpEdit);
        };
        let target = self.target;
        let description = std::mem::take(&mut self.description);
        self.reset();

        let Some(current) = layers.layer(layer).and_then(|l| l.buffer(target)).cloned() else {
            return MutationResult::Rejected(EditError::StaleTarget(layer));
        };
        if current == snapshot {
            return MutationResult::Skipped(EditError::NoOpEdit);
        }
        let entry = HistoryEntry::update_texture_from(layer, target, snapshot, current, description);
        if history.commit(entry, layers) {
            MutationResult::Committed
        } else {
            MutationResult::Rejected(EditError::StaleTarget(layer))
        }
    }

    /// Abandon the drag and put the snapshot back.
    pub fn cancel(&mut self, layers: &mut LayerStack) {
        if let (Some(layer), Some(snapshot)) = (self.layer, self.snapshot.take()) {
            if layers.replace_buffer(layer, self.target, snapshot).is_ok() {
                layers.emit(EditorEvent::LayersRender);
            }
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.is_active = false;
        self.layer = None;
        self.snapshot = None;
        self.paint = None;
        self.last = None;
        self.description.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::fill::HashRng;
    use crate::ops::stroke::BrushShape;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    struct Fixture {
        layers: LayerStack,
        history: HistoryManager,
        rng: HashRng,
        layer: LayerId,
    }

    impl Fixture {
        fn new(width: u32, height: u32, fill: Rgba<u8>) -> Self {
            let mut layers = LayerStack::new(width, height);
            let layer = layers.add_layer("Layer 1");
            layers
                .replace_buffer(layer, BufferTarget::Base, PixelBuffer::new_filled(width, height, fill))
                .unwrap();
            Self {
                layers,
                history: HistoryManager::default(),
                rng: HashRng::new(1),
                layer,
            }
        }

        fn run(&mut self, tool: &Tool, points: &[(i64, i64)]) -> MutationResult {
            let mut ctx = ToolContext {
                layers: &mut self.layers,
                history: &mut self.history,
                layer: self.layer,
                target: BufferTarget::Base,
                color: RED,
                variant: SkinVariant::Classic,
                rng: &mut self.rng,
            };
            tool.apply(&mut ctx, points)
        }

        fn base(&self) -> &PixelBuffer {
            self.layers.layer(self.layer).unwrap().base()
        }
    }

    #[test]
    fn bucket_on_black_square_commits_once() {
        let mut fx = Fixture::new(4, 4, BLACK);
        let bucket = Tool::Bucket(BucketOptions::default());

        assert_eq!(fx.run(&bucket, &[(1, 1)]), MutationResult::Committed);
        assert!(fx.base().pixels().all(|p| *p == RED));
        assert_eq!(fx.history.undo_count(), 1);

        assert_eq!(fx.run(&bucket, &[(1, 1)]), MutationResult::Skipped(EditError::NoOpEdit));
        assert_eq!(fx.history.undo_count(), 1);
    }

    #[test]
    fn hidden_layer_rejects_every_tool() {
        let mut fx = Fixture::new(4, 4, BLACK);
        fx.layers.set_visible(fx.layer, false).unwrap();
        let id = fx.layer;
        for tool in [
            Tool::Bucket(BucketOptions::default()),
            Tool::Pencil(StrokeOptions::default()),
            Tool::Erase(StrokeOptions::default()),
        ] {
            assert_eq!(fx.run(&tool, &[(0, 0)]), MutationResult::Rejected(EditError::HiddenLayer(id)));
        }
        assert!(fx.base().pixels().all(|p| *p == BLACK));
        assert_eq!(fx.history.undo_count(), 0);
    }

    #[test]
    fn pencil_drag_is_one_undo_step() {
        let mut fx = Fixture::new(8, 8, BLACK);
        let pencil = Tool::Pencil(StrokeOptions {
            brush: Brush::new(BrushShape::Square, 1),
            mirror: false,
        });
        assert_eq!(fx.run(&pencil, &[(0, 0), (3, 0), (3, 3)]), MutationResult::Committed);
        assert_eq!(fx.base().pixels().filter(|p| **p == RED).count(), 7);
        assert_eq!(fx.history.undo_count(), 1);
        assert_eq!(fx.history.undo_description().as_deref(), Some("Pencil"));

        fx.history.undo(&mut fx.layers);
        assert!(fx.base().pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn erase_clears_to_transparent() {
        let mut fx = Fixture::new(4, 4, BLACK);
        let erase = Tool::Erase(StrokeOptions::default());
        assert!(fx.run(&erase, &[(2, 2)]).is_committed());
        assert_eq!(fx.base().get(2, 2), Ok(Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn stroke_off_canvas_is_skipped() {
        let mut fx = Fixture::new(4, 4, BLACK);
        let pencil = Tool::Pencil(StrokeOptions::default());
        assert_eq!(fx.run(&pencil, &[(10, 10)]), MutationResult::Skipped(EditError::NoOpEdit));
        assert_eq!(fx.history.undo_count(), 0);
    }

    #[test]
    fn tracker_cancel_restores_snapshot() {
        let mut fx = Fixture::new(4, 4, BLACK);
        let mut tracker = StrokeTracker::default();
        tracker
            .start(&fx.layers, fx.layer, BufferTarget::Base, Brush::default(), Paint::Color(RED), None, "Pencil")
            .unwrap();
        tracker.stroke_to(&mut fx.layers, (1, 1)).unwrap();
        assert_eq!(fx.base().get(1, 1), Ok(RED));

        tracker.cancel(&mut fx.layers);
        assert!(!tracker.is_active);
        assert_eq!(fx.base().get(1, 1), Ok(BLACK));
        assert_eq!(fx.history.undo_count(), 0);
    }
}
