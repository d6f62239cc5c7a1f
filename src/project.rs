use std::path::{Path, PathBuf};
use uuid::Uuid;

use image::Rgba;

use crate::canvas::{BufferTarget, Layer, LayerId, LayerStack, PixelBuffer};
use crate::components::history::{HistoryEntry, HistoryManager};
use crate::components::layers::LayersPanel;
use crate::components::tools::{MutationResult, Tool, ToolContext};
use crate::error::EditError;
use crate::ops::fill::RandomSource;
use crate::ops::filters::FilterKind;
use crate::ops::skin_layout::{SKIN_HEIGHT, SKIN_WIDTH};
use crate::ops::transform::TextureOp;
use crate::settings::EditorSettings;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Single open document.
pub struct Project {
    pub id: Uuid,
    pub layers: LayerStack,
    pub history: HistoryManager,
    pub panel: LayersPanel,
    pub settings: EditorSettings,
    /// `None` for unsaved/untitled files.
    pub path: Option<PathBuf>,
    pub is_dirty: bool,

    /// Display name (derived from path or "Untitled-X")
    pub name: String,
}

impl Project {
    pub fn new_untitled(untitled_counter: usize, settings: EditorSettings) -> Self {
        let mut layers = LayerStack::skin();
        layers.add_layer("Layer 1");
        Self::with_layers(format!("Untitled-{}", untitled_counter), layers, settings)
    }

    /// Wrap a skin image as a single-layer project.
    pub fn from_image(name: impl Into<String>, image: image::RgbaImage, settings: EditorSettings) -> Result<Self, EditError> {
        let name = name.into();
        let mut layers = LayerStack::skin();
        layers.insert_layer(Layer::from_buffer(name.clone(), PixelBuffer::from_image(image)))?;
        Ok(Self::with_layers(name, layers, settings))
    }

    pub fn open(path: &Path, settings: EditorSettings) -> Result<Self, ProjectError> {
        let image = image::open(path)?.to_rgba8();
        let mut project = Self::from_image(file_name(path), image, settings)?;
        project.path = Some(path.to_path_buf());
        crate::log_info!("Opened {} ({}x{})", path.display(), SKIN_WIDTH, SKIN_HEIGHT);
        Ok(project)
    }

    fn with_layers(name: String, layers: LayerStack, settings: EditorSettings) -> Self {
        let history = settings.history();
        let mut panel = LayersPanel::new();
        panel.refresh(&layers);
        Self {
            id: Uuid::new_v4(),
            layers,
            history,
            panel,
            settings,
            path: None,
            is_dirty: false,
            name,
        }
    }

    /// Write the flattened composite as PNG.
    pub fn export_png(&self, path: &Path) -> Result<(), ProjectError> {
        self.layers
            .composite()
            .into_image()
            .save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    pub fn composite(&self) -> PixelBuffer {
        self.layers.composite()
    }

    // ---- editing ------------------------------------------------------------

    pub fn commit(&mut self, entry: HistoryEntry) -> bool {
        let committed = self.history.commit(entry, &mut self.layers);
        if committed {
            self.mark_dirty();
        }
        committed
    }

    pub fn undo(&mut self) -> Option<String> {
        let done = self.history.undo(&mut self.layers);
        self.after_history_step(done.is_some());
        done
    }

    pub fn redo(&mut self) -> Option<String> {
        let done = self.history.redo(&mut self.layers);
        self.after_history_step(done.is_some());
        done
    }

    fn after_history_step(&mut self, changed: bool) {
        if changed {
            self.mark_dirty();
        }
        self.panel.refresh(&self.layers);
    }

    /// Apply a tool to the selected layer.
    pub fn apply_tool(
        &mut self,
        tool: &Tool,
        target: BufferTarget,
        color: Rgba<u8>,
        points: &[(i64, i64)],
        rng: &mut dyn RandomSource,
    ) -> MutationResult {
        let Some(layer) = self.layers.selected_id() else {
            return MutationResult::Rejected(EditError::EmptyStack);
        };
        let mut ctx = ToolContext {
            layers: &mut self.layers,
            history: &mut self.history,
            layer,
            target,
            color,
            variant: self.settings.variant,
            rng,
        };
        let result = tool.apply(&mut ctx, points);
        if result.is_committed() {
            self.mark_dirty();
        }
        result
    }

    // ---- layers ---------------------------------------------------------------

    /// Add an empty layer above the selection and select it.
    pub fn add_layer(&mut self, name: impl Into<String>) -> LayerId {
        let id = self.layers.add_layer(name);
        self.panel.refresh(&self.layers);
        self.mark_dirty();
        id
    }

    pub fn select_layer(&mut self, id: LayerId) -> Result<(), EditError> {
        self.layers.select_layer(id)?;
        self.panel.refresh(&self.layers);
        Ok(())
    }

    pub fn remove_layer(&mut self, id: LayerId) -> Result<Layer, EditError> {
        let removed = self.layers.remove_layer(id)?;
        self.panel.refresh(&self.layers);
        self.mark_dirty();
        Ok(removed)
    }

    pub fn set_filter(&mut self, kind: FilterKind, value: f32, commit: bool) -> bool {
        let changed = self.panel.set_slider(kind, value, commit, &mut self.layers, &mut self.history);
        if changed && commit {
            self.mark_dirty();
        }
        changed
    }

    pub fn merge_filters(&mut self) -> bool {
        let merged = self.panel.merge_filters(&mut self.layers, &mut self.history);
        if merged {
            self.mark_dirty();
        }
        merged
    }

    pub fn texture_op(&mut self, op: TextureOp) -> MutationResult {
        let result = self
            .panel
            .texture_op(op, self.settings.variant, &mut self.layers, &mut self.history);
        if result.is_committed() {
            self.mark_dirty();
        }
        result
    }

    // ---- document state -------------------------------------------------------

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    pub fn update_name_from_path(&mut self) {
        if let Some(ref path) = self.path {
            self.name = file_name(path);
        }
    }

    /// Get the display title (name with dirty indicator)
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::tools::BucketOptions;
    use crate::ops::fill::HashRng;
    use crate::ops::filters::Filter;

    #[test]
    fn untitled_project_has_one_skin_layer() {
        let project = Project::new_untitled(3, EditorSettings::default());
        assert_eq!(project.layers.len(), 1);
        assert_eq!(project.layers.width(), 64);
        assert_eq!(project.display_title(), "Untitled-3");
    }

    #[test]
    fn edits_mark_dirty_and_undo_restores() {
        let mut project = Project::new_untitled(1, EditorSettings::default());
        let mut rng = HashRng::new(3);
        let tool = Tool::Bucket(BucketOptions::default());
        let red = Rgba([255, 0, 0, 255]);

        let result = project.apply_tool(&tool, BufferTarget::Base, red, &[(0, 0)], &mut rng);
        assert_eq!(result, MutationResult::Committed);
        assert!(project.is_dirty);
        assert_eq!(project.composite().get(63, 63), Ok(red));

        assert_eq!(project.undo().as_deref(), Some("Bucket"));
        assert!(project.composite().is_transparent());
    }

    #[test]
    fn undo_refreshes_panel_sliders() {
        let mut project = Project::new_untitled(1, EditorSettings::default());
        assert!(project.set_filter(FilterKind::Hue, 45.0, true));
        assert_eq!(project.panel.slider(FilterKind::Hue), 45.0);
        project.undo();
        assert_eq!(project.panel.slider(FilterKind::Hue), 0.0);
    }

    #[test]
    fn new_layer_starts_with_default_sliders() {
        let mut project = Project::new_untitled(1, EditorSettings::default());
        let first = project.layers.selected_id().unwrap();
        assert!(project.set_filter(FilterKind::Hue, 90.0, true));

        let second = project.add_layer("Layer 2");
        assert_eq!(project.panel.slider(FilterKind::Hue), 0.0);
        assert!(project.set_filter(FilterKind::Opacity, 0.5, true));
        assert_eq!(project.layers.layer(second).unwrap().filters(), &[Filter::opacity(0.5)]);

        project.select_layer(first).unwrap();
        assert_eq!(project.panel.slider(FilterKind::Hue), 90.0);
        assert_eq!(project.panel.slider(FilterKind::Opacity), 1.0);
    }

    #[test]
    fn non_skin_images_are_rejected() {
        let image = image::RgbaImage::new(64, 32);
        assert!(matches!(
            Project::from_image("legacy", image, EditorSettings::default()),
            Err(EditError::SizeMismatch { height: 32, .. })
        ));
    }
}
