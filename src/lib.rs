//! SkinFE: editing core for 64x64 player skin textures.
//!
//! Layers with non-destructive colour filters, bucket/pencil/eraser tools
//! with left/right mirroring, whole-texture operations that understand the
//! skin UV layout, and a bounded undo/redo history.

#![allow(clippy::too_many_arguments)]

#[macro_use]
pub mod logger;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod error;
pub mod events;
pub mod ops;
pub mod project;
pub mod settings;

pub use canvas::{BufferTarget, Layer, LayerId, LayerStack, PixelBuffer};
pub use error::EditError;
pub use project::Project;
