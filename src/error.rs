// ============================================================================
// EDIT ERRORS: every way a mutation request can be turned down
// ============================================================================
//
// None of these are fatal.  Engines return them, and the tool / panel / history
// layers swallow them as skipped or rejected edits (see `MutationResult`).
// ============================================================================

use crate::canvas::{BufferTarget, LayerId};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("coordinate ({x}, {y}) is outside the {width}×{height} buffer")]
    InvalidBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
    #[error("nothing to undo or redo")]
    EmptyStack,
    #[error("edit makes no changes")]
    NoOpEdit,
    #[error("layer {0} is no longer in the stack")]
    StaleTarget(LayerId),
    #[error("the last remaining layer cannot be removed")]
    LastLayer,
    #[error("layer {0} is hidden and cannot be edited")]
    HiddenLayer(LayerId),
    #[error("layer has no {0:?} buffer")]
    MissingBuffer(BufferTarget),
    #[error("expected a {expected_width}×{expected_height} texture, got {width}×{height}")]
    SizeMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },
}

impl EditError {
    pub fn out_of_bounds(x: i64, y: i64, width: u32, height: u32) -> Self {
        EditError::InvalidBounds { x, y, width, height }
    }

    /// Benign errors are races between UI state and core state; they are
    /// logged at info level instead of warn.
    pub fn is_benign(&self) -> bool {
        matches!(self, EditError::NoOpEdit | EditError::EmptyStack)
    }
}
