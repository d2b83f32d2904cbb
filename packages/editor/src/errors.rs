//! Error types for the editor

use thiserror::Error;
use waypoint_parser::{BufferError, StableId};

/// Rejection of a structural edit; the document is left untouched
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("Boundary not found: {id}")]
    BoundaryNotFound { id: StableId },

    #[error("Boundary {from} does not precede {to}")]
    InvalidRange { from: StableId, to: StableId },

    #[error("Content #{index} is a {kind}, which cannot stand at the top level")]
    InvalidContent { index: usize, kind: &'static str },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Preview active: revert or accept it before {operation}")]
    PreviewConflict { operation: &'static str },

    #[error("No active preview")]
    NoActivePreview,

    #[error("Stream already finished")]
    Finished,

    #[error("Edit error: {0}")]
    Edit(#[from] EditError),

    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),
}

impl SessionError {
    pub fn preview_conflict(operation: &'static str) -> Self {
        Self::PreviewConflict { operation }
    }
}
