//! # Undo/Redo Stack
//!
//! Tracks accepted proposals and enables undo/redo.
//!
//! ## Design
//!
//! - Each entry holds the proposal to apply to move one step
//! - Undo applies the inverse and pushes what undoes *that* onto the redo stack
//! - Redo is the mirror image, so ids minted by the first apply come back
//! - New entries clear the redo stack

use crate::errors::EditError;
use crate::proposal::{apply, Proposal};
use waypoint_parser::{Document, StableId};

/// One undoable step
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Proposal that moves the document one step
    pub proposal: Proposal,

    /// Optional description of this step
    pub description: Option<String>,
}

/// Undo/redo stack for accepted proposals
#[derive(Debug)]
pub struct UndoStack {
    /// Inverses of applied proposals (most recent last)
    undo_stack: Vec<HistoryEntry>,

    /// Re-applications of undone proposals (most recent last)
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    /// Apply a proposal and record it for undo
    pub fn apply(&mut self, proposal: &Proposal, doc: &mut Document) -> Result<(), EditError> {
        let applied = apply(doc, proposal)?;
        *doc = applied.document;
        self.record(applied.inverse, None);
        Ok(())
    }

    /// Record the inverse of a proposal that was already applied
    pub fn record(&mut self, inverse: Proposal, description: Option<String>) {
        self.undo_stack.push(HistoryEntry {
            proposal: inverse,
            description,
        });

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // New action invalidates future
        self.redo_stack.clear();
    }

    /// Undo the most recent step
    pub fn undo(&mut self, doc: &mut Document) -> Result<bool, EditError> {
        let Some(entry) = self.undo_stack.pop() else {
            return Ok(false);
        };

        match apply(doc, &entry.proposal) {
            Ok(applied) => {
                *doc = applied.document;
                self.redo_stack.push(HistoryEntry {
                    proposal: applied.inverse,
                    description: entry.description,
                });
                Ok(true)
            }
            Err(e) => {
                self.undo_stack.push(entry);
                Err(e)
            }
        }
    }

    /// Redo the most recently undone step
    pub fn redo(&mut self, doc: &mut Document) -> Result<bool, EditError> {
        let Some(entry) = self.redo_stack.pop() else {
            return Ok(false);
        };

        match apply(doc, &entry.proposal) {
            Ok(applied) => {
                *doc = applied.document;
                self.undo_stack.push(HistoryEntry {
                    proposal: applied.inverse,
                    description: entry.description,
                });
                Ok(true)
            }
            Err(e) => {
                self.redo_stack.push(entry);
                Err(e)
            }
        }
    }

    /// Pin every open-ended step to `id`, a block appended after it
    ///
    /// Steps reaching the document end would otherwise also cover blocks
    /// that arrived later.
    pub fn anchor_end(&mut self, id: &StableId) {
        let entries = self.undo_stack.iter_mut().chain(self.redo_stack.iter_mut());
        for entry in entries {
            let proposal = &mut entry.proposal;
            let ops = proposal
                .operations
                .iter_mut()
                .chain(proposal.inverse_operations.iter_mut());
            for op in ops.filter(|op| op.to_id.is_none()) {
                op.to_id = Some(id.clone());
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Get description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
