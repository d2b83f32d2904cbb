//! # Waypoint Editor
//!
//! Structural editing of streamed itineraries.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: markup fragments → blocks           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ places: colors + coordinates for marks      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: live document + proposals           │
//! │  - Replace blocks between two anchors       │
//! │  - Preview, revert or accept a proposal     │
//! │  - Translate edits to text offsets          │
//! │  - Undo/redo accepted proposals             │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The tree is the source of truth**: text offsets are derived on demand
//! 2. **Anchors, not positions**: edits name surrounding blocks by id
//! 3. **Every edit carries its inverse**: revert restores ids and content
//!
//! ## Usage
//!
//! ```rust,ignore
//! use waypoint_editor::StreamSession;
//! use waypoint_parser::{Node, StableId};
//!
//! let mut session = StreamSession::new("trip-1");
//! session.consume("<heading>Day 1</heading><p>Louvre</p>")?;
//! session.finish()?;
//!
//! let proposal = session.propose(
//!     Some(StableId::from("n1")),
//!     None,
//!     vec![Node::paragraph(vec![Node::text("Musée d'Orsay")])],
//! )?;
//! let edits = session.preview(&proposal)?;
//! session.revert_preview()?;
//! ```

mod errors;
mod offsets;
mod proposal;
mod session;
mod undo_stack;

pub use errors::{EditError, SessionError};
pub use offsets::{text_edit, text_edits, TextEdit};
pub use proposal::{apply, compute_proposal, resolve_range, revert, Applied, Proposal, ReplaceOp};
pub use session::StreamSession;
pub use undo_stack::{HistoryEntry, UndoStack};
