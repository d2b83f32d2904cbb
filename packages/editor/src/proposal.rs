//! # Boundary-Anchored Proposals
//!
//! A `ReplaceOp` names two anchors by id and replaces every top-level block
//! strictly between them. Applying a proposal never touches the input
//! document: it works on a copy and returns that copy together with the
//! proposal that undoes it.
//!
//! ## Id rules
//!
//! - Inserted blocks without an id get a fresh one
//! - A block carrying an id this document issued, and that is not live,
//!   keeps it (this is how a revert restores removed blocks)
//! - Any other id is replaced by a fresh one

use crate::errors::EditError;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use waypoint_parser::{Document, Node, StableId};

/// Replace the blocks strictly between two anchors
///
/// `from_id = None` is the document start, `to_id = None` its end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaceOp {
    pub from_id: Option<StableId>,
    pub to_id: Option<StableId>,
    pub content: Vec<Node>,
}

impl ReplaceOp {
    pub fn new(from_id: Option<StableId>, to_id: Option<StableId>, content: Vec<Node>) -> Self {
        Self {
            from_id,
            to_id,
            content,
        }
    }
}

/// A structural edit and the edit that undoes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub operations: Vec<ReplaceOp>,
    pub inverse_operations: Vec<ReplaceOp>,
}

impl Proposal {
    pub fn single(operation: ReplaceOp, inverse: ReplaceOp) -> Self {
        Self {
            operations: vec![operation],
            inverse_operations: vec![inverse],
        }
    }

    /// The proposal undoing this one
    pub fn inverse(&self) -> Proposal {
        Proposal {
            operations: self.inverse_operations.clone(),
            inverse_operations: self.operations.clone(),
        }
    }
}

/// Outcome of applying a proposal
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub document: Document,
    /// Applying this restores the input document exactly
    pub inverse: Proposal,
}

fn locate(doc: &Document, id: &StableId) -> Result<usize, EditError> {
    let mut matches = doc
        .children
        .iter()
        .enumerate()
        .filter(|(_, node)| node.id() == Some(id))
        .map(|(index, _)| index);

    match (matches.next(), matches.next()) {
        (Some(index), None) => Ok(index),
        _ => Err(EditError::BoundaryNotFound { id: id.clone() }),
    }
}

/// Index range of the blocks strictly between the anchors
pub fn resolve_range(
    doc: &Document,
    from_id: Option<&StableId>,
    to_id: Option<&StableId>,
) -> Result<Range<usize>, EditError> {
    let start = match from_id {
        Some(id) => locate(doc, id)? + 1,
        None => 0,
    };
    let end = match to_id {
        Some(id) => locate(doc, id)?,
        None => doc.len(),
    };

    if start > end {
        if let (Some(from), Some(to)) = (from_id, to_id) {
            return Err(EditError::InvalidRange {
                from: from.clone(),
                to: to.clone(),
            });
        }
    }
    Ok(start..end)
}

fn validate_content(content: &[Node]) -> Result<(), EditError> {
    match content.iter().position(|node| !node.is_block()) {
        Some(index) => Err(EditError::InvalidContent {
            index,
            kind: content[index].kind(),
        }),
        None => Ok(()),
    }
}

/// Validate a replacement against the live document and build its proposal
pub fn compute_proposal(
    doc: &Document,
    from_id: Option<StableId>,
    to_id: Option<StableId>,
    content: Vec<Node>,
) -> Result<Proposal, EditError> {
    let range = resolve_range(doc, from_id.as_ref(), to_id.as_ref())?;
    validate_content(&content)?;

    let removed = doc.children[range].to_vec();
    let inverse = ReplaceOp::new(from_id.clone(), to_id.clone(), removed);
    Ok(Proposal::single(ReplaceOp::new(from_id, to_id, content), inverse))
}

/// Apply one operation in place, returning it as applied (with the ids
/// its content received) and its inverse
pub(crate) fn apply_op(doc: &mut Document, op: &ReplaceOp) -> Result<(ReplaceOp, ReplaceOp), EditError> {
    let range = resolve_range(doc, op.from_id.as_ref(), op.to_id.as_ref())?;
    validate_content(&op.content)?;

    let mut live = doc.live_ids();
    let mut content = op.content.clone();
    for node in &mut content {
        doc.admit(node, &live);
        live.extend(node.id().cloned());
    }

    let removed: Vec<Node> = doc.children.splice(range, content.iter().cloned()).collect();

    let applied = ReplaceOp::new(op.from_id.clone(), op.to_id.clone(), content);
    let inverse = ReplaceOp::new(op.from_id.clone(), op.to_id.clone(), removed);
    Ok((applied, inverse))
}

/// Apply a proposal to a copy of `doc`
///
/// Operations run in order; if any fails the whole proposal is rejected.
pub fn apply(doc: &Document, proposal: &Proposal) -> Result<Applied, EditError> {
    let mut document = doc.clone();
    let mut applied = Vec::with_capacity(proposal.operations.len());
    let mut inverses = Vec::with_capacity(proposal.operations.len());

    for op in &proposal.operations {
        let (done, inverse) = apply_op(&mut document, op)?;
        applied.push(done);
        inverses.push(inverse);
    }
    inverses.reverse();

    tracing::info!(
        operations = applied.len(),
        blocks = document.len(),
        "proposal applied"
    );

    Ok(Applied {
        document,
        inverse: Proposal {
            operations: inverses,
            inverse_operations: applied,
        },
    })
}

/// Undo an applied proposal given its inverse
pub fn revert(doc: &Document, inverse: &Proposal) -> Result<Document, EditError> {
    let reverted = apply(doc, inverse)?;
    tracing::info!(operations = inverse.operations.len(), "proposal reverted");
    Ok(reverted.document)
}
