//! Translation of structural operations into text ranges
//!
//! Offsets are char positions in the canonical serialization and are derived
//! from the tree on every call; nothing is tracked between edits.

use crate::errors::EditError;
use crate::proposal::{apply_op, resolve_range, Proposal, ReplaceOp};
use serde::{Deserialize, Serialize};
use waypoint_parser::{serialized_len, Document, Node};

/// Replace chars `start..end` with `inserted_len` new chars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub inserted_len: usize,
}

impl TextEdit {
    pub fn removed_len(&self) -> usize {
        self.end - self.start
    }
}

fn total_len(nodes: &[Node]) -> usize {
    nodes.iter().map(serialized_len).sum()
}

/// Text range touched by `op` in the serialization of `doc`
pub fn text_edit(doc: &Document, op: &ReplaceOp) -> Result<TextEdit, EditError> {
    let range = resolve_range(doc, op.from_id.as_ref(), op.to_id.as_ref())?;
    let start = total_len(&doc.children[..range.start]);

    Ok(TextEdit {
        start,
        end: start + total_len(&doc.children[range]),
        inserted_len: total_len(&op.content),
    })
}

/// Text edits of every operation, each relative to the text left by the
/// previous ones
pub fn text_edits(doc: &Document, proposal: &Proposal) -> Result<Vec<TextEdit>, EditError> {
    let mut current = doc.clone();
    let mut edits = Vec::with_capacity(proposal.operations.len());

    for op in &proposal.operations {
        edits.push(text_edit(&current, op)?);
        apply_op(&mut current, op)?;
    }
    Ok(edits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal::{apply, compute_proposal};
    use waypoint_parser::{parse, serialize, StableId};

    fn splice(text: &str, edit: &TextEdit, inserted: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out: String = chars[..edit.start].iter().collect();
        out.push_str(inserted);
        out.extend(&chars[edit.end..]);
        out
    }

    #[test]
    fn test_offsets_match_reserialization() {
        let doc = parse("<heading>Journée 1</heading><p>Café <mark color=\"0\">Flore</mark></p><p>b</p>");
        let content = vec![Node::paragraph(vec![Node::text("près de l'Odéon")])];
        let proposal =
            compute_proposal(&doc, Some(StableId::from("n1")), Some(StableId::from("n3")), content.clone())
                .unwrap();

        let edit = text_edit(&doc, &proposal.operations[0]).unwrap();
        let applied = apply(&doc, &proposal).unwrap();

        let inserted: String = content.iter().map(waypoint_parser::serialize_node).collect();
        assert_eq!(edit.inserted_len, inserted.chars().count());
        assert_eq!(splice(&serialize(&doc), &edit, &inserted), serialize(&applied.document));
    }

    #[test]
    fn test_whole_document_deletion() {
        let doc = parse("<p>a</p>");
        let op = ReplaceOp::new(None, None, vec![]);
        let edit = text_edit(&doc, &op).unwrap();

        assert_eq!(edit, TextEdit { start: 0, end: 9, inserted_len: 0 });
        assert_eq!(edit.removed_len(), 9);
    }
}
