use crate::ast::{Document, Node};
use crate::error::{BufferError, ParseDegraded};
use crate::parser::{ParseMode, ParseOutput, Parser};

/// Blocks completed by one `consume` or `finish` call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentDelta {
    /// Newly completed top-level blocks, without ids
    pub added: Vec<Node>,
    /// Index of the first added block in the finished document
    pub first_index: usize,
    /// Bytes held back because they do not form a complete construct yet
    pub pending_bytes: usize,
    /// Diagnostics raised by the newly completed blocks
    pub diagnostics: Vec<ParseDegraded>,
}

impl DocumentDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }
}

/// Accumulates streamed markup fragments and reports completed blocks
///
/// Every call re-parses the whole accumulated text, so the completed prefix
/// is the same no matter how the stream was split into fragments.
#[derive(Debug, Default)]
pub struct TagBuffer {
    raw: String,
    committed: usize,
    emitted: usize,
    finished: Option<Vec<Node>>,
}

impl TagBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and return the blocks it completed
    pub fn consume(&mut self, fragment: &str) -> Result<DocumentDelta, BufferError> {
        if self.finished.is_some() {
            return Err(BufferError::Frozen {
                len: fragment.len(),
            });
        }

        self.raw.push_str(fragment);
        let output = Parser::new(&self.raw, ParseMode::Streaming).parse();
        let delta = self.advance(output);

        tracing::debug!(
            fragment_len = fragment.len(),
            added = delta.added.len(),
            pending = delta.pending_bytes,
            "consumed fragment"
        );
        Ok(delta)
    }

    /// Parse the rest of the buffer as complete and freeze it
    ///
    /// Open constructs are closed at end of input and partial tags are kept
    /// as text. A second call returns an empty delta.
    pub fn finish(&mut self) -> DocumentDelta {
        if self.finished.is_some() {
            return DocumentDelta {
                first_index: self.emitted,
                ..DocumentDelta::default()
            };
        }

        let output = Parser::new(&self.raw, ParseMode::Final).parse();
        let nodes = output.nodes.clone();
        let delta = self.advance(output);
        self.finished = Some(nodes);

        tracing::debug!(added = delta.added.len(), total = self.emitted, "stream finished");
        delta
    }

    /// The finished document; finishes the stream on first call
    pub fn flush(&mut self) -> Document {
        self.finish();
        Document::from_nodes(self.finished.iter().flatten().cloned())
    }

    /// Discard all buffered text, returning the number of pending bytes lost
    pub fn cancel(&mut self) -> usize {
        let dropped = self.pending().len();
        *self = Self::new();
        tracing::debug!(dropped, "buffer cancelled");
        dropped
    }

    /// Document made of the blocks completed so far
    pub fn snapshot(&self) -> Document {
        match &self.finished {
            Some(nodes) => Document::from_nodes(nodes.iter().cloned()),
            None => Document::from_nodes(Parser::new(&self.raw, ParseMode::Streaming).parse().nodes),
        }
    }

    /// Text not yet part of a completed block
    pub fn pending(&self) -> &str {
        &self.raw[self.committed..]
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    /// Number of blocks reported so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn advance(&mut self, output: ParseOutput) -> DocumentDelta {
        let first_index = self.emitted;
        let previous = self.committed;

        let diagnostics: Vec<_> = output
            .diagnostics
            .into_iter()
            .filter(|d| d.pos() >= previous)
            .collect();
        for diagnostic in &diagnostics {
            tracing::warn!(%diagnostic, "degraded markup");
        }

        let added: Vec<Node> = output.nodes.into_iter().skip(first_index).collect();
        self.emitted += added.len();
        self.committed = output.consumed.max(previous);

        DocumentDelta {
            added,
            first_index,
            pending_bytes: self.raw.len() - self.committed,
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_split_heading_tag() {
        let mut buffer = TagBuffer::new();

        let delta = buffer.consume("<head").unwrap();
        assert!(delta.is_empty());
        assert_eq!(delta.pending_bytes, 5);

        let delta = buffer.consume("ing>Day 1</heading><p>Visit ").unwrap();
        assert_eq!(delta.added, vec![Node::heading(1, vec![Node::text("Day 1")])]);
        assert_eq!(delta.first_index, 0);

        let delta = buffer.consume("<mark>Eiffel Tower</mark></p>").unwrap();
        assert_eq!(
            delta.added,
            vec![Node::paragraph(vec![Node::text("Visit "), Node::place("Eiffel Tower")])]
        );
        assert_eq!(delta.first_index, 1);
        assert_eq!(delta.pending_bytes, 0);
    }

    #[test]
    fn test_consume_empty_fragment_is_not_end_of_stream() {
        let mut buffer = TagBuffer::new();
        buffer.consume("<p>open").unwrap();

        let delta = buffer.consume("").unwrap();
        assert!(delta.is_empty());
        assert!(!buffer.is_finished());
    }

    #[test]
    fn test_flush_auto_closes_and_is_idempotent() {
        let mut buffer = TagBuffer::new();
        buffer.consume("<p>a</p><p>Visit <mark>Lou").unwrap();

        let first = buffer.flush();
        let second = buffer.flush();

        assert_eq!(first, second);
        assert_eq!(first, parse("<p>a</p><p>Visit <mark>Lou"));
        assert_eq!(first.children[1].text_content(), "Visit Lou");
    }

    #[test]
    fn test_finish_reports_remaining_blocks() {
        let mut buffer = TagBuffer::new();
        buffer.consume("<p>a</p>trailing").unwrap();

        let delta = buffer.finish();
        assert_eq!(delta.first_index, 1);
        assert_eq!(delta.added, vec![Node::paragraph(vec![Node::text("trailing")])]);

        assert!(buffer.finish().is_empty());
    }

    #[test]
    fn test_consume_after_flush_is_rejected() {
        let mut buffer = TagBuffer::new();
        buffer.consume("<p>a</p>").unwrap();
        buffer.flush();

        assert_eq!(
            buffer.consume("<p>b</p>"),
            Err(BufferError::Frozen { len: 8 })
        );
    }

    #[test]
    fn test_diagnostics_reported_once() {
        let mut buffer = TagBuffer::new();

        let delta = buffer.consume("<p><mark></mark>x</p>").unwrap();
        assert_eq!(delta.diagnostics, vec![ParseDegraded::empty_mark(3)]);

        let delta = buffer.consume("<p>y</p>").unwrap();
        assert!(delta.diagnostics.is_empty());
    }

    #[test]
    fn test_cancel_discards_pending() {
        let mut buffer = TagBuffer::new();
        buffer.consume("<p>a</p><p>half").unwrap();

        assert_eq!(buffer.cancel(), "<p>half".len());
        assert!(buffer.pending().is_empty());
        assert!(buffer.snapshot().is_empty());
    }
}
