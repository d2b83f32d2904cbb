//! # Stream Session
//!
//! One live document fed by a markup stream, colored and enriched as it
//! grows, and edited through previewed proposals.
//!
//! While a preview is active the document belongs to the preview: streamed
//! fragments and a second preview are refused, and enrichment results are
//! held back until the preview is reverted or accepted.

use crate::errors::SessionError;
use crate::offsets::{text_edits, TextEdit};
use crate::proposal::{apply, compute_proposal, revert, Proposal, ReplaceOp};
use crate::undo_stack::UndoStack;
use waypoint_parser::{Document, DocumentDelta, IdGenerator, Node, StableId, TagBuffer};
use waypoint_places::{EnrichmentBatch, EnrichmentReport, Enricher, PlaceRegistry, Resolution};

/// Proposal applied to the live document but not yet accepted
#[derive(Debug, Clone)]
struct ActivePreview {
    /// Operations as applied, with ids and colors
    applied: Proposal,
    inverse: Proposal,
    edits: Vec<TextEdit>,
}

pub struct StreamSession {
    /// Session identifier, used in log events
    pub id: String,
    buffer: TagBuffer,
    document: Document,
    registry: PlaceRegistry,
    enricher: Option<Enricher>,
    history: UndoStack,
    preview: Option<ActivePreview>,
    deferred: Vec<Resolution>,
    finished: bool,
}

impl StreamSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            buffer: TagBuffer::new(),
            document: Document::new(),
            registry: PlaceRegistry::new(),
            enricher: None,
            history: UndoStack::new(),
            preview: None,
            deferred: Vec::new(),
            finished: false,
        }
    }

    pub fn with_palette(mut self, palette_size: u8) -> Self {
        self.registry = PlaceRegistry::with_palette(palette_size);
        self
    }

    pub fn with_enricher(mut self, enricher: Enricher) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Issue ids from `ids` instead of the default `n1, n2, ...`
    pub fn with_ids(mut self, ids: IdGenerator) -> Self {
        self.document = Document::with_ids(ids);
        self
    }

    /// Derive the id seed from the session id
    pub fn with_session_ids(self) -> Self {
        let ids = IdGenerator::for_session(&self.id);
        self.with_ids(ids)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn registry(&self) -> &PlaceRegistry {
        &self.registry
    }

    pub fn enricher(&self) -> Option<&Enricher> {
        self.enricher.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn preview_active(&self) -> bool {
        self.preview.is_some()
    }

    /// Text edits of the active preview
    pub fn preview_edits(&self) -> Option<&[TextEdit]> {
        self.preview.as_ref().map(|p| p.edits.as_slice())
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    /// Number of enrichment results waiting for the preview to end
    pub fn deferred_resolutions(&self) -> usize {
        self.deferred.len()
    }

    fn ensure_no_preview(&self, operation: &'static str) -> Result<(), SessionError> {
        match self.preview {
            Some(_) => Err(SessionError::preview_conflict(operation)),
            None => Ok(()),
        }
    }

    /// Feed a fragment of the stream
    ///
    /// Completed blocks join the live document with fresh ids and colored
    /// marks; the returned delta carries them as they now appear in it.
    pub fn consume(&mut self, fragment: &str) -> Result<DocumentDelta, SessionError> {
        self.ensure_no_preview("consuming")?;
        if self.finished {
            return Err(SessionError::Finished);
        }

        let delta = self.buffer.consume(fragment)?;
        Ok(self.append(delta))
    }

    /// Mark the end of the stream
    ///
    /// Whatever is still open is closed. Calling it again returns an empty
    /// delta.
    pub fn finish(&mut self) -> Result<DocumentDelta, SessionError> {
        self.ensure_no_preview("finishing")?;
        if self.finished {
            return Ok(DocumentDelta {
                first_index: self.document.len(),
                ..DocumentDelta::default()
            });
        }

        let delta = self.buffer.finish();
        self.finished = true;
        Ok(self.append(delta))
    }

    /// Abandon the stream, dropping incomplete markup
    ///
    /// Completed blocks, colors and the geocode cache are kept.
    pub fn cancel(&mut self) -> usize {
        let dropped = self.buffer.cancel();
        self.finished = true;
        tracing::info!(session = %self.id, dropped, "stream cancelled");
        dropped
    }

    fn append(&mut self, mut delta: DocumentDelta) -> DocumentDelta {
        let first_index = self.document.len();
        for node in delta.added.drain(..) {
            self.document.push(node);
        }
        self.registry.scan(&mut self.document);

        if let Some(id) = self.document.children.get(first_index).and_then(Node::id) {
            self.history.anchor_end(id);
        }

        delta.first_index = first_index;
        delta.added = self.document.children[first_index..].to_vec();

        if !delta.added.is_empty() {
            tracing::debug!(
                session = %self.id,
                added = delta.added.len(),
                blocks = self.document.len(),
                "document updated"
            );
        }
        delta
    }

    /// Build a proposal against the live document
    pub fn propose(
        &self,
        from_id: Option<StableId>,
        to_id: Option<StableId>,
        content: Vec<Node>,
    ) -> Result<Proposal, SessionError> {
        self.ensure_no_preview("proposing")?;
        Ok(compute_proposal(&self.document, from_id, to_id, content)?)
    }

    /// Apply a proposal tentatively and return its text edits
    pub fn preview(&mut self, proposal: &Proposal) -> Result<Vec<TextEdit>, SessionError> {
        self.ensure_no_preview("previewing")?;

        let before = self.document.clone();
        let applied = apply(&before, proposal)?;
        self.document = applied.document;
        self.registry.scan(&mut self.document);

        // Inserted blocks as they look after coloring
        let operations: Vec<ReplaceOp> = applied
            .inverse
            .inverse_operations
            .iter()
            .map(|op| ReplaceOp {
                content: op
                    .content
                    .iter()
                    .map(|node| {
                        node.id()
                            .and_then(|id| self.document.find(id))
                            .unwrap_or(node)
                            .clone()
                    })
                    .collect(),
                ..op.clone()
            })
            .collect();
        let colored = Proposal {
            operations,
            inverse_operations: applied.inverse.operations.clone(),
        };
        let edits = text_edits(&before, &colored)?;

        tracing::info!(session = %self.id, edits = edits.len(), "preview started");
        self.preview = Some(ActivePreview {
            applied: colored,
            inverse: applied.inverse,
            edits: edits.clone(),
        });
        Ok(edits)
    }

    /// Undo the active preview, returning the text edits that undo it
    pub fn revert_preview(&mut self) -> Result<Vec<TextEdit>, SessionError> {
        let preview = self.preview.take().ok_or(SessionError::NoActivePreview)?;

        let edits = match text_edits(&self.document, &preview.inverse) {
            Ok(edits) => edits,
            Err(e) => {
                self.preview = Some(preview);
                return Err(e.into());
            }
        };
        match revert(&self.document, &preview.inverse) {
            Ok(document) => self.document = document,
            Err(e) => {
                self.preview = Some(preview);
                return Err(e.into());
            }
        }

        self.registry.scan(&mut self.document);
        tracing::info!(session = %self.id, "preview reverted");
        self.release_deferred();
        Ok(edits)
    }

    /// Keep the active preview and make it undoable
    pub fn accept_preview(&mut self) -> Result<(), SessionError> {
        let preview = self.preview.take().ok_or(SessionError::NoActivePreview)?;

        let description = format!("{} operation(s)", preview.applied.operations.len());
        self.history.record(preview.inverse, Some(description));
        tracing::info!(session = %self.id, "preview accepted");
        self.release_deferred();
        Ok(())
    }

    pub fn undo(&mut self) -> Result<bool, SessionError> {
        self.ensure_no_preview("undoing")?;
        let undone = self.history.undo(&mut self.document)?;
        self.registry.scan(&mut self.document);
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool, SessionError> {
        self.ensure_no_preview("redoing")?;
        let redone = self.history.redo(&mut self.document)?;
        self.registry.scan(&mut self.document);
        Ok(redone)
    }

    /// Collect place names needing coordinates and mark them pending
    pub fn begin_enrichment(&mut self) -> EnrichmentBatch {
        Enricher::begin(&mut self.document)
    }

    /// Write lookup results into the document
    ///
    /// Returns `None` when a preview is active; the results are applied once
    /// it ends.
    pub fn apply_enrichment(&mut self, resolutions: Vec<Resolution>) -> Option<EnrichmentReport> {
        if self.preview.is_some() {
            tracing::debug!(session = %self.id, count = resolutions.len(), "enrichment deferred");
            self.deferred.extend(resolutions);
            return None;
        }

        let report = Enricher::apply(&mut self.document, &resolutions);
        tracing::debug!(
            session = %self.id,
            updated = report.marks_updated,
            "document enriched"
        );
        Some(report)
    }

    /// Run one enrichment pass with the configured enricher
    pub async fn enrich(&mut self) -> Option<EnrichmentReport> {
        let enricher = self.enricher.clone()?;
        let batch = self.begin_enrichment();
        if batch.is_empty() {
            return Some(EnrichmentReport::default());
        }
        let resolutions = enricher.resolve(&batch).await;
        self.apply_enrichment(resolutions)
    }

    fn release_deferred(&mut self) {
        if self.deferred.is_empty() {
            return;
        }
        let resolutions = std::mem::take(&mut self.deferred);
        self.apply_enrichment(resolutions);
    }
}
