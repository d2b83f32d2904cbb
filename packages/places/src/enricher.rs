use crate::cache::{GeocodeCache, Lookup};
use crate::error::{EnrichmentUnresolved, GeocodeError, UnresolvedReason};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use waypoint_parser::Document;

/// Distinct place names awaiting coordinates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentBatch {
    names: Vec<String>,
}

impl EnrichmentBatch {
    /// Normalized names in first-mention order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Result of looking up one name
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub name: String,
    pub outcome: Result<Lookup, Arc<GeocodeError>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentReport {
    /// Names whose marks now carry coordinates
    pub resolved: Vec<String>,
    pub unresolved: Vec<EnrichmentUnresolved>,
    /// Marks whose coordinates changed
    pub marks_updated: usize,
}

impl EnrichmentReport {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    pub fn merge(&mut self, other: EnrichmentReport) {
        self.resolved.extend(other.resolved);
        self.unresolved.extend(other.unresolved);
        self.marks_updated += other.marks_updated;
    }
}

/// Fills in coordinates of place marks through the geocode cache
///
/// Split in three steps so the document is only borrowed while marks are
/// read or written, never while lookups are in flight.
#[derive(Clone)]
pub struct Enricher {
    cache: GeocodeCache,
}

impl Enricher {
    pub fn new(cache: GeocodeCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &GeocodeCache {
        &self.cache
    }

    /// Collect names lacking coordinates and mark their missing axes pending
    pub fn begin(doc: &mut Document) -> EnrichmentBatch {
        let mut seen = HashSet::new();
        let mut names = Vec::new();

        doc.for_each_mark_mut(|mark| {
            if mark.is_resolved() {
                return;
            }
            mark.mark_pending();
            let key = mark.key();
            if seen.insert(key.clone()) {
                names.push(key);
            }
        });

        EnrichmentBatch { names }
    }

    /// Look up every name of the batch concurrently
    #[tracing::instrument(skip(self, batch), fields(names = batch.len()))]
    pub async fn resolve(&self, batch: &EnrichmentBatch) -> Vec<Resolution> {
        let lookups = batch.names.iter().map(|name| async move {
            Resolution {
                name: name.clone(),
                outcome: self.cache.resolve(name).await,
            }
        });
        join_all(lookups).await
    }

    /// Write resolutions into every mark sharing a name
    pub fn apply(doc: &mut Document, resolutions: &[Resolution]) -> EnrichmentReport {
        let outcomes: HashMap<&str, &Result<Lookup, Arc<GeocodeError>>> = resolutions
            .iter()
            .map(|r| (r.name.as_str(), &r.outcome))
            .collect();

        let mut marks_updated = 0;
        doc.for_each_mark_mut(|mark| {
            let Some(outcome) = outcomes.get(mark.key().as_str()) else {
                return;
            };
            let before = (mark.latitude, mark.longitude);
            match outcome {
                Ok(Lookup::Found(coords)) => mark.resolve(coords.lat, coords.lng),
                Ok(Lookup::NotFound) | Err(_) => mark.mark_unresolved(),
            }
            if before != (mark.latitude, mark.longitude) {
                marks_updated += 1;
            }
        });

        let mut report = EnrichmentReport {
            marks_updated,
            ..EnrichmentReport::default()
        };
        for resolution in resolutions {
            let reason = match &resolution.outcome {
                Ok(Lookup::Found(_)) => {
                    report.resolved.push(resolution.name.clone());
                    continue;
                }
                Ok(Lookup::NotFound) => UnresolvedReason::NotFound,
                Err(e) => UnresolvedReason::Failed(e.clone()),
            };
            tracing::warn!(name = %resolution.name, %reason, "place unresolved");
            report.unresolved.push(EnrichmentUnresolved {
                name: resolution.name.clone(),
                reason,
            });
        }

        tracing::debug!(
            resolved = report.resolved.len(),
            unresolved = report.unresolved.len(),
            marks_updated,
            "enrichment applied"
        );
        report
    }

    /// Run a full pass: begin, resolve and apply
    pub async fn enrich(&self, doc: &mut Document) -> EnrichmentReport {
        let batch = Self::begin(doc);
        if batch.is_empty() {
            return EnrichmentReport::default();
        }
        let resolutions = self.resolve(&batch).await;
        Self::apply(doc, &resolutions)
    }
}

/// Whether any mark still needs a lookup
pub fn needs_enrichment(doc: &Document) -> bool {
    doc.place_marks()
        .iter()
        .any(|m| !m.is_resolved())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoder::StaticGeocoder;
    use waypoint_parser::{parse, Coordinate, Node};

    fn enricher() -> Enricher {
        let geocoder = StaticGeocoder::new()
            .with_place("Eiffel Tower", 48.8584, 2.2945)
            .with_place("Louvre", 48.8606, 2.3376);
        Enricher::new(GeocodeCache::new(Arc::new(geocoder)))
    }

    #[test]
    fn test_begin_collects_distinct_names() {
        let mut doc = parse(
            r#"<p><mark>Louvre</mark> <mark lat="1" lng="2">Rome</mark> <mark lat="none" lng="none">louvre</mark></p>"#,
        );
        let batch = Enricher::begin(&mut doc);

        assert_eq!(batch.names(), &["louvre".to_string()]);
        let marks = doc.place_marks();
        assert_eq!(marks[2].latitude, Coordinate::Pending);
        assert!(marks[1].is_resolved());
    }

    #[tokio::test]
    async fn test_enrich_updates_every_mention() {
        let mut doc = parse("<p><mark>Louvre</mark></p><ul><li><mark>LOUVRE</mark></li><li><mark>Atlantis</mark></li></ul>");
        let report = enricher().enrich(&mut doc).await;

        assert_eq!(report.resolved, vec!["louvre".to_string()]);
        assert_eq!(report.unresolved.len(), 1);
        assert_eq!(report.unresolved[0].name, "atlantis");
        assert_eq!(report.unresolved[0].reason, UnresolvedReason::NotFound);
        assert_eq!(report.marks_updated, 3);

        let marks = doc.place_marks();
        assert_eq!(marks[0].latitude, Coordinate::Resolved(48.8606));
        assert_eq!(marks[1].longitude, Coordinate::Resolved(2.3376));
        assert_eq!(marks[2].latitude, Coordinate::Unresolved);
        assert!(needs_enrichment(&doc));
    }

    #[tokio::test]
    async fn test_resolutions_apply_to_marks_added_meanwhile() {
        let enricher = enricher();
        let mut doc = parse("<p><mark>Eiffel Tower</mark></p>");

        let batch = Enricher::begin(&mut doc);
        let resolutions = enricher.resolve(&batch).await;
        doc.push(Node::paragraph(vec![Node::place("eiffel tower")]));
        Enricher::apply(&mut doc, &resolutions);

        assert!(doc.place_marks().iter().all(|m| m.is_resolved()));
        assert!(!needs_enrichment(&doc));
    }

    #[tokio::test]
    async fn test_known_axis_survives_lookup() {
        let mut doc = parse(r#"<p><mark lat="48.8">Atlantis</mark></p>"#);

        let batch = Enricher::begin(&mut doc);
        assert_eq!(batch.names(), &["atlantis".to_string()]);
        assert_eq!(doc.place_marks()[0].latitude, Coordinate::Resolved(48.8));
        assert_eq!(doc.place_marks()[0].longitude, Coordinate::Pending);

        let resolutions = enricher().resolve(&batch).await;
        Enricher::apply(&mut doc, &resolutions);

        let mark = doc.place_marks()[0];
        assert_eq!(mark.latitude, Coordinate::Resolved(48.8));
        assert_eq!(mark.longitude, Coordinate::Unresolved);
    }
}
