//! Integration tests for editor crate

use std::sync::Arc;
use waypoint_editor::{SessionError, StreamSession, TextEdit};
use waypoint_parser::{serialize, Coordinate, Node, StableId};
use waypoint_places::{Enricher, GeocodeCache, StaticGeocoder};

fn id(s: &str) -> Option<StableId> {
    Some(StableId::from(s))
}

fn chars(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end - start).collect()
}

fn colors(session: &StreamSession) -> Vec<(String, Option<u8>)> {
    session
        .document()
        .place_marks()
        .into_iter()
        .map(|m| (m.display_name.clone(), m.color_index))
        .collect()
}

fn day_one() -> StreamSession {
    let mut session = StreamSession::new("paris");
    session.consume("<heading>Day 1</heading>").unwrap();
    session.consume("<p>Louvre</p><p>Orsay</p>").unwrap();
    session.finish().unwrap();
    session
}

#[test]
fn test_streamed_marks_are_colored() {
    let mut session = StreamSession::new("paris");

    for fragment in ["<head", "ing>Day 1</heading><p>Visit ", "<mark>Eiffel Tower</mark></p>"] {
        session.consume(fragment).unwrap();
    }
    let delta = session.consume("<p>Then <mark>Louvre</mark></p>").unwrap();
    assert_eq!(delta.first_index, 2);
    session.consume("<p>Back to <mark>Eiffel Tower</mark></p>").unwrap();
    session.finish().unwrap();

    assert_eq!(
        colors(&session),
        vec![
            ("Eiffel Tower".to_string(), Some(0)),
            ("Louvre".to_string(), Some(1)),
            ("Eiffel Tower".to_string(), Some(0)),
        ]
    );
    assert_eq!(session.document().children[0].text_content(), "Day 1");
}

#[test]
fn test_delta_carries_ids() {
    let mut session = StreamSession::new("paris");
    let delta = session.consume("<p>a</p><p>b</p><p>c").unwrap();

    let ids: Vec<_> = delta.added.iter().map(|n| n.id().cloned()).collect();
    assert_eq!(ids, vec![id("n1"), id("n2")]);
    assert_eq!(delta.first_index, 0);
}

#[test]
fn test_day_two_apply_then_revert() {
    let mut session = StreamSession::new("paris");
    session
        .consume("<heading>Day 1</heading><p>Louvre</p><p>Orsay</p>")
        .unwrap();
    session.finish().unwrap();
    let before = serialize(session.document());

    let proposal = session
        .propose(id("n2"), id("n3"), vec![Node::heading(1, vec![Node::text("Day 2")])])
        .unwrap();
    session.preview(&proposal).unwrap();
    assert!(serialize(session.document()).contains("Day 2"));

    session.revert_preview().unwrap();
    assert_eq!(serialize(session.document()), before);
    assert!(!session.preview_active());
}

#[test]
fn test_preview_blocks_streaming() {
    let mut session = StreamSession::new("paris");
    session.consume("<p>Louvre</p>").unwrap();

    let proposal = session.propose(id("n1"), None, vec![Node::paragraph(vec![])]).unwrap();
    session.preview(&proposal).unwrap();

    assert!(matches!(
        session.consume("<p>Orsay</p>"),
        Err(SessionError::PreviewConflict { .. })
    ));
    assert!(matches!(
        session.preview(&proposal),
        Err(SessionError::PreviewConflict { .. })
    ));
    assert!(matches!(
        session.propose(None, None, vec![]),
        Err(SessionError::PreviewConflict { .. })
    ));
    assert!(matches!(session.undo(), Err(SessionError::PreviewConflict { .. })));

    session.revert_preview().unwrap();
    let delta = session.consume("<p>Orsay</p>").unwrap();

    // The refused fragment was not buffered
    assert_eq!(delta.added.len(), 1);
    assert_eq!(session.document().len(), 2);
}

#[test]
fn test_failed_proposal_leaves_document() {
    let session = day_one();
    let before = session.document().clone();

    assert!(matches!(
        session.propose(id("n9"), None, vec![]),
        Err(SessionError::Edit(_))
    ));
    assert_eq!(session.document(), &before);
}

#[test]
fn test_preview_edits_match_text() {
    let mut session = day_one();
    let before = serialize(session.document());

    let proposal = session
        .propose(
            id("n1"),
            id("n3"),
            vec![Node::paragraph(vec![Node::text("Musée "), Node::place("Orangerie")])],
        )
        .unwrap();
    let edits = session.preview(&proposal).unwrap();
    let after = serialize(session.document());

    assert_eq!(edits.len(), 1);
    let TextEdit { start, end, inserted_len } = edits[0];
    assert_eq!(chars(&before, 0, start), chars(&after, 0, start));
    assert_eq!(
        chars(&before, end, before.chars().count()),
        chars(&after, start + inserted_len, after.chars().count())
    );
    assert_eq!(session.preview_edits(), Some(edits.as_slice()));

    let undo = session.revert_preview().unwrap();
    assert_eq!(undo[0], TextEdit { start, end: start + inserted_len, inserted_len: end - start });
}

#[test]
fn test_accept_undo_redo() {
    let mut session = day_one();
    let original = session.document().clone();

    let proposal = session
        .propose(id("n1"), None, vec![Node::paragraph(vec![Node::text("Rest")])])
        .unwrap();
    session.preview(&proposal).unwrap();
    session.accept_preview().unwrap();
    let edited = session.document().clone();
    assert_eq!(session.history().undo_levels(), 1);

    assert!(session.undo().unwrap());
    assert_eq!(session.document(), &original);

    assert!(session.redo().unwrap());
    assert_eq!(session.document(), &edited);
}

#[test]
fn test_preview_colors_new_marks() {
    let mut session = StreamSession::new("paris");
    session.consume("<p><mark>Louvre</mark></p>").unwrap();

    let proposal = session
        .propose(id("n1"), None, vec![Node::paragraph(vec![Node::place("Orsay")])])
        .unwrap();
    session.preview(&proposal).unwrap();
    assert_eq!(colors(&session)[1], ("Orsay".to_string(), Some(1)));
}

#[tokio::test]
async fn test_enrichment_deferred_during_preview() {
    let geocoder = StaticGeocoder::new().with_place("Eiffel Tower", 48.8584, 2.2945);
    let enricher = Enricher::new(GeocodeCache::new(Arc::new(geocoder)));
    let mut session = StreamSession::new("paris").with_enricher(enricher.clone());
    session.consume("<p>Visit <mark>Eiffel Tower</mark></p>").unwrap();
    session.finish().unwrap();

    let batch = session.begin_enrichment();
    assert_eq!(batch.len(), 1);
    let resolutions = enricher.resolve(&batch).await;

    let proposal = session.propose(id("n1"), None, vec![Node::paragraph(vec![])]).unwrap();
    session.preview(&proposal).unwrap();

    assert!(session.apply_enrichment(resolutions).is_none());
    assert_eq!(session.deferred_resolutions(), 1);
    assert_eq!(session.document().place_marks()[0].latitude, Coordinate::Pending);

    session.revert_preview().unwrap();
    assert_eq!(session.deferred_resolutions(), 0);
    let mark = session.document().place_marks()[0];
    assert_eq!(mark.latitude, Coordinate::Resolved(48.8584));
    assert_eq!(mark.longitude, Coordinate::Resolved(2.2945));
}

#[tokio::test]
async fn test_enrich_pass() -> anyhow::Result<()> {
    let geocoder = StaticGeocoder::new().with_place("Louvre", 48.8606, 2.3376);
    let enricher = Enricher::new(GeocodeCache::new(Arc::new(geocoder)));
    let mut session = StreamSession::new("paris").with_enricher(enricher);
    session.consume("<p><mark>Louvre</mark> and <mark>Atlantis</mark></p>")?;
    session.finish()?;

    let report = session.enrich().await.expect("no preview active");
    assert_eq!(report.marks_updated, 2);
    assert!(!report.is_complete());

    let marks = session.document().place_marks();
    assert!(marks[0].is_resolved());
    assert_eq!(marks[1].latitude, Coordinate::Unresolved);
    Ok(())
}

#[test]
fn test_cancel_discards_partial_markup() {
    let mut session = StreamSession::new("paris");
    session.consume("<p>Louvre</p><p>Ors").unwrap();

    session.cancel();
    assert_eq!(session.document().len(), 1);
    assert_eq!(session.consume("<p>x</p>"), Err(SessionError::Finished));
}

#[test]
fn test_undo_after_streaming_resumes() {
    let mut session = StreamSession::new("paris");
    session.consume("<p>Louvre</p>").unwrap();

    let proposal = session
        .propose(id("n1"), None, vec![Node::paragraph(vec![Node::text("Rest")])])
        .unwrap();
    session.preview(&proposal).unwrap();
    session.accept_preview().unwrap();

    session.consume("<p>Orsay</p>").unwrap();
    session.finish().unwrap();

    let texts = |s: &StreamSession| -> Vec<String> {
        s.document().children.iter().map(|n| n.text_content()).collect()
    };
    assert_eq!(texts(&session), vec!["Louvre", "Rest", "Orsay"]);

    assert!(session.undo().unwrap());
    assert_eq!(texts(&session), vec!["Louvre", "Orsay"]);

    assert!(session.redo().unwrap());
    assert_eq!(texts(&session), vec!["Louvre", "Rest", "Orsay"]);
}
