use proptest::prelude::*;
use waypoint_editor::{apply, compute_proposal, revert, text_edit};
use waypoint_parser::{parse, parse_fragment, serialize, serialize_node, Document, Node, StableId};

const BLOCKS: &[&str] = &[
    "<heading>Day 1</heading>",
    "<heading level=\"2\">Morning</heading>",
    "<p>Coffee at <mark>Café de Flore</mark></p>",
    "<p>Walk along the Seine</p>",
    "<ul><li><mark>Louvre</mark></li><li>Tuileries</li></ul>",
    "<ol><li>Check in</li></ol>",
    "<p>Dinner &amp; wine</p>",
    "<p><mark color=\"3\" lat=\"48.8606\" lng=\"2.3376\">Louvre</mark></p>",
    "<p><mark lat=\"none\" lng=\"none\">Atlantis</mark></p>",
];

fn document() -> impl Strategy<Value = Document> {
    prop::collection::vec(prop::sample::select(BLOCKS), 0..8).prop_map(|blocks| parse(&blocks.concat()))
}

fn content() -> impl Strategy<Value = Vec<Node>> {
    prop::collection::vec(prop::sample::select(BLOCKS), 0..4)
        .prop_map(|blocks| parse_fragment(&blocks.concat()))
}

/// Anchors around the blocks `start..end`; `None` for the document edges
fn anchors(doc: &Document, start: usize, end: usize) -> (Option<StableId>, Option<StableId>) {
    let from = start.checked_sub(1).and_then(|i| doc.children[i].id().cloned());
    let to = doc.children.get(end).and_then(|n| n.id().cloned());
    (from, to)
}

proptest! {
    #[test]
    fn prop_revert_restores_document(
        doc in document(),
        content in content(),
        a in 0usize..16,
        b in 0usize..16,
    ) {
        let (x, y) = (a % (doc.len() + 1), b % (doc.len() + 1));
        let (start, end) = (x.min(y), x.max(y));
        let (from, to) = anchors(&doc, start, end);

        let proposal = compute_proposal(&doc, from, to, content).unwrap();
        let applied = apply(&doc, &proposal).unwrap();
        let reverted = revert(&applied.document, &applied.inverse).unwrap();

        prop_assert_eq!(&reverted, &doc);
        prop_assert_eq!(serialize(&reverted), serialize(&doc));
    }

    #[test]
    fn prop_text_edit_matches_reserialization(
        doc in document(),
        content in content(),
        a in 0usize..16,
        b in 0usize..16,
    ) {
        let (x, y) = (a % (doc.len() + 1), b % (doc.len() + 1));
        let (start, end) = (x.min(y), x.max(y));
        let (from, to) = anchors(&doc, start, end);

        let proposal = compute_proposal(&doc, from, to, content.clone()).unwrap();
        let edit = text_edit(&doc, &proposal.operations[0]).unwrap();
        let applied = apply(&doc, &proposal).unwrap();

        let before: Vec<char> = serialize(&doc).chars().collect();
        let inserted: String = content.iter().map(serialize_node).collect();
        let mut spliced: String = before[..edit.start].iter().collect();
        spliced.push_str(&inserted);
        spliced.extend(&before[edit.end..]);

        prop_assert_eq!(edit.inserted_len, inserted.chars().count());
        prop_assert_eq!(spliced, serialize(&applied.document));
    }
}

#[test]
fn test_pure_insertion_between_neighbours() {
    let doc = parse("<p>a</p><p>b</p>");
    let proposal = compute_proposal(
        &doc,
        Some(StableId::from("n1")),
        Some(StableId::from("n2")),
        vec![Node::paragraph(vec![Node::text("between")])],
    )
    .unwrap();

    let edit = text_edit(&doc, &proposal.operations[0]).unwrap();
    assert_eq!(edit.start, edit.end);

    let applied = apply(&doc, &proposal).unwrap();
    assert_eq!(serialize(&applied.document), "<p>a</p>\n<p>between</p>\n<p>b</p>\n");
    assert_eq!(revert(&applied.document, &applied.inverse).unwrap(), doc);
}
