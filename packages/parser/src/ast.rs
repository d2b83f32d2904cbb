use crate::id_generator::IdGenerator;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Opaque identifier of a top-level block.
///
/// Assigned once when the block enters a document and never reused within
/// that document's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StableId(String);

impl StableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StableId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StableId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Enrichment state of one coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum Coordinate {
    /// Not looked up yet (or a lookup is in flight)
    #[default]
    Pending,
    /// Looked up and not found, or the lookup failed
    Unresolved,
    Resolved(f64),
}

impl Coordinate {
    pub fn value(&self) -> Option<f64> {
        match self {
            Coordinate::Resolved(v) => Some(*v),
            Coordinate::Pending | Coordinate::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Coordinate::Resolved(_))
    }
}

/// Normalized form of a place name used as registry and cache key
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Inline reference to a place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceMark {
    pub display_name: String,
    pub latitude: Coordinate,
    pub longitude: Coordinate,
    pub color_index: Option<u8>,
}

impl PlaceMark {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            latitude: Coordinate::Pending,
            longitude: Coordinate::Pending,
            color_index: None,
        }
    }

    pub fn with_color(mut self, color: u8) -> Self {
        self.color_index = Some(color);
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.resolve(latitude, longitude);
        self
    }

    /// Registry/cache key
    pub fn key(&self) -> String {
        normalize_name(&self.display_name)
    }

    pub fn is_resolved(&self) -> bool {
        self.latitude.is_resolved() && self.longitude.is_resolved()
    }

    pub fn resolve(&mut self, latitude: f64, longitude: f64) {
        self.latitude = Coordinate::Resolved(latitude);
        self.longitude = Coordinate::Resolved(longitude);
    }

    /// Reset every axis without a value to `Pending`
    pub fn mark_pending(&mut self) {
        self.set_missing(Coordinate::Pending);
    }

    /// Set every axis without a value to `Unresolved`
    pub fn mark_unresolved(&mut self) {
        self.set_missing(Coordinate::Unresolved);
    }

    fn set_missing(&mut self, state: Coordinate) {
        for axis in [&mut self.latitude, &mut self.longitude] {
            if !axis.is_resolved() {
                *axis = state;
            }
        }
    }
}

/// Document node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Heading {
        id: Option<StableId>,
        level: u8,
        children: Vec<Node>,
    },

    Paragraph {
        id: Option<StableId>,
        children: Vec<Node>,
    },

    List {
        id: Option<StableId>,
        ordered: bool,
        children: Vec<Node>,
    },

    ListItem { children: Vec<Node> },

    PlaceMark(PlaceMark),

    Text { value: String },
}

impl Node {
    pub fn heading(level: u8, children: Vec<Node>) -> Self {
        Node::Heading {
            id: None,
            level,
            children,
        }
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::Paragraph { id: None, children }
    }

    pub fn list(ordered: bool, items: Vec<Node>) -> Self {
        Node::List {
            id: None,
            ordered,
            children: items,
        }
    }

    pub fn item(children: Vec<Node>) -> Self {
        Node::ListItem { children }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
        }
    }

    pub fn place(display_name: impl Into<String>) -> Self {
        Node::PlaceMark(PlaceMark::new(display_name))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Heading { .. } => "heading",
            Node::Paragraph { .. } => "paragraph",
            Node::List { .. } => "list",
            Node::ListItem { .. } => "list item",
            Node::PlaceMark(_) => "place mark",
            Node::Text { .. } => "text",
        }
    }

    /// Whether the node may appear at the top level of a document
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Node::Heading { .. } | Node::Paragraph { .. } | Node::List { .. }
        )
    }

    pub fn id(&self) -> Option<&StableId> {
        match self {
            Node::Heading { id, .. } | Node::Paragraph { id, .. } | Node::List { id, .. } => {
                id.as_ref()
            }
            Node::ListItem { .. } | Node::PlaceMark(_) | Node::Text { .. } => None,
        }
    }

    /// Slot holding the id, `None` for node kinds that never carry one
    fn id_slot(&mut self) -> Option<&mut Option<StableId>> {
        match self {
            Node::Heading { id, .. } | Node::Paragraph { id, .. } | Node::List { id, .. } => {
                Some(id)
            }
            Node::ListItem { .. } | Node::PlaceMark(_) | Node::Text { .. } => None,
        }
    }

    pub fn with_id(mut self, new_id: impl Into<StableId>) -> Self {
        if let Some(slot) = self.id_slot() {
            *slot = Some(new_id.into());
        }
        self
    }

    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Heading { children, .. }
            | Node::Paragraph { children, .. }
            | Node::List { children, .. }
            | Node::ListItem { children } => Some(children),
            Node::PlaceMark(_) | Node::Text { .. } => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Heading { children, .. }
            | Node::Paragraph { children, .. }
            | Node::List { children, .. }
            | Node::ListItem { children } => Some(children),
            Node::PlaceMark(_) | Node::Text { .. } => None,
        }
    }

    /// Concatenated text of the subtree (place names included)
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text { value } => out.push_str(value),
            Node::PlaceMark(mark) => out.push_str(&mark.display_name),
            _ => {
                for child in self.children().unwrap_or_default() {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Visit every place mark in document order
    pub fn for_each_mark(&self, f: &mut impl FnMut(&PlaceMark)) {
        match self {
            Node::PlaceMark(mark) => f(mark),
            Node::Text { .. } => {}
            _ => {
                for child in self.children().unwrap_or_default() {
                    child.for_each_mark(f);
                }
            }
        }
    }

    pub fn for_each_mark_mut(&mut self, f: &mut impl FnMut(&mut PlaceMark)) {
        match self {
            Node::PlaceMark(mark) => f(mark),
            Node::Text { .. } => {}
            _ => {
                if let Some(children) = self.children_mut() {
                    for child in children {
                        child.for_each_mark_mut(f);
                    }
                }
            }
        }
    }
}

/// Root of the document tree
///
/// Owns the top-level block sequence and the generator that issues ids to
/// blocks entering the document. Equality compares content only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub children: Vec<Node>,
    ids: IdGenerator,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.children == other.children
    }
}

impl Document {
    pub fn new() -> Self {
        Self::with_ids(IdGenerator::new())
    }

    pub fn with_ids(ids: IdGenerator) -> Self {
        Self {
            children: Vec::new(),
            ids,
        }
    }

    /// Build a document from parsed blocks, issuing ids in order
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut doc = Self::new();
        for node in nodes {
            doc.push(node);
        }
        doc
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    /// Append a block, giving it a fresh id
    pub fn push(&mut self, mut node: Node) -> Option<StableId> {
        let live = self.live_ids();
        self.admit(&mut node, &live);
        let id = node.id().cloned();
        self.children.push(node);
        id
    }

    /// Ensure `node` carries an id this document may hold.
    ///
    /// An id previously issued by this document and absent from `live` is
    /// kept; anything else is replaced by a freshly minted id.
    pub fn admit(&mut self, node: &mut Node, live: &HashSet<StableId>) {
        let ids = &mut self.ids;
        if let Some(slot) = node.id_slot() {
            let keep = slot
                .as_ref()
                .is_some_and(|id| ids.issued(id) && !live.contains(id));
            if !keep {
                *slot = Some(ids.new_id());
            }
        }
    }

    /// Ids currently held by top-level blocks
    pub fn live_ids(&self) -> HashSet<StableId> {
        self.children.iter().filter_map(|n| n.id().cloned()).collect()
    }

    pub fn position(&self, id: &StableId) -> Option<usize> {
        self.children.iter().position(|n| n.id() == Some(id))
    }

    pub fn find(&self, id: &StableId) -> Option<&Node> {
        self.children.iter().find(|n| n.id() == Some(id))
    }

    pub fn find_mut(&mut self, id: &StableId) -> Option<&mut Node> {
        self.children.iter_mut().find(|n| n.id() == Some(id))
    }

    /// All place marks in document order
    pub fn place_marks(&self) -> Vec<&PlaceMark> {
        let mut marks = Vec::new();
        for node in &self.children {
            collect_marks(node, &mut marks);
        }
        marks
    }

    pub fn for_each_mark_mut(&mut self, mut f: impl FnMut(&mut PlaceMark)) {
        for node in &mut self.children {
            node.for_each_mark_mut(&mut f);
        }
    }
}

fn collect_marks<'a>(node: &'a Node, out: &mut Vec<&'a PlaceMark>) {
    match node {
        Node::PlaceMark(mark) => out.push(mark),
        Node::Text { .. } => {}
        _ => {
            for child in node.children().unwrap_or_default() {
                collect_marks(child, out);
            }
        }
    }
}
