use crate::ast::*;
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Serializer converts a document tree back to canonical markup
///
/// Every top-level block is followed by a newline. Ids are not part of the
/// markup; a parsed copy receives fresh ones.
pub struct Serializer {
    output: String,
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    pub fn serialize(mut self, doc: &Document) -> String {
        for node in &doc.children {
            self.serialize_node(node);
        }
        self.output
    }

    fn serialize_node(&mut self, node: &Node) {
        match node {
            Node::Heading { level, children, .. } => {
                self.output.push_str(&format!("<heading level=\"{}\">", level));
                self.serialize_inline(children);
                self.output.push_str("</heading>\n");
            }
            Node::Paragraph { children, .. } => {
                self.output.push_str("<p>");
                self.serialize_inline(children);
                self.output.push_str("</p>\n");
            }
            Node::List {
                ordered, children, ..
            } => {
                let tag = if *ordered { "ol" } else { "ul" };
                self.output.push_str(&format!("<{}>", tag));
                for item in children {
                    self.serialize_item(item);
                }
                self.output.push_str(&format!("</{}>\n", tag));
            }
            Node::ListItem { .. } => self.serialize_item(node),
            Node::PlaceMark(mark) => self.serialize_mark(mark),
            Node::Text { value } => self.output.push_str(&encode_text(value)),
        }
    }

    fn serialize_item(&mut self, item: &Node) {
        self.output.push_str("<li>");
        self.serialize_inline(item.children().unwrap_or_default());
        self.output.push_str("</li>");
    }

    fn serialize_inline(&mut self, children: &[Node]) {
        for child in children {
            match child {
                Node::Text { value } => self.output.push_str(&encode_text(value)),
                Node::PlaceMark(mark) => self.serialize_mark(mark),
                // Blocks never nest; flatten to their text
                other => self.output.push_str(&encode_text(&other.text_content())),
            }
        }
    }

    fn serialize_mark(&mut self, mark: &PlaceMark) {
        self.output.push_str("<mark");
        if let Some(color) = mark.color_index {
            self.output.push_str(&format!(" color=\"{}\"", color));
        }
        self.serialize_coordinate("lat", &mark.latitude);
        self.serialize_coordinate("lng", &mark.longitude);
        self.output.push('>');
        self.output.push_str(&encode_text(&mark.display_name));
        self.output.push_str("</mark>");
    }

    fn serialize_coordinate(&mut self, name: &str, coordinate: &Coordinate) {
        match coordinate {
            Coordinate::Pending => {}
            Coordinate::Unresolved => self.output.push_str(&format!(" {}=\"none\"", name)),
            Coordinate::Resolved(value) => {
                let value = value.to_string();
                self.output.push_str(&format!(
                    " {}=\"{}\"",
                    name,
                    encode_double_quoted_attribute(&value)
                ));
            }
        }
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize a document to canonical markup
pub fn serialize(doc: &Document) -> String {
    Serializer::new().serialize(doc)
}

/// Serialize a single node; blocks include their trailing newline
pub fn serialize_node(node: &Node) -> String {
    let mut serializer = Serializer::new();
    serializer.serialize_node(node);
    serializer.output
}

/// Length of a node's serialized form, in chars
pub fn serialized_len(node: &Node) -> usize {
    serialize_node(node).chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_serialize_blocks() {
        let doc = Document::from_nodes(vec![
            Node::heading(2, vec![Node::text("Day 1")]),
            Node::paragraph(vec![Node::text("Visit "), Node::place("Louvre")]),
            Node::list(false, vec![Node::item(vec![Node::text("a")])]),
        ]);

        assert_eq!(
            serialize(&doc),
            "<heading level=\"2\">Day 1</heading>\n<p>Visit <mark>Louvre</mark></p>\n<ul><li>a</li></ul>\n"
        );
    }

    #[test]
    fn test_serialize_mark_attributes() {
        let mut mark = PlaceMark::new("Louvre").with_color(3);
        mark.latitude = Coordinate::Resolved(48.8606);
        mark.longitude = Coordinate::Unresolved;

        assert_eq!(
            serialize_node(&Node::PlaceMark(mark)),
            "<mark color=\"3\" lat=\"48.8606\" lng=\"none\">Louvre</mark>"
        );
    }

    #[test]
    fn test_escapes_text() {
        let node = Node::paragraph(vec![Node::text("a < b & c")]);
        assert_eq!(serialize_node(&node), "<p>a &lt; b &amp; c</p>\n");
    }

    #[test]
    fn test_round_trip() {
        let source = "<heading level=\"3\">Jour 2 &amp; café</heading>\n\
                      <ol><li><mark color=\"1\" lat=\"-33.8568\" lng=\"151.2153\">Opera House</mark></li><li></li></ol>\n\
                      <p>x &lt;b&gt; <mark lat=\"none\" lng=\"none\">Nowhere</mark></p>\n";
        let doc = parse(source);

        assert_eq!(serialize(&doc), source);
        assert_eq!(parse(&serialize(&doc)), doc);
    }

    #[test]
    fn test_serialized_len_counts_chars() {
        let node = Node::paragraph(vec![Node::text("café")]);
        assert_eq!(serialized_len(&node), "<p>café</p>\n".chars().count());
        assert_eq!(serialized_len(&node), 12);
    }
}
