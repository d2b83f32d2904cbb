use crate::ast::{Coordinate, Document, Node, PlaceMark};
use crate::error::ParseDegraded;
use crate::tokenizer::{tokenize, Attribute, Spanned, Token};
use html_escape::decode_html_entities;

/// How the parser treats constructs whose end has not been seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Stop before the first incomplete construct
    Streaming,
    /// Close everything at end of input; partial tags become text
    Final,
}

/// Result of one parse pass
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    /// Top-level blocks, without ids
    pub nodes: Vec<Node>,
    /// Bytes of input forming complete constructs
    pub consumed: usize,
    pub diagnostics: Vec<ParseDegraded>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Block {
    Heading(u8),
    Paragraph,
    List { ordered: bool },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Element {
    Block(Block),
    Item,
    Mark,
}

impl Element {
    fn classify(name: &str) -> Option<Self> {
        let element = match name.to_ascii_lowercase().as_str() {
            "heading" | "h1" => Element::Block(Block::Heading(1)),
            "h2" => Element::Block(Block::Heading(2)),
            "h3" => Element::Block(Block::Heading(3)),
            "h4" => Element::Block(Block::Heading(4)),
            "h5" => Element::Block(Block::Heading(5)),
            "h6" => Element::Block(Block::Heading(6)),
            "p" => Element::Block(Block::Paragraph),
            "ul" => Element::Block(Block::List { ordered: false }),
            "ol" => Element::Block(Block::List { ordered: true }),
            "li" => Element::Item,
            "mark" => Element::Mark,
            _ => return None,
        };
        Some(element)
    }

    fn block(self) -> Option<Block> {
        match self {
            Element::Block(block) => Some(block),
            Element::Item | Element::Mark => None,
        }
    }
}

impl Block {
    /// Whether a closing tag of `other` ends this block
    fn closed_by(self, other: Block) -> bool {
        match (self, other) {
            (Block::Heading(_), Block::Heading(_)) => true,
            (a, b) => a == b,
        }
    }
}

fn block_of(name: &str) -> Option<Block> {
    Element::classify(name).and_then(Element::block)
}

fn block_name(block: Block) -> &'static str {
    match block {
        Block::Heading(_) => "heading",
        Block::Paragraph => "p",
        Block::List { ordered: false } => "ul",
        Block::List { ordered: true } => "ol",
    }
}

/// What ends an inline run
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scope {
    Block(Block),
    /// List item inside the given list
    Item(Block),
    Loose,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stop {
    /// Terminator belongs to this run
    Consume,
    /// Terminator belongs to an enclosing construct
    Leave,
    No,
}

/// Classification of the token at the top level
enum Lead {
    Blank,
    Block,
    Partial,
    Loose,
}

/// The construct needs input that has not arrived yet
struct Incomplete;

type Step<T> = Result<T, Incomplete>;

/// Parser for streamed travel markup
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Spanned<'src>>,
    pos: usize,
    mode: ParseMode,
    diagnostics: Vec<ParseDegraded>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, mode: ParseMode) -> Self {
        Self {
            source,
            tokens: tokenize(source),
            pos: 0,
            mode,
            diagnostics: Vec::new(),
        }
    }

    /// Parse the top-level block sequence
    pub fn parse(mut self) -> ParseOutput {
        let mut nodes = Vec::new();
        let mut consumed = 0;

        while let Some(lead) = self.lead() {
            let restart = self.pos;
            let reported = self.diagnostics.len();

            let step = match lead {
                Lead::Blank => {
                    self.advance();
                    Ok(None)
                }
                Lead::Block => self.parse_block().map(Some),
                Lead::Partial if self.mode == ParseMode::Streaming => Err(Incomplete),
                Lead::Partial | Lead::Loose => self.parse_loose(),
            };

            match step {
                Ok(node) => {
                    nodes.extend(node);
                    consumed = self.offset();
                }
                Err(Incomplete) => {
                    self.pos = restart;
                    self.diagnostics.truncate(reported);
                    break;
                }
            }
        }

        if self.mode == ParseMode::Final {
            consumed = self.source.len();
        }

        ParseOutput {
            nodes,
            consumed,
            diagnostics: self.diagnostics,
        }
    }

    fn peek(&self) -> Option<&Spanned<'src>> {
        self.tokens.get(self.pos)
    }

    fn current(&self) -> Option<Spanned<'src>> {
        self.peek().cloned()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    /// Byte offset just past the last consumed token
    fn offset(&self) -> usize {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some((_, span)) => span.end,
            None => 0,
        }
    }

    fn streaming(&self) -> bool {
        self.mode == ParseMode::Streaming
    }

    fn lead(&self) -> Option<Lead> {
        let (token, _) = self.peek()?;
        let lead = match token {
            Token::Text(raw) if raw.trim().is_empty() => Lead::Blank,
            Token::Open { name, .. } if block_of(name).is_some() => Lead::Block,
            Token::Partial => Lead::Partial,
            _ => Lead::Loose,
        };
        Some(lead)
    }

    /// End of input reached inside `element` opened at `at`
    fn close_at_end(&mut self, element: &str, at: usize) -> Step<()> {
        if self.streaming() {
            return Err(Incomplete);
        }
        self.diagnostics.push(ParseDegraded::auto_closed(at, element));
        Ok(())
    }

    fn stop(token: &Token<'_>, scope: Scope) -> Stop {
        match (token, scope) {
            (Token::Close { name }, Scope::Block(block)) => match block_of(name) {
                Some(closing) if block.closed_by(closing) => Stop::Consume,
                _ => Stop::No,
            },
            (Token::Close { name }, Scope::Item(list)) => match Element::classify(name) {
                Some(Element::Item) => Stop::Consume,
                Some(Element::Block(closing)) if list.closed_by(closing) => Stop::Leave,
                _ => Stop::No,
            },
            (Token::Open { name, .. }, Scope::Item(_)) => match Element::classify(name) {
                Some(Element::Item) => Stop::Leave,
                _ => Stop::No,
            },
            (Token::Open { name, .. }, Scope::Loose) if block_of(name).is_some() => Stop::Leave,
            _ => Stop::No,
        }
    }

    fn parse_block(&mut self) -> Step<Node> {
        let Some((Token::Open { name, attributes, self_closing }, span)) = self.current() else {
            self.advance();
            return Ok(Node::paragraph(Vec::new()));
        };
        self.advance();

        let Some(block) = block_of(name) else {
            return Ok(Node::paragraph(vec![Node::text(&self.source[span])]));
        };

        match block {
            Block::Heading(level) => {
                let level = if name.eq_ignore_ascii_case("heading") {
                    self.heading_level(&attributes, span.start)
                } else {
                    level
                };
                let children = if self_closing {
                    Vec::new()
                } else {
                    self.parse_inline(Scope::Block(block), span.start)?
                };
                Ok(Node::heading(level, children))
            }
            Block::Paragraph => {
                let children = if self_closing {
                    Vec::new()
                } else {
                    self.parse_inline(Scope::Block(block), span.start)?
                };
                Ok(Node::paragraph(children))
            }
            Block::List { ordered } => {
                let items = if self_closing {
                    Vec::new()
                } else {
                    self.parse_items(block, span.start)?
                };
                Ok(Node::list(ordered, items))
            }
        }
    }

    fn heading_level(&mut self, attributes: &[Attribute<'_>], at: usize) -> u8 {
        let Some(attr) = attributes.iter().find(|a| a.name.eq_ignore_ascii_case("level")) else {
            return 1;
        };
        let raw = attr.value.unwrap_or_default();
        match raw.trim().parse::<u8>() {
            Ok(level @ 1..=6) => level,
            _ => {
                self.diagnostics
                    .push(ParseDegraded::invalid_attribute(at, attr.name, raw));
                1
            }
        }
    }

    fn parse_items(&mut self, list: Block, at: usize) -> Step<Vec<Node>> {
        let mut items = Vec::new();

        loop {
            let Some((token, span)) = self.current() else {
                self.close_at_end(block_name(list), at)?;
                return Ok(items);
            };

            if Self::stop(&token, Scope::Block(list)) == Stop::Consume {
                self.advance();
                return Ok(items);
            }

            match token {
                Token::Text(raw) if raw.trim().is_empty() => self.advance(),
                Token::Partial if self.streaming() => return Err(Incomplete),
                Token::Open { name, self_closing, .. }
                    if Element::classify(name) == Some(Element::Item) =>
                {
                    self.advance();
                    let children = if self_closing {
                        Vec::new()
                    } else {
                        self.parse_inline(Scope::Item(list), span.start)?
                    };
                    items.push(Node::item(children));
                }
                _ => {
                    self.diagnostics.push(ParseDegraded::implicit_item(span.start));
                    let children = self.parse_inline(Scope::Item(list), span.start)?;
                    items.push(Node::item(children));
                }
            }
        }
    }

    fn parse_inline(&mut self, scope: Scope, at: usize) -> Step<Vec<Node>> {
        let mut children = Vec::new();

        loop {
            let Some((token, span)) = self.current() else {
                let element = match scope {
                    Scope::Block(block) => block_name(block),
                    Scope::Item(_) => "li",
                    Scope::Loose => return Ok(children),
                };
                self.close_at_end(element, at)?;
                return Ok(children);
            };

            match Self::stop(&token, scope) {
                Stop::Consume => {
                    self.advance();
                    return Ok(children);
                }
                Stop::Leave => return Ok(children),
                Stop::No => {}
            }

            match token {
                Token::Text(raw) => {
                    self.advance();
                    push_text(&mut children, &decode_html_entities(raw));
                }
                Token::Partial => {
                    if self.streaming() {
                        return Err(Incomplete);
                    }
                    self.diagnostics.push(ParseDegraded::partial_tag(span.start));
                    self.advance();
                    push_text(&mut children, &self.source[span]);
                }
                Token::Open {
                    name,
                    attributes,
                    self_closing,
                } => {
                    self.advance();
                    match Element::classify(name) {
                        Some(Element::Mark) => {
                            let mark = self.parse_mark(&attributes, self_closing, span.start, scope)?;
                            children.extend(mark);
                        }
                        Some(_) => {
                            self.diagnostics.push(ParseDegraded::misplaced(span.start, name));
                            push_text(&mut children, &self.source[span]);
                        }
                        None => push_text(&mut children, &self.source[span]),
                    }
                }
                Token::Close { name } => {
                    // Close of another list kind inside an item
                    if matches!(scope, Scope::Item(_))
                        && matches!(block_of(name), Some(Block::List { .. }))
                    {
                        self.diagnostics.push(ParseDegraded::misplaced(span.start, name));
                    }
                    self.advance();
                    push_text(&mut children, &self.source[span]);
                }
            }
        }
    }

    fn parse_mark(
        &mut self,
        attributes: &[Attribute<'_>],
        self_closing: bool,
        at: usize,
        outer: Scope,
    ) -> Step<Option<Node>> {
        if self_closing {
            self.diagnostics.push(ParseDegraded::empty_mark(at));
            return Ok(None);
        }

        let mut name = String::new();
        loop {
            let Some((token, span)) = self.current() else {
                self.close_at_end("mark", at)?;
                break;
            };

            if let Token::Close { name: closing } = &token {
                if Element::classify(closing) == Some(Element::Mark) {
                    self.advance();
                    break;
                }
            }
            if Self::stop(&token, outer) != Stop::No {
                self.diagnostics.push(ParseDegraded::auto_closed(at, "mark"));
                break;
            }

            match token {
                Token::Text(raw) => name.push_str(&decode_html_entities(raw)),
                Token::Partial if self.streaming() => return Err(Incomplete),
                Token::Partial => {
                    self.diagnostics.push(ParseDegraded::partial_tag(span.start));
                    name.push_str(&self.source[span]);
                }
                Token::Open { .. } | Token::Close { .. } => name.push_str(&self.source[span]),
            }
            self.advance();
        }

        if name.trim().is_empty() {
            self.diagnostics.push(ParseDegraded::empty_mark(at));
            return Ok(None);
        }

        let mut mark = PlaceMark::new(name);
        self.apply_mark_attributes(&mut mark, attributes, at);
        Ok(Some(Node::PlaceMark(mark)))
    }

    fn apply_mark_attributes(&mut self, mark: &mut PlaceMark, attributes: &[Attribute<'_>], at: usize) {
        for attr in attributes {
            let raw = attr.value.unwrap_or_default();
            let value = decode_html_entities(raw);
            let value = value.trim();

            let accepted = match attr.name.to_ascii_lowercase().as_str() {
                "color" => value.parse::<u8>().map(|c| mark.color_index = Some(c)).is_ok(),
                "lat" => parse_coordinate(value).map(|c| mark.latitude = c).is_some(),
                "lng" | "lon" => parse_coordinate(value).map(|c| mark.longitude = c).is_some(),
                _ => true,
            };

            if !accepted {
                self.diagnostics
                    .push(ParseDegraded::invalid_attribute(at, attr.name, raw));
            }
        }
    }

    fn parse_loose(&mut self) -> Step<Option<Node>> {
        let start = self.peek().map(|(_, span)| span.start).unwrap_or_default();
        let mut children = Vec::new();

        loop {
            match self.lead() {
                None if self.streaming() => return Err(Incomplete),
                None | Some(Lead::Block) => break,
                Some(Lead::Partial) if self.streaming() => return Err(Incomplete),
                Some(_) => {}
            }

            let Some((token, span)) = self.current() else {
                break;
            };
            self.advance();

            match token {
                Token::Text(raw) => push_text(&mut children, &decode_html_entities(raw)),
                Token::Partial => {
                    self.diagnostics.push(ParseDegraded::partial_tag(span.start));
                    push_text(&mut children, &self.source[span]);
                }
                Token::Open {
                    name,
                    attributes,
                    self_closing,
                } if Element::classify(name) == Some(Element::Mark) => {
                    let mark = self.parse_mark(&attributes, self_closing, span.start, Scope::Loose)?;
                    children.extend(mark);
                }
                Token::Open { name, .. } => {
                    if Element::classify(name).is_some() {
                        self.diagnostics.push(ParseDegraded::misplaced(span.start, name));
                    }
                    push_text(&mut children, &self.source[span]);
                }
                Token::Close { .. } => push_text(&mut children, &self.source[span]),
            }
        }

        trim_edges(&mut children);
        if children.is_empty() {
            return Ok(None);
        }
        tracing::trace!(pos = start, "loose text wrapped in a paragraph");
        Ok(Some(Node::paragraph(children)))
    }
}

fn parse_coordinate(value: &str) -> Option<Coordinate> {
    if value.eq_ignore_ascii_case("none") {
        return Some(Coordinate::Unresolved);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Coordinate::Resolved)
}

/// Append text, merging with a preceding text node
fn push_text(children: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text { value }) = children.last_mut() {
        value.push_str(text);
        return;
    }
    children.push(Node::text(text));
}

/// Strip surrounding whitespace of a loose run
fn trim_edges(children: &mut Vec<Node>) {
    if let Some(Node::Text { value }) = children.first_mut() {
        *value = value.trim_start().to_string();
    }
    if let Some(Node::Text { value }) = children.last_mut() {
        *value = value.trim_end().to_string();
    }
    children.retain(|c| !matches!(c, Node::Text { value } if value.is_empty()));
}

/// Parse complete markup into a document, closing anything left open
pub fn parse(source: &str) -> Document {
    parse_with_diagnostics(source).0
}

pub fn parse_with_diagnostics(source: &str) -> (Document, Vec<ParseDegraded>) {
    let output = Parser::new(source, ParseMode::Final).parse();
    (Document::from_nodes(output.nodes), output.diagnostics)
}

/// Parse markup into blocks that have no ids yet
pub fn parse_fragment(source: &str) -> Vec<Node> {
    Parser::new(source, ParseMode::Final).parse().nodes
}
