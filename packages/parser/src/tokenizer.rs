use logos::{Lexer, Logos};
use std::fmt;
use std::ops::Range;

/// Lexemes between tags
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum Content<'src> {
    #[regex(r"<[A-Za-z][A-Za-z0-9]*", |lex| &lex.slice()[1..])]
    OpenStart(&'src str),

    #[regex(r"</[A-Za-z][A-Za-z0-9]*", |lex| &lex.slice()[2..])]
    CloseStart(&'src str),

    #[token("<")]
    Lt,

    #[token("</")]
    LtSlash,

    #[regex(r"[^<]+")]
    Text,
}

/// Lexemes inside a tag, after its name
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum InTag<'src> {
    #[regex(r#"[^\s"'=<>/]+"#, |lex| lex.slice())]
    Word(&'src str),

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#, unquote)]
    #[regex(r"'[^']*'", unquote)]
    Quoted(&'src str),

    /// A quoted value with no closing quote runs to end of input
    #[regex(r#""[^"]*"#)]
    #[regex(r"'[^']*")]
    Unterminated,

    #[token(">")]
    End,

    #[token("/>")]
    SelfEnd,
}

fn unquote<'src>(lex: &mut Lexer<'src, InTag<'src>>) -> &'src str {
    let slice = lex.slice();
    &slice[1..slice.len() - 1]
}

/// Attribute inside an opening tag; `value` is raw (entities not decoded)
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute<'src> {
    pub name: &'src str,
    pub value: Option<&'src str>,
}

/// Markup token
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    /// `<name attr="v">` or `<name/>`
    Open {
        name: &'src str,
        attributes: Vec<Attribute<'src>>,
        self_closing: bool,
    },

    /// `</name>`
    Close { name: &'src str },

    /// Raw text, entities not decoded
    Text(&'src str),

    /// A construct cut off by the end of input: an unterminated tag, a
    /// quoted value missing its closing quote, or a dangling `<` / `</`.
    /// Always the last token and always runs to the end of input.
    Partial,
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Open { name, .. } => write!(f, "<{}>", name),
            Token::Close { name } => write!(f, "</{}>", name),
            Token::Text(s) => write!(f, "text {:?}", s),
            Token::Partial => write!(f, "incomplete tag"),
        }
    }
}

pub type Spanned<'src> = (Token<'src>, Range<usize>);

enum TagScan<'src> {
    Complete {
        attributes: Vec<Attribute<'src>>,
        self_closing: bool,
    },
    /// Input ended inside the tag
    Truncated,
    /// Not a tag after all; the `<name` prefix is text
    Malformed,
}

enum Expect<'src> {
    Name,
    EqualsOr(&'src str),
    Value(&'src str),
}

fn scan_tag<'src>(tag: &mut Lexer<'src, InTag<'src>>, closing: bool) -> TagScan<'src> {
    let mut attributes = Vec::new();
    let mut expect = Expect::Name;

    loop {
        let Some(lexeme) = tag.next() else {
            return TagScan::Truncated;
        };

        match lexeme {
            Err(()) => return TagScan::Malformed,
            Ok(InTag::Unterminated) => return TagScan::Truncated,
            Ok(InTag::Word(word)) => {
                expect = match expect {
                    Expect::Name => Expect::EqualsOr(word),
                    Expect::EqualsOr(prev) => {
                        attributes.push(Attribute { name: prev, value: None });
                        Expect::EqualsOr(word)
                    }
                    Expect::Value(name) => {
                        attributes.push(Attribute { name, value: Some(word) });
                        Expect::Name
                    }
                };
            }
            Ok(InTag::Equals) => match expect {
                Expect::EqualsOr(name) => expect = Expect::Value(name),
                Expect::Name | Expect::Value(_) => return TagScan::Malformed,
            },
            Ok(InTag::Quoted(value)) => match expect {
                Expect::Value(name) => {
                    attributes.push(Attribute { name, value: Some(value) });
                    expect = Expect::Name;
                }
                Expect::Name | Expect::EqualsOr(_) => return TagScan::Malformed,
            },
            Ok(end @ (InTag::End | InTag::SelfEnd)) => {
                match expect {
                    Expect::Name => {}
                    Expect::EqualsOr(name) => attributes.push(Attribute { name, value: None }),
                    Expect::Value(_) => return TagScan::Malformed,
                }
                let self_closing = end == InTag::SelfEnd;
                if closing && (self_closing || !attributes.is_empty()) {
                    return TagScan::Malformed;
                }
                return TagScan::Complete {
                    attributes,
                    self_closing,
                };
            }
        }
    }
}

fn push_text<'src>(tokens: &mut Vec<Spanned<'src>>, source: &'src str, span: Range<usize>) {
    // Merge with a preceding text token so literal tags read as one run
    if let Some((token, prev)) = tokens.last_mut() {
        if matches!(token, Token::Text(_)) && prev.end == span.start {
            prev.end = span.end;
            *token = Token::Text(&source[prev.start..prev.end]);
            return;
        }
    }
    tokens.push((Token::Text(&source[span.clone()]), span));
}

/// Tokenize markup into tags and text
///
/// Never fails: anything that does not form a tag is text, and a construct
/// cut off by the end of input becomes a trailing [`Token::Partial`].
pub fn tokenize(source: &str) -> Vec<Spanned<'_>> {
    let mut tokens = Vec::new();
    let mut offset = 0;

    'restart: while offset < source.len() {
        let mut lex = Content::lexer(&source[offset..]);

        while let Some(lexeme) = lex.next() {
            let local = lex.span();
            let span = offset + local.start..offset + local.end;

            match lexeme {
                Ok(Content::Text) | Err(()) => push_text(&mut tokens, source, span),
                Ok(Content::Lt) | Ok(Content::LtSlash) => {
                    if span.end == source.len() {
                        tokens.push((Token::Partial, span.start..source.len()));
                    } else {
                        push_text(&mut tokens, source, span);
                    }
                }
                Ok(Content::OpenStart(name)) | Ok(Content::CloseStart(name)) => {
                    let closing = matches!(lexeme, Ok(Content::CloseStart(_)));
                    let mut tag = lex.morph::<InTag>();

                    match scan_tag(&mut tag, closing) {
                        TagScan::Complete {
                            attributes,
                            self_closing,
                        } => {
                            let end = offset + tag.span().end;
                            let token = if closing {
                                Token::Close { name }
                            } else {
                                Token::Open {
                                    name,
                                    attributes,
                                    self_closing,
                                }
                            };
                            tokens.push((token, span.start..end));
                            lex = tag.morph();
                        }
                        TagScan::Truncated => {
                            tokens.push((Token::Partial, span.start..source.len()));
                            break 'restart;
                        }
                        TagScan::Malformed => {
                            push_text(&mut tokens, source, span.clone());
                            offset = span.end;
                            continue 'restart;
                        }
                    }
                }
            }
        }

        break;
    }

    tokens
}
