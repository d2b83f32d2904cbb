use thiserror::Error;

/// Recoverable problem found while parsing; the affected markup is kept
/// as text or closed implicitly, never dropped silently.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseDegraded {
    #[error("unclosed <{element}> at {pos} was closed at end of input")]
    AutoClosed { pos: usize, element: String },

    #[error("incomplete tag at {pos} was kept as text")]
    PartialTag { pos: usize },

    #[error("<{element}> at {pos} is not allowed here and was kept as text")]
    Misplaced { pos: usize, element: String },

    #[error("empty place mark at {pos} was dropped")]
    EmptyMark { pos: usize },

    #[error("list content at {pos} outside <li> was wrapped in an item")]
    ImplicitItem { pos: usize },

    #[error("invalid attribute {name}=\"{value}\" at {pos} was ignored")]
    InvalidAttribute {
        pos: usize,
        name: String,
        value: String,
    },
}

impl ParseDegraded {
    pub fn auto_closed(pos: usize, element: impl Into<String>) -> Self {
        Self::AutoClosed {
            pos,
            element: element.into(),
        }
    }

    pub fn partial_tag(pos: usize) -> Self {
        Self::PartialTag { pos }
    }

    pub fn misplaced(pos: usize, element: impl Into<String>) -> Self {
        Self::Misplaced {
            pos,
            element: element.into(),
        }
    }

    pub fn empty_mark(pos: usize) -> Self {
        Self::EmptyMark { pos }
    }

    pub fn implicit_item(pos: usize) -> Self {
        Self::ImplicitItem { pos }
    }

    pub fn invalid_attribute(pos: usize, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            pos,
            name: name.into(),
            value: value.into(),
        }
    }

    /// Byte offset in the stream where the problem starts
    pub fn pos(&self) -> usize {
        match self {
            Self::AutoClosed { pos, .. }
            | Self::PartialTag { pos }
            | Self::Misplaced { pos, .. }
            | Self::EmptyMark { pos }
            | Self::ImplicitItem { pos }
            | Self::InvalidAttribute { pos, .. } => *pos,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("stream already finished; fragment of {len} bytes rejected")]
    Frozen { len: usize },
}
