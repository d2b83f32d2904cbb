pub mod ast;
pub mod buffer;
pub mod error;
pub mod id_generator;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

pub use ast::{normalize_name, Coordinate, Document, Node, PlaceMark, StableId};
pub use buffer::{DocumentDelta, TagBuffer};
pub use error::{BufferError, ParseDegraded};
pub use id_generator::IdGenerator;
pub use parser::{parse, parse_fragment, parse_with_diagnostics, ParseMode, Parser};
pub use serializer::{serialize, serialize_node, serialized_len, Serializer};
pub use tokenizer::{tokenize, Token};
