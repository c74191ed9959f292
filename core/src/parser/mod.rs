pub mod error;
mod syntax;
mod translator;
mod tree;

pub use error::{ParseError, ParseErrorKind, TranslateError};
pub use syntax::{BinaryOp, ComparisonOp, Span};
pub use translator::{DEFAULT_MAX_PARSE_DEPTH, PestTranslator, Rule, ScriptParser, Translate};
pub use tree::{Literal, Node, NodeKind, Tree};

/// Translate `source` with a fresh [`PestTranslator`].
///
/// Convenient for tooling and tests; the engine keeps its own instance.
pub fn translate(source: &str) -> Result<Tree, TranslateError> {
    PestTranslator::default().translate(source)
}
