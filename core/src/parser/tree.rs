//! Translated program trees.
//!
//! A [`Tree`] is the immutable result of one translation. Every [`Node`]
//! carries a [`NodeKind`] tag, its ordered children and the span of source
//! text it was produced from. Trees own their data, so compiled programs can
//! be shared across threads without borrowing from the engine.

use alloc::sync::Arc;
use core::fmt;

use crate::parser::{BinaryOp, ComparisonOp, Span};
use crate::{String, Vec};

/// The result of translating one source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    /// The normalized text the spans refer to.
    pub source: Arc<str>,
    pub root: Node,
}

impl Tree {
    pub fn new(source: impl Into<Arc<str>>, root: Node) -> Self {
        Self {
            source: source.into(),
            root,
        }
    }

    /// Number of top-level units under the root.
    pub fn unit_count(&self) -> usize {
        self.root.children.len()
    }

    /// Splits the tree into its root tag and its top-level units.
    pub fn into_units(self) -> (NodeKind, Span, Vec<Node>) {
        (self.root.kind, self.root.span, self.root.children)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<Node>,
}

/// Syntactic kind of a node.
///
/// Child layout per kind:
/// - `Script`, `Block`, `Array`, `FunctionCall`: any number of children
/// - `If`: `[cond, then]` or `[cond, then, else]`
/// - `While`: `[cond, body]`
/// - `Assign`: `[target, value]`
/// - `Ternary`: `[cond, then, else]`
/// - `Or`, `And`, `Compare`, `Binary`, `Index`: `[left, right]`
/// - `Not`, `Neg`, `Field`: `[operand]`
/// - `MethodCall`: `[target, args...]`
/// - `Empty`, `Literal`, `Ident`: none
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Script,
    Block,
    Empty,
    If,
    While,
    Assign,
    Ternary,
    Or,
    And,
    Not,
    Compare(ComparisonOp),
    Binary(BinaryOp),
    Neg,
    Literal(Literal),
    Ident(String),
    Field(String),
    Index,
    MethodCall(String),
    FunctionCall {
        namespace: Option<String>,
        name: String,
    },
    Array,
}

impl NodeKind {
    /// Short tag name, used in diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Script => "script",
            NodeKind::Block => "block",
            NodeKind::Empty => "empty statement",
            NodeKind::If => "if",
            NodeKind::While => "while",
            NodeKind::Assign => "assignment",
            NodeKind::Ternary => "ternary",
            NodeKind::Or => "or",
            NodeKind::And => "and",
            NodeKind::Not => "not",
            NodeKind::Compare(_) => "comparison",
            NodeKind::Binary(_) => "arithmetic",
            NodeKind::Neg => "negation",
            NodeKind::Literal(_) => "literal",
            NodeKind::Ident(_) => "identifier",
            NodeKind::Field(_) => "field access",
            NodeKind::Index => "index",
            NodeKind::MethodCall(_) => "method call",
            NodeKind::FunctionCall { .. } => "function call",
            NodeKind::Array => "array",
        }
    }
}

#[derive(Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "Null"),
            Literal::Bool(b) => write!(f, "Bool({b})"),
            Literal::Int(value) => write!(f, "Int({value})"),
            Literal::Float(value) => write!(f, "Float({value})"),
            Literal::Str(s) => write!(f, "Str({s:?})"),
        }
    }
}

impl Node {
    pub fn new(kind: NodeKind, span: Span, children: Vec<Node>) -> Self {
        Self {
            kind,
            span,
            children,
        }
    }

    pub fn leaf(kind: NodeKind, span: Span) -> Self {
        Self::new(kind, span, Vec::new())
    }

    /// Deep equality of tags and shape, ignoring spans.
    pub fn structurally_eq(&self, other: &Node) -> bool {
        self.kind == other.kind
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(other.children.iter())
                .all(|(a, b)| a.structurally_eq(b))
    }

    /// Renders the tree as an indented outline (one node per line).
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(&mut out, 0);
        out
    }

    fn write_outline(&self, out: &mut String, indent: usize) {
        use core::fmt::Write;
        for _ in 0..indent {
            out.push_str("  ");
        }
        let _ = match &self.kind {
            NodeKind::Literal(lit) => writeln!(out, "{lit:?}"),
            NodeKind::Ident(name) => writeln!(out, "Ident({name})"),
            NodeKind::Field(name) => writeln!(out, "Field({name})"),
            NodeKind::MethodCall(name) => writeln!(out, "MethodCall({name})"),
            NodeKind::FunctionCall {
                namespace: Some(ns),
                name,
            } => writeln!(out, "FunctionCall({ns}:{name})"),
            NodeKind::FunctionCall {
                namespace: None,
                name,
            } => writeln!(out, "FunctionCall({name})"),
            NodeKind::Compare(op) => writeln!(out, "Compare({})", op.symbol()),
            NodeKind::Binary(op) => writeln!(out, "Binary({})", op.symbol()),
            other => writeln!(out, "{other:?}"),
        };
        for child in &self.children {
            child.write_outline(out, indent + 1);
        }
    }
}
