//! Runtime evaluation errors.
//!
//! # Error Categories
//!
//! - **Runtime errors** ([`EvalError`]): failures caused by the program or
//!   its data (division by zero, unknown members, type mismatches). The
//!   failure mode decides whether these surface or become `null`.
//!
//! - **Resource exceeded errors**: fatal resource limit violations (stack
//!   overflow). These always surface, whatever the failure mode.

use crate::String;
use crate::parser::Span;

/// A failure raised by an operator, a resolver or a host object.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Cannot apply '{op}' to {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("Cannot apply '{op}' to {operand}")]
    InvalidOperand {
        op: &'static str,
        operand: &'static str,
    },

    #[error("Null operand for '{op}'")]
    NullOperand { op: &'static str },

    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String },

    #[error("Unknown property '{name}' on {on}")]
    UnknownProperty { name: String, on: &'static str },

    #[error("Unknown method '{name}' on {on}")]
    UnknownMethod { name: String, on: &'static str },

    #[error("Unknown namespace '{name}'")]
    UnknownNamespace { name: String },

    #[error("Unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("Cannot access '{name}' on null")]
    NullDereference { name: String },

    #[error("Index {index} out of bounds (length: {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("Cannot index {target} with {index}")]
    InvalidIndex {
        target: &'static str,
        index: &'static str,
    },

    #[error("Argument {position} of '{method}' must be {expected}, found {found}")]
    InvalidArgument {
        method: String,
        position: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("'{name}' expects {expected} argument(s), got {got}")]
    WrongArgumentCount {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Cannot assign to {target}")]
    NotAssignable { target: String },

    #[error("{0}")]
    Host(String),
}

/// Resource limit exceeded errors that cannot be suppressed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResourceExceededError {
    /// Evaluation recursion depth exceeded.
    #[error("Evaluation stack overflow: depth {depth} exceeds maximum of {max_depth}")]
    StackOverflow { depth: usize, max_depth: usize },
}

/// Outcome of a failed evaluation, as reported by the interpreter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    #[error("{error} at {}..{}", .span.0.start, .span.0.end)]
    Runtime { error: EvalError, span: Span },

    #[error(transparent)]
    ResourceExceeded(#[from] ResourceExceededError),
}
