//! Tree-walking evaluator for translated programs.
//!
//! The interpreter walks a [`Node`](crate::parser::Node) against a caller's
//! [`Context`]. Operators go through the configured [`Arithmetic`] and member
//! access through the configured
//! [`ValueResolver`](crate::introspection::ValueResolver).
//!
//! ## Design Principles
//!
//! - **Never panic**: malformed trees and bad data produce errors
//! - **Stack-safe**: depth tracking prevents stack overflow from deeply nested programs
//! - **Stateless**: all per-evaluation state lives in the interpreter and the context
//!
//! ## Example
//!
//! ```
//! use sable_core::evaluator::{MapContext, evaluate};
//! use sable_core::{Configuration, parser};
//!
//! let tree = parser::translate("x * 2;").unwrap();
//! let mut ctx = MapContext::new().with("x", 21);
//! let result = evaluate(&Configuration::shared_default(), &tree.root, &mut ctx).unwrap();
//! assert_eq!(result.as_int(), Some(42));
//! ```

mod arithmetic;
mod context;
mod error;
mod interpreter;

#[cfg(test)]
mod interpreter_test;

pub use arithmetic::{Arithmetic, StandardArithmetic};
pub use context::{Context, MapContext};
pub use error::{EvalError, ExecutionError, ResourceExceededError};
pub use interpreter::Interpreter;

use crate::{api::Configuration, parser::Node, values::Value};

/// Evaluate `node` under `config`, reading and writing variables in `context`.
///
/// Failures are returned as-is; the failure mode is applied by the caller.
pub fn evaluate(
    config: &Configuration,
    node: &Node,
    context: &mut dyn Context,
) -> Result<Value, ExecutionError> {
    Interpreter::new(config, context).eval(node)
}
