//! Compiled expressions.

use alloc::sync::Arc;
use core::fmt;

use super::{Configuration, Error, FailureMode};
use crate::String;
use crate::evaluator::{self, Context, ExecutionError};
use crate::parser::Node;
use crate::values::Value;

/// A compiled single-value expression.
///
/// Holds the first top-level unit of the translated text together with the
/// configuration that was current at compile time. Expressions are
/// immutable and cheap to clone; any number of threads may evaluate the same
/// expression at once, each with its own [`Context`].
///
/// # Example
///
/// ```
/// use sable_core::Engine;
/// use sable_core::evaluator::MapContext;
///
/// let engine = Engine::new();
/// let expr = engine.compile_expression("x * 2").unwrap();
///
/// let mut ctx = MapContext::new().with("x", 21);
/// assert_eq!(expr.evaluate(&mut ctx).unwrap().as_int(), Some(42));
/// ```
#[derive(Clone)]
pub struct Expression {
    config: Arc<Configuration>,
    text: String,
    source: Arc<str>,
    node: Arc<Node>,
    discarded_units: usize,
}

impl Expression {
    pub(crate) fn new(
        config: Arc<Configuration>,
        text: String,
        source: Arc<str>,
        node: Node,
        discarded_units: usize,
    ) -> Self {
        Self {
            config,
            text,
            source,
            node: Arc::new(node),
            discarded_units,
        }
    }

    /// The text as given by the caller, before normalization.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The normalized text the node's spans refer to.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.config
    }

    /// Number of top-level units dropped after the first one.
    pub fn discarded_units(&self) -> usize {
        self.discarded_units
    }

    /// Evaluate the expression against `context`.
    ///
    /// Runtime failures are returned or turned into `null` according to the
    /// failure mode captured at compile time.
    pub fn evaluate(&self, context: &mut dyn Context) -> Result<Value, Error> {
        run(&self.config, &self.node, context)
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("text", &self.text)
            .field("node", &self.node)
            .field("discarded_units", &self.discarded_units)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Evaluate `node` and apply the failure mode of `config`.
pub(crate) fn run(
    config: &Configuration,
    node: &Node,
    context: &mut dyn Context,
) -> Result<Value, Error> {
    match evaluator::evaluate(config, node, context) {
        Ok(value) => Ok(value),
        Err(ExecutionError::ResourceExceeded(e)) => Err(Error::ResourceExceeded(e.to_string())),
        Err(ExecutionError::Runtime { error, span }) => match config.failure_mode() {
            FailureMode::Strict => Err(Error::Evaluation { error, span }),
            FailureMode::Suppressing => {
                tracing::debug!(%error, ?span, "Suppressed evaluation failure");
                Ok(Value::Null)
            }
        },
    }
}
