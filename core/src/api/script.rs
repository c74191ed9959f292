//! Compiled scripts.

use alloc::sync::Arc;
use core::fmt;

use super::expression::run;
use super::{Configuration, Error};
use crate::String;
use crate::evaluator::Context;
use crate::parser::{Node, NodeKind};
use crate::values::Value;

/// A compiled whole program.
///
/// The root node always carries [`NodeKind::Script`]. Like
/// [`Expression`](super::Expression), a script is immutable and keeps the
/// configuration that was current when it was compiled.
#[derive(Clone)]
pub struct Script {
    config: Arc<Configuration>,
    text: String,
    root: Arc<Node>,
}

impl Script {
    pub(crate) fn new(config: Arc<Configuration>, text: String, root: Node) -> Self {
        debug_assert_eq!(root.kind, NodeKind::Script);
        Self {
            config,
            text,
            root: Arc::new(root),
        }
    }

    /// The normalized text the tree was translated from.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The top-level statements, in order.
    pub fn statements(&self) -> &[Node] {
        &self.root.children
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.config
    }

    /// Run every statement against `context`.
    ///
    /// Returns the value of the last statement, or `null` for an empty
    /// program. Failures follow the captured failure mode.
    pub fn execute(&self, context: &mut dyn Context) -> Result<Value, Error> {
        run(&self.config, &self.root, context)
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("text", &self.text)
            .field("statements", &self.root.children.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
