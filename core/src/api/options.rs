//! Configuration options for the Sable engine.

use crate::parser::DEFAULT_MAX_PARSE_DEPTH;

/// Default maximum evaluation depth.
///
/// Left-nested operator runs (`a + b + c`, `x.y.z`) are folded in a loop and
/// do not add depth, so the limit only bounds genuine nesting.
pub const DEFAULT_MAX_EVAL_DEPTH: usize = 128;

/// Resource limits for the Sable engine.
///
/// # Example
///
/// ```
/// use sable_core::api::EngineOptions;
///
/// let options = EngineOptions {
///     max_parse_depth: 64,
///     ..EngineOptions::default()
/// };
/// assert_eq!(options.max_eval_depth, 128);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Maximum nesting depth accepted by the translator.
    ///
    /// Default: 32
    pub max_parse_depth: usize,

    /// Maximum evaluation stack depth (for recursion protection).
    ///
    /// Default: 128
    pub max_eval_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_parse_depth: DEFAULT_MAX_PARSE_DEPTH,
            max_eval_depth: DEFAULT_MAX_EVAL_DEPTH,
        }
    }
}
