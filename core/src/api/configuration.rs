//! The immutable configuration bundle.

use alloc::sync::Arc;

use once_cell::sync::Lazy;

use super::Namespaces;
use super::options::DEFAULT_MAX_EVAL_DEPTH;
use crate::evaluator::{Arithmetic, StandardArithmetic};
use crate::introspection::{Introspector, ValueResolver};

static DEFAULT: Lazy<Arc<Configuration>> = Lazy::new(|| {
    Arc::new(Configuration::new(
        Arc::new(Introspector),
        Arc::new(StandardArithmetic::lenient()),
        Namespaces::empty(),
        FailureMode::default(),
        DEFAULT_MAX_EVAL_DEPTH,
    ))
});

/// What happens when evaluation fails at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FailureMode {
    /// Runtime failures are returned to the caller.
    Strict,
    /// Runtime failures are logged and evaluation yields `null`.
    #[default]
    Suppressing,
}

/// Everything an evaluation needs besides the program and the variables.
///
/// A bundle is never modified once built. Engines replace their bundle
/// wholesale, and compiled programs keep the bundle that was current when
/// they were compiled.
#[derive(Debug, Clone)]
pub struct Configuration {
    resolver: Arc<dyn ValueResolver>,
    arithmetic: Arc<dyn Arithmetic>,
    namespaces: Namespaces,
    failure_mode: FailureMode,
    max_eval_depth: usize,
}

impl Configuration {
    pub(crate) fn new(
        resolver: Arc<dyn ValueResolver>,
        arithmetic: Arc<dyn Arithmetic>,
        namespaces: Namespaces,
        failure_mode: FailureMode,
        max_eval_depth: usize,
    ) -> Self {
        Self {
            resolver,
            arithmetic,
            namespaces,
            failure_mode,
            max_eval_depth,
        }
    }

    /// The zero-configuration bundle, built on first use and shared.
    pub fn shared_default() -> Arc<Configuration> {
        DEFAULT.clone()
    }

    pub fn resolver(&self) -> &dyn ValueResolver {
        &*self.resolver
    }

    pub fn arithmetic(&self) -> &dyn Arithmetic {
        &*self.arithmetic
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    pub fn failure_mode(&self) -> FailureMode {
        self.failure_mode
    }

    pub fn is_suppressing_failures(&self) -> bool {
        self.failure_mode == FailureMode::Suppressing
    }

    pub fn max_eval_depth(&self) -> usize {
        self.max_eval_depth
    }

    /// A copy of this bundle with other namespaces.
    pub fn with_namespaces(&self, namespaces: Namespaces) -> Self {
        Self {
            namespaces,
            ..self.clone()
        }
    }

    /// A copy of this bundle with another failure mode.
    pub fn with_failure_mode(&self, failure_mode: FailureMode) -> Self {
        Self {
            failure_mode,
            ..self.clone()
        }
    }
}
