extern crate alloc;

// Re-export for convenience so other modules don't need alloc:: prefix
#[allow(unused_imports)]
pub(crate) use alloc::{boxed::Box, format, string::String, string::ToString, vec, vec::Vec};

pub mod api;
pub mod evaluator;
pub mod introspection;
pub mod parser;
pub mod source;
pub mod values;

pub use api::{
    Configuration, Engine, EngineBuilder, EngineOptions, Error, Expression, FailureMode,
    Namespaces, Script,
};
pub use values::{HostObject, Value};

static_assertions::assert_impl_all!(api::Engine: Send, Sync);
static_assertions::assert_impl_all!(api::Expression: Send, Sync, Clone);
static_assertions::assert_impl_all!(api::Script: Send, Sync, Clone);
static_assertions::assert_impl_all!(api::Configuration: Send, Sync);
static_assertions::assert_impl_all!(parser::Tree: Send, Sync);
static_assertions::assert_impl_all!(parser::PestTranslator: Send);
static_assertions::assert_not_impl_any!(parser::PestTranslator: Sync);
