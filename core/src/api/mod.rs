//! Public API for the Sable expression language.
//!
//! An [`Engine`] compiles text into [`Expression`]s (a single value) and
//! [`Script`]s (a whole program). Both capture the engine's
//! [`Configuration`] at compile time and can then be evaluated any number
//! of times, from any thread, against caller-owned variable contexts.
//!
//! # Example
//!
//! ```
//! use sable_core::api::Engine;
//! use sable_core::evaluator::MapContext;
//!
//! let engine = Engine::new();
//! let expr = engine.compile_expression("name.toUpperCase() + '!'").unwrap();
//!
//! let mut ctx = MapContext::new().with("name", "sable");
//! assert_eq!(expr.evaluate(&mut ctx).unwrap().as_str(), Some("SABLE!"));
//! ```

mod configuration;
pub mod engine;
pub mod error;
mod expression;
mod namespaces;
pub mod options;
mod script;

pub use configuration::{Configuration, FailureMode};
pub use engine::{Engine, EngineBuilder};
pub use error::{Diagnostic, Error, Severity};
pub use expression::Expression;
pub use namespaces::{Namespaces, NamespacesBuilder};
pub use options::EngineOptions;
pub use script::Script;
