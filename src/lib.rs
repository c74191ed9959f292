//! Sable - an embeddable engine for a small JEXL-style expression language
//!
//! # Overview
//!
//! Sable compiles user-supplied text into immutable programs and evaluates
//! them against host-provided variables. Common use cases include:
//!
//! - Filters and routing rules
//! - Feature flags and conditional logic
//! - Small configurable calculations
//!
//! # Quick Start
//!
//! ```
//! use sable::{Engine, FailureMode, MapContext, Value};
//!
//! let engine = Engine::builder()
//!     .failure_mode(FailureMode::Strict)
//!     .build()
//!     .unwrap();
//!
//! let expr = engine.compile_expression("price * quantity").unwrap();
//! let mut ctx = MapContext::new().with("price", 3).with("quantity", 4);
//! assert_eq!(expr.evaluate(&mut ctx).unwrap(), Value::Int(12));
//! ```
//!
//! # Host Integration
//!
//! Host functions are grouped into namespaces and called as `ns:name(args)`:
//!
//! ```
//! use sable::{Engine, HostObject, MapContext, Namespaces, Value};
//!
//! #[derive(Debug)]
//! struct Text;
//!
//! impl HostObject for Text {
//!     fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, String>> {
//!         match (name, args) {
//!             ("shout", [Value::Str(s)]) => Some(Ok(Value::from(s.to_uppercase()))),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let mut namespaces = Namespaces::builder();
//! namespaces.register("text", Text);
//! let engine = Engine::builder()
//!     .namespaces(namespaces.build().unwrap())
//!     .build()
//!     .unwrap();
//!
//! let expr = engine.compile_expression("text:shout('hi')").unwrap();
//! assert_eq!(expr.evaluate(&mut MapContext::new()).unwrap().as_str(), Some("HI"));
//! ```

// Re-export public API from sable_core
pub use sable_core::api::{
    Configuration, Diagnostic, Engine, EngineBuilder, EngineOptions, Error, Expression,
    FailureMode, Namespaces, NamespacesBuilder, Script, Severity,
};

// Re-export commonly used evaluation types
pub use sable_core::evaluator::{
    Arithmetic, Context, EvalError, MapContext, StandardArithmetic,
};
pub use sable_core::introspection::{Introspector, ValueResolver};
pub use sable_core::source::{ScriptSource, SourceError};
pub use sable_core::values::{self, HostObject, Value};

mod error_renderer;
pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};
