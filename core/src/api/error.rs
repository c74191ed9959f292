//! Public error types for the Sable API.
//!
//! This module defines the stable error types exposed to library users.
//! Internal errors are converted to these public types at API boundaries.

use core::fmt;

use crate::evaluator::EvalError;
use crate::parser::{ParseError, Span, TranslateError};
use crate::source::SourceError;
use crate::{String, Vec};

/// Public error type for all Sable operations.
///
/// Compilation errors (`Configuration` through `InternalTranslation`) are
/// always returned. `Evaluation` is only returned in the strict failure
/// mode, while `ResourceExceeded` is returned in every mode.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The engine could not be built from the given settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The text is malformed.
    #[error("Syntax error: {}", .0.to_diagnostic().message)]
    Syntax(ParseError),

    /// Well-formed text of the wrong kind, e.g. a fragment where a full
    /// script is required.
    #[error("Translated unit is not a full script (found {found})")]
    Structural { found: &'static str },

    /// The text could not be read from a file or URL.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// The translator failed unexpectedly. Indicates a defect, not bad input.
    #[error("Internal translation error: {0}")]
    InternalTranslation(String),

    /// A runtime failure, surfaced because the failure mode is strict.
    #[error("Runtime error: {error} at {}..{}", .span.0.start, .span.0.end)]
    Evaluation { error: EvalError, span: Span },

    /// Resource limits exceeded (e.g., stack overflow).
    #[error("Resource limit exceeded: {0}")]
    ResourceExceeded(String),
}

impl Error {
    /// Diagnostic for errors that point into source text.
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        match self {
            Error::Syntax(err) => Some(err.to_diagnostic()),
            Error::Evaluation { error, span } => Some(Diagnostic {
                severity: Severity::Error,
                message: error.to_string(),
                span: span.clone(),
                help: Vec::new(),
                code: Some(String::from("R001")),
            }),
            _ => None,
        }
    }

    /// Whether the error was raised while compiling rather than evaluating.
    pub fn is_compilation_error(&self) -> bool {
        !matches!(
            self,
            Error::Evaluation { .. } | Error::ResourceExceeded(_)
        )
    }
}

impl From<TranslateError> for Error {
    fn from(err: TranslateError) -> Self {
        match err {
            TranslateError::Syntax(parse_err) => Error::Syntax(parse_err),
            TranslateError::Internal(message) => Error::InternalTranslation(message),
        }
    }
}

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity level (error, warning, info).
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// Source location of the primary issue.
    pub span: Span,

    /// Help lines suggesting how to fix the issue.
    pub help: Vec<String>,

    /// Optional error code (e.g., "P001") for documentation lookup.
    pub code: Option<String>,
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - compilation cannot succeed.
    Error,
    /// Warning - suspicious code that might be wrong.
    Warning,
    /// Info - informational message.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseErrorKind;

    #[test]
    fn test_translate_error_conversion() {
        let syntax: Error = TranslateError::Syntax(ParseError::new(
            ParseErrorKind::EmptyProgram,
            String::new(),
            Span::new(0, 0),
        ))
        .into();
        assert!(matches!(syntax, Error::Syntax(_)));
        assert_eq!(syntax.to_string(), "Syntax error: Source contains no statement");

        let internal: Error = TranslateError::Internal(String::from("boom")).into();
        assert!(matches!(internal, Error::InternalTranslation(ref m) if m == "boom"));
    }

    #[test]
    fn test_evaluation_diagnostic() {
        let err = Error::Evaluation {
            error: EvalError::DivisionByZero,
            span: Span::new(2, 7),
        };
        assert_eq!(err.to_string(), "Runtime error: Division by zero at 2..7");
        let diagnostic = err.diagnostic().unwrap();
        assert_eq!(diagnostic.span, Span::new(2, 7));
        assert_eq!(diagnostic.code.as_deref(), Some("R001"));
        assert!(!err.is_compilation_error());
    }

    #[test]
    fn test_structural_display() {
        let err = Error::Structural { found: "ternary" };
        assert_eq!(
            err.to_string(),
            "Translated unit is not a full script (found ternary)"
        );
        assert!(err.is_compilation_error());
        assert!(err.diagnostic().is_none());
    }
}
