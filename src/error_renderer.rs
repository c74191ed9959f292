//! Error rendering using ariadne
//!
//! This module renders Sable errors with source snippets and annotations.
//! Syntax errors carry their own source text; for evaluation errors the
//! caller passes the text the program was compiled from (see
//! [`Expression::source`](crate::Expression::source) and
//! [`Script::text`](crate::Script::text)).

use crate::{Diagnostic, Error, Severity};
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;

/// Render an error to stderr
///
/// # Example
/// ```no_run
/// use sable::{Engine, render_error};
///
/// let engine = Engine::new();
/// let source = "1 + * 2";
/// if let Err(e) = engine.compile_expression(source) {
///     render_error(&e, source);
/// }
/// ```
pub fn render_error(error: &Error, source: &str) {
    render_error_to_writer(error, source, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
pub fn render_error_to(error: &Error, source: &str, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_to_writer(error, source, writer, true)
}

/// Render an error to a String (useful for logs, web UIs, etc.)
pub fn render_error_to_string(error: &Error, source: &str) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, source, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
pub fn render_error_to_string_no_color(error: &Error, source: &str) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, source, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_error_to_writer(
    error: &Error,
    source: &str,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    match (error, error.diagnostic()) {
        // Spans of a syntax error refer to the normalized text it carries.
        (Error::Syntax(parse), Some(diagnostic)) => {
            render_diagnostic(&parse.source, &diagnostic, writer, use_color)
        }
        (_, Some(diagnostic)) => render_diagnostic(source, &diagnostic, writer, use_color),
        (other, None) => writeln!(writer, "{}", other),
    }
}

fn render_diagnostic(
    source: &str,
    diag: &Diagnostic,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    let mut colors = ColorGenerator::new();
    colors.next(); // Skip the first color.

    let kind = match diag.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Info => ReportKind::Advice,
    };

    // Clamp so a span from another text cannot point past the end.
    let end = diag.span.0.end.min(source.len());
    let span = diag.span.0.start.min(end)..end;

    let mut report = Report::build(kind, ("<input>", span.clone()))
        .with_message(&diag.message)
        .with_config(ariadne::Config::default().with_color(use_color));

    if let Some(code) = &diag.code {
        report = report.with_code(code);
    }

    report = report.with_label(
        Label::new(("<input>", span))
            .with_message(&diag.message)
            .with_color(colors.next()),
    );

    for help_msg in &diag.help {
        report = report.with_help(help_msg);
    }

    report
        .finish()
        .write(("<input>", Source::from(source)), &mut *writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Engine, FailureMode, MapContext, SourceError};

    #[test]
    fn test_render_parse_error() {
        let engine = Engine::new();
        let source = "1 + + * 2";
        let err = engine.compile_expression(source).unwrap_err();

        let output = render_error_to_string_no_color(&err, source);
        assert!(output.contains("Error") || output.contains("error"));
        assert!(output.contains("1 + + * 2"));
    }

    #[test]
    fn test_render_runtime_error() {
        let engine = Engine::builder()
            .failure_mode(FailureMode::Strict)
            .build()
            .unwrap();
        let expr = engine.compile_expression("10 / (5 - 5)").unwrap();
        let err = expr.evaluate(&mut MapContext::new()).unwrap_err();

        let output = render_error_to_string_no_color(&err, expr.source());
        assert!(output.contains("R001"));
        assert!(output.contains("Division by zero") || output.contains("division by zero"));
        assert!(output.lines().count() > 1);
    }

    #[test]
    fn test_render_error_without_location() {
        let err = Error::SourceUnavailable(SourceError::Missing);
        let output = render_error_to_string_no_color(&err, "");
        assert_eq!(output.trim_end(), err.to_string());
    }
}
