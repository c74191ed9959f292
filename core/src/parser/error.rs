use alloc::string::ToString;

use crate::api::{Diagnostic, Severity};
use crate::parser::{Rule, Span};
use crate::{String, Vec, format, vec};

/// Failure reported by a [`Translate`](crate::parser::Translate) implementation.
#[derive(Debug)]
pub enum TranslateError {
    /// The text is lexically or structurally malformed.
    Syntax(ParseError),
    /// The translator reached a state it cannot handle (a defect, not bad input).
    Internal(String),
}

impl From<ParseError> for TranslateError {
    fn from(err: ParseError) -> Self {
        TranslateError::Syntax(err)
    }
}

/// Parser error with context
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub source: String,
    pub span: Span,
}

/// Specific kinds of parse errors
#[derive(Debug, Clone)]
pub enum ParseErrorKind {
    /// Unexpected token
    UnexpectedToken { expected: String, found: String },
    /// Invalid number literal
    InvalidNumber { text: String },
    /// Maximum nesting depth exceeded
    MaxDepthExceeded { depth: usize, max_depth: usize },
    /// Translation produced no statement at all
    EmptyProgram,
    /// Other parse errors (catch-all for Pest errors we don't specifically handle)
    Other { message: String },
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, source: String, span: Span) -> Self {
        Self { kind, source, span }
    }

    /// Convert to a Diagnostic for API boundary
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (message, code, help) = match &self.kind {
            ParseErrorKind::UnexpectedToken { expected, found } => (
                format!("Expected {}, found {}", expected, found),
                "P001",
                vec![],
            ),
            ParseErrorKind::InvalidNumber { text } => (
                format!("Invalid number literal '{}'", text),
                "P002",
                vec!["Check the number format".to_string()],
            ),
            ParseErrorKind::MaxDepthExceeded { max_depth, .. } => (
                format!(
                    "Expression nesting depth exceeds maximum of {} levels",
                    max_depth
                ),
                "P003",
                vec!["Reduce nesting or simplify the expression".to_string()],
            ),
            ParseErrorKind::EmptyProgram => (
                "Source contains no statement".to_string(),
                "P004",
                vec![],
            ),
            ParseErrorKind::Other { message } => (message.clone(), "P999", vec![]),
        };

        Diagnostic {
            severity: Severity::Error,
            message,
            span: self.span.clone(),
            help,
            code: Some(code.to_string()),
        }
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let diagnostic = self.to_diagnostic();
        write!(f, "{}: {}", diagnostic.severity, diagnostic.message)?;

        if let Some(ref code) = diagnostic.code {
            write!(f, " [{}]", code)?;
        }

        for help_msg in &diagnostic.help {
            write!(f, "\nhelp: {}", help_msg)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Convert Pest error to human-readable ParseError
pub fn convert_pest_error(err: pest::error::Error<Rule>, source: &str) -> ParseError {
    use pest::error::ErrorVariant;

    let span = match err.location {
        pest::error::InputLocation::Pos(pos) => Span(pos..pos),
        pest::error::InputLocation::Span((start, end)) => Span(start..end),
    };

    let kind = match err.variant {
        ErrorVariant::ParsingError {
            positives,
            negatives,
        } => {
            let expected = format_expected_rules(&positives);
            let found = format_found_rules(&negatives, source, &span);
            ParseErrorKind::UnexpectedToken { expected, found }
        }
        ErrorVariant::CustomError { message } => {
            match message.as_str() {
                "invalid integer literal" | "invalid float literal" => {
                    ParseErrorKind::InvalidNumber {
                        text: span.str_of(source).to_string(),
                    }
                }
                _ => ParseErrorKind::Other { message },
            }
        }
    };

    ParseError::new(kind, source.to_string(), span)
}

/// Format expected rules in a human-readable way
fn format_expected_rules(rules: &[Rule]) -> String {
    let mut concepts: Vec<&str> = Vec::new();

    for rule in rules {
        let concept = match rule {
            Rule::integer | Rule::float | Rule::boolean | Rule::string | Rule::null => "literal",
            Rule::ident | Rule::member => "identifier",
            Rule::EOI => "end of input",
            Rule::empty | Rule::expr_stmt | Rule::assignment => "`;`",
            Rule::block => "block",
            Rule::or
            | Rule::and
            | Rule::eq
            | Rule::ne
            | Rule::lt
            | Rule::le
            | Rule::gt
            | Rule::ge
            | Rule::add
            | Rule::sub
            | Rule::mul
            | Rule::div
            | Rule::modulo => "operator",
            _ => "expression",
        };
        if !concepts.contains(&concept) {
            concepts.push(concept);
        }
    }

    match concepts.len() {
        0 => "something else".to_string(),
        1 => concepts[0].to_string(),
        _ => {
            let last = concepts.pop().unwrap_or("expression");
            format!("{} or {}", concepts.join(", "), last)
        }
    }
}

/// Format found rules in a human-readable way
fn format_found_rules(rules: &[Rule], source: &str, span: &Span) -> String {
    if let Some(rule) = rules.first() {
        return match rule {
            Rule::ident => "identifier".to_string(),
            Rule::integer => "integer".to_string(),
            Rule::float => "floating-point number".to_string(),
            Rule::boolean => "boolean".to_string(),
            Rule::string => "string".to_string(),
            Rule::EOI => "end of input".to_string(),
            other => format!("{:?}", other),
        };
    }

    // Pest leaves `negatives` empty most of the time; show the offending character.
    match source[span.0.start..].chars().next() {
        Some(c) => format!("'{}'", c),
        None => "end of input".to_string(),
    }
}
