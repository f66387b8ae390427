use ariadne::{Color, Label, Report, ReportKind, Source};
use std::fmt;

use crate::lexer;
use crate::parser;

/// A syntax diagnostic with source location.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Byte range of the offending input.
    pub span: std::ops::Range<usize>,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic for `span`.
    pub fn error(span: std::ops::Range<usize>, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

/// Lex and parse `source`, collecting every syntax problem with its span.
pub fn check_syntax(source: &str) -> Vec<Diagnostic> {
    let (tokens, lex_errors) = lexer::lex(source);
    let mut diagnostics: Vec<Diagnostic> = lex_errors
        .into_iter()
        .map(|e| Diagnostic::error(e.span, e.message))
        .collect();

    if diagnostics.is_empty()
        && let Err(parse_errors) = parser::parse(&tokens)
    {
        diagnostics.extend(
            parse_errors
                .into_iter()
                .map(|e| Diagnostic::error(e.span, e.message)),
        );
    }
    diagnostics
}

/// Render diagnostics using ariadne for pretty terminal output.
pub fn render_diagnostics(source: &str, filename: &str, diagnostics: &[Diagnostic]) -> String {
    let mut output = Vec::new();

    for diag in diagnostics {
        let span = (filename, diag.span.clone());
        Report::build(ReportKind::Error, span.clone())
            .with_message(&diag.message)
            .with_label(
                Label::new(span)
                    .with_message(&diag.message)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut output)
            .ok();
    }

    String::from_utf8(output).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_expression_has_no_diagnostics() {
        assert!(check_syntax("lamp.lit and score > 3").is_empty());
    }

    #[test]
    fn lex_errors_carry_spans() {
        let diags = check_syntax("1 ; 2");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].span, 2..3);
        assert_eq!(diags[0].to_string(), "error: unexpected character: \";\"");
    }

    #[test]
    fn parse_errors_are_reported() {
        assert!(!check_syntax("(1 + ").is_empty());
    }

    #[test]
    fn render_produces_output() {
        let source = "1 + ;";
        let diags = check_syntax(source);
        let output = render_diagnostics(source, "<expr>", &diags);
        assert!(output.contains("unexpected character"));
    }

    #[test]
    fn deep_nesting_is_reported_not_parsed() {
        let source = "(".repeat(50_000);
        let diags = check_syntax(&source);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("nested deeper"));
    }
}
