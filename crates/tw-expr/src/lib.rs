//! Embedded expression language and template expander for Talewright.
//!
//! Narrative text may contain `{expression}` fragments. The
//! [`TemplateExpander`] finds them, the [`Evaluator`] runs them against the
//! live [`tw_core::WorldState`], and the results are spliced back into the
//! text. The expression language is deliberately small: literals,
//! arithmetic, comparisons, logic, attribute and property reads and
//! writes, and an allowlist of functions and methods.

/// Expression syntax tree.
pub mod ast;
/// Syntax diagnostics rendered with ariadne.
pub mod diagnostics;
/// Evaluation errors.
pub mod error;
/// The expression evaluator.
pub mod eval;
/// Tokenizer for expression source.
pub mod lexer;
/// Parser from tokens to [`ast::Expr`].
pub mod parser;
/// Template expansion over narrative text.
pub mod template;

pub use error::{EvalError, EvalResult};
pub use eval::{Evaluator, compile, invalid_expression};
pub use template::{DEPTH_EXCEEDED_MARKER, ExpanderConfig, TemplateExpander};
