//! Error types for expression evaluation.

use thiserror::Error;

/// Result type for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors raised while lexing, parsing, or evaluating an expression.
///
/// These never escape template expansion: the evaluator turns them into
/// an `Invalid expression '…'` diagnostic value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The expression text could not be lexed or parsed.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// A name is neither a root attribute nor an entity.
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    /// A field does not exist on the value it was read from.
    #[error("{type_name} has no field `{field}`")]
    UnknownField {
        /// Type of the value being accessed.
        type_name: &'static str,
        /// The missing field.
        field: String,
    },

    /// An operator or function received values of the wrong type.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Integer or float division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Arithmetic overflowed or produced a non-finite float.
    #[error("arithmetic overflow")]
    Overflow,

    /// The function or method is not on the allowlist.
    #[error("call not allowed: {0}")]
    DisallowedCall(String),

    /// A function or method received the wrong number of arguments.
    #[error("{name} expects {expected} argument(s), got {found}")]
    WrongArity {
        /// Function or method name.
        name: String,
        /// Human-readable expected count.
        expected: &'static str,
        /// Number of arguments supplied.
        found: usize,
    },

    /// An index is outside the list or text bounds.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The requested index.
        index: i64,
        /// Length of the indexed value.
        len: usize,
    },

    /// No entity has the given name.
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// A produced text value would exceed the evaluator's character limit.
    #[error("result longer than {0} characters")]
    TooLarge(usize),

    /// A list built by `+` would exceed the evaluator's element limit.
    #[error("list longer than {0} elements")]
    ListTooLong(usize),
}
