//! Error types for the formula engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Tag identifying which stage of evaluation failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidExpression,
    UnknownFunction,
    UnbalancedParentheses,
    DivisionByZero,
    TooComplex,
    MalformedReference,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidExpression => "InvalidExpression",
            ErrorKind::UnknownFunction => "UnknownFunction",
            ErrorKind::UnbalancedParentheses => "UnbalancedParentheses",
            ErrorKind::DivisionByZero => "DivisionByZero",
            ErrorKind::TooComplex => "TooComplex",
            ErrorKind::MalformedReference => "MalformedReference",
        };
        f.write_str(name)
    }
}

/// Errors raised while evaluating a formula.
///
/// Messages never carry raw user text; only identifiers and references that
/// already matched the engine's own token patterns are echoed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Formula too complex (nesting deeper than {0})")]
    TooComplex(usize),

    #[error("Malformed reference: {0}")]
    MalformedReference(String),
}

impl FormulaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormulaError::InvalidExpression(_) => ErrorKind::InvalidExpression,
            FormulaError::UnknownFunction(_) => ErrorKind::UnknownFunction,
            FormulaError::UnbalancedParentheses => ErrorKind::UnbalancedParentheses,
            FormulaError::DivisionByZero => ErrorKind::DivisionByZero,
            FormulaError::TooComplex(_) => ErrorKind::TooComplex,
            FormulaError::MalformedReference(_) => ErrorKind::MalformedReference,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> FormulaError {
        FormulaError::InvalidExpression(message.into())
    }
}

pub type Result<T> = std::result::Result<T, FormulaError>;
