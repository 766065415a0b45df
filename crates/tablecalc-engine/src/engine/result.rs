//! Values produced by formulas and the tagged results handed back to callers.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::format::format_value;
use crate::error::{ErrorKind, FormulaError};

/// A formula value: what a function returns or a formula evaluates to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => super::grid::parse_numeric_text(s),
        }
    }

    /// Truthiness for IF: nonzero numbers are true; text is true when it
    /// coerces to a nonzero number.
    pub fn is_truthy(&self) -> bool {
        self.as_number().is_some_and(|n| n != 0.0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_value(self))
    }
}

/// Outcome of evaluating one formula against one grid snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EvaluationResult {
    Success { value: Value },
    Error { kind: ErrorKind, message: String },
}

impl EvaluationResult {
    pub fn success(value: Value) -> EvaluationResult {
        EvaluationResult::Success { value }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EvaluationResult::Success { .. })
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            EvaluationResult::Success { value } => Some(value),
            EvaluationResult::Error { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            EvaluationResult::Success { .. } => None,
            EvaluationResult::Error { kind, .. } => Some(*kind),
        }
    }

    /// Renderable string for every path: the value, or `#ERROR: <reason>`.
    pub fn display(&self) -> String {
        match self {
            EvaluationResult::Success { value } => format_value(value),
            EvaluationResult::Error { message, .. } => message.clone(),
        }
    }
}

impl From<FormulaError> for EvaluationResult {
    fn from(err: FormulaError) -> Self {
        EvaluationResult::Error {
            kind: err.kind(),
            message: format!("#ERROR: {}", err),
        }
    }
}

impl From<std::result::Result<Value, FormulaError>> for EvaluationResult {
    fn from(result: std::result::Result<Value, FormulaError>) -> Self {
        match result {
            Ok(value) => EvaluationResult::success(value),
            Err(err) => err.into(),
        }
    }
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Outcome of a static syntax check.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<String>) -> ValidationResult {
        ValidationResult {
            valid: errors.is_empty(),
            errors,
        }
    }
}
