//! Error types for tablecalc core.

use thiserror::Error;

/// Errors raised while loading table data.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("CSV file is empty")]
    EmptyCsv,
}

pub type Result<T> = std::result::Result<T, CoreError>;
