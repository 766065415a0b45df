//! tablecalc-core - Table snapshots, CSV import and batch evaluation.

pub mod batch;
pub mod error;
pub mod storage;
pub mod table;

pub use batch::{evaluate_all, validate_all};
pub use error::{CoreError, Result};
pub use table::Table;

pub use tablecalc_engine::{Engine, EvaluationResult, Grid, ValidationResult};
