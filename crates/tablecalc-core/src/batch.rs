//! Batch evaluation of independent formulas against one table snapshot.
//!
//! The snapshot is immutable and the engine holds no mutable state, so
//! formulas are evaluated in parallel. Results keep input order. Formulas that
//! feed each other must be sequenced by the caller.

use rayon::prelude::*;
use tracing::debug;

use crate::table::Table;
use tablecalc_engine::{Engine, EvaluationResult, ValidationResult};

pub fn evaluate_all<S>(engine: &Engine, table: &Table, formulas: &[S]) -> Vec<EvaluationResult>
where
    S: AsRef<str> + Sync,
{
    let results: Vec<EvaluationResult> = formulas
        .par_iter()
        .map(|formula| engine.evaluate(formula.as_ref(), table.grid()))
        .collect();
    let failed = results.iter().filter(|r| !r.is_success()).count();
    debug!(total = results.len(), failed, "batch evaluation finished");
    results
}

pub fn validate_all<S>(engine: &Engine, formulas: &[S]) -> Vec<ValidationResult>
where
    S: AsRef<str> + Sync,
{
    formulas
        .par_iter()
        .map(|formula| engine.validate(formula.as_ref()))
        .collect()
}
