//! Formula engine API.
//!
//! This module provides the evaluation pipeline and its building blocks:
//!
//! - [`CellValue`], [`Grid`] - Immutable grid snapshot supplied per call
//! - [`CellRef`], [`RangeRef`] - A1 references and rectangular ranges
//! - [`resolve_range`], [`numeric_values`] - Pull values out of the grid
//! - [`substitute_references`] - Rewrite references into literal values
//! - [`reduce_calls`] - Innermost-first function dispatch
//! - [`expr`] - Whitelisted recursive-descent arithmetic
//! - [`check_formula`] - Static validation
//! - [`Engine`], [`evaluate`], [`validate`] - The public entry points

mod cell_ref;
mod dispatch;
mod eval;
pub mod expr;
pub mod format;
pub(crate) mod grid;
mod preprocess;
mod range;
mod result;
mod validate;

pub use cell_ref::{CellRef, letters_to_col, parse_cell_token};
pub use dispatch::{CallSite, dispatch, innermost_calls, reduce_calls, split_args};
pub use eval::{Engine, evaluate, validate};
pub use format::{format_number, format_value};
pub use grid::{CellValue, Grid};
pub use preprocess::substitute_references;
pub use range::{RangeRef, numeric_values, resolve_range};
pub use result::{EvaluationResult, ValidationResult, Value};
pub use validate::{check_formula, formula_body};
