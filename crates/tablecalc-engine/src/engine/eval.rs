//! Formula evaluation pipeline.
//!
//! strip `=` → validate → substitute references → reduce function calls
//! innermost-first → evaluate the remaining arithmetic → tagged result.
//!
//! An [`Engine`] holds only configuration and a function table; the grid is a
//! snapshot passed per call, so one engine can serve many threads at once.

use std::sync::OnceLock;
use tracing::{debug, trace};

use super::dispatch::reduce_calls;
use super::expr::evaluate_arithmetic;
use super::format::unquote;
use super::grid::Grid;
use super::preprocess::substitute_references;
use super::result::{EvaluationResult, ValidationResult, Value};
use super::validate::{check_formula, formula_body};
use crate::builtins::FunctionRegistry;
use crate::config::EngineConfig;
use crate::error::Result;

#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    registry: FunctionRegistry,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

impl Engine {
    /// Create an engine with the built-in functions registered.
    pub fn new(config: EngineConfig) -> Engine {
        Engine::with_registry(config, FunctionRegistry::with_builtins())
    }

    /// Create an engine with a custom function table.
    pub fn with_registry(config: EngineConfig, registry: FunctionRegistry) -> Engine {
        Engine { config, registry }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.registry
    }

    /// Evaluate `formula` against `grid`. Never panics and never fails: every
    /// problem comes back as a tagged error.
    pub fn evaluate(&self, formula: &str, grid: &Grid) -> EvaluationResult {
        let result = self.try_evaluate(formula, grid);
        if let Err(err) = &result {
            debug!(kind = %err.kind(), error = %err, "formula evaluation failed");
        }
        result.into()
    }

    /// Evaluate, surfacing the first failure as a [`FormulaError`](crate::FormulaError).
    pub fn try_evaluate(&self, formula: &str, grid: &Grid) -> Result<Value> {
        if let Some(first) = check_formula(formula, &self.registry).into_iter().next() {
            return Err(first);
        }

        let body = formula_body(formula);
        let substituted = substitute_references(body, grid, &self.config)?;
        trace!(substituted = %substituted, "references resolved");

        let reduced = reduce_calls(&substituted, &self.registry, &self.config)?;
        trace!(reduced = %reduced, "function calls resolved");

        let reduced = reduced.trim();
        if let Some(text) = unquote(reduced) {
            return Ok(Value::Text(text));
        }
        Ok(Value::Number(evaluate_arithmetic(reduced)? + 0.0))
    }

    /// Static syntax check; see [`check_formula`].
    pub fn validate(&self, formula: &str) -> ValidationResult {
        let errors = check_formula(formula, &self.registry)
            .iter()
            .map(ToString::to_string)
            .collect();
        ValidationResult::from_errors(errors)
    }
}

fn default_engine() -> &'static Engine {
    static ENGINE: OnceLock<Engine> = OnceLock::new();
    ENGINE.get_or_init(Engine::default)
}

/// Evaluate with the default configuration and built-ins.
pub fn evaluate(formula: &str, grid: &Grid) -> EvaluationResult {
    default_engine().evaluate(formula, grid)
}

/// Validate with the default built-ins.
pub fn validate(formula: &str) -> ValidationResult {
    default_engine().validate(formula)
}
