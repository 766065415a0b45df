//! Innermost-first function dispatch.
//!
//! Each pass scans the (already reference-free) formula, finds every call
//! that contains no other call, runs it, and splices its result back in as a
//! literal. `ROUND(AVERAGE(1,2,3),2)` therefore takes two passes:
//! `ROUND(2,2)` and then `2`. The number of passes equals the nesting depth,
//! and is capped by `max_nesting_depth`.

use tracing::trace;

use super::expr::evaluate_operand;
use super::format::{EMPTY_RANGE_LITERAL, value_literal};
use super::preprocess::call_name_before;
use super::Value;
use crate::builtins::{Call, FunctionRegistry};
use crate::config::EngineConfig;
use crate::error::{FormulaError, Result};

/// A function call located in formula text (byte offsets).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallSite {
    pub name: String,
    /// Start of the function name.
    pub start: usize,
    /// Position of the opening parenthesis.
    pub open: usize,
    /// Position of the closing parenthesis.
    pub close: usize,
}

struct Frame {
    call: Option<(usize, String)>,
    open: usize,
    contains_call: bool,
}

/// Locate every call that encloses no other call.
///
/// Fails on unbalanced parentheses or an unterminated string literal.
pub fn innermost_calls(script: &str) -> Result<Vec<CallSite>> {
    let bytes = script.as_bytes();
    let mut stack: Vec<Frame> = Vec::new();
    let mut found = Vec::new();
    let mut in_string = false;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 2;
                    continue;
                }
                in_string = false;
            }
            i += 1;
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'(' => {
                let call = call_name_before(script, i).map(|name| (i - name.len(), name.to_string()));
                stack.push(Frame {
                    call,
                    open: i,
                    contains_call: false,
                });
            }
            b')' => {
                let frame = stack.pop().ok_or(FormulaError::UnbalancedParentheses)?;
                let is_call = frame.call.is_some();
                if let Some((start, name)) = frame.call
                    && !frame.contains_call
                {
                    found.push(CallSite {
                        name,
                        start,
                        open: frame.open,
                        close: i,
                    });
                }
                if (is_call || frame.contains_call)
                    && let Some(parent) = stack.last_mut()
                {
                    parent.contains_call = true;
                }
            }
            _ => {}
        }
        i += 1;
    }

    if in_string {
        return Err(FormulaError::invalid("unterminated string literal"));
    }
    if !stack.is_empty() {
        return Err(FormulaError::UnbalancedParentheses);
    }
    Ok(found)
}

/// Split an argument list at top-level commas, respecting strings and
/// grouping parentheses. Blank slots are kept so positions stay stable; an
/// entirely blank list has no arguments.
pub fn split_args(args: &str) -> Vec<&str> {
    if args.trim().is_empty() {
        return Vec::new();
    }
    let bytes = args.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 2;
                    continue;
                }
                in_string = false;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&args[start..]);

    parts.into_iter().map(str::trim).collect()
}

/// An argument with no value: a blank slot or an empty range.
fn is_missing(arg: &str) -> bool {
    arg.is_empty() || arg == EMPTY_RANGE_LITERAL
}

/// Positional arguments read a missing value as zero.
fn positional_operand(arg: &str) -> Result<Value> {
    if is_missing(arg) {
        return Ok(Value::Number(0.0));
    }
    evaluate_operand(arg)
}

/// Run one call with already-literal arguments.
pub fn dispatch(
    name: &str,
    args: &[&str],
    registry: &FunctionRegistry,
    config: &EngineConfig,
) -> Result<Value> {
    let canonical = name.to_ascii_uppercase();
    let builtin = registry
        .get(&canonical)
        .ok_or_else(|| FormulaError::UnknownFunction(canonical.clone()))?;
    builtin.arity.check(&canonical, args.len())?;

    let value = match builtin.call {
        Call::Aggregate(f) => {
            let mut numbers = Vec::with_capacity(args.len());
            for arg in args.iter().filter(|arg| !is_missing(arg)) {
                if let Some(n) = evaluate_operand(arg)?.as_number() {
                    numbers.push(n);
                }
            }
            f(&numbers, config)?
        }
        Call::Scalar(f) => {
            let values = args
                .iter()
                .map(|arg| positional_operand(arg))
                .collect::<Result<Vec<_>>>()?;
            f(&values, config)?
        }
        Call::Lazy(f) => f(args, &positional_operand, config)?,
    };

    if let Value::Number(n) = value
        && !n.is_finite()
    {
        return Err(FormulaError::invalid(format!(
            "{} produced a non-finite number",
            canonical
        )));
    }
    Ok(value)
}

/// Resolve every function call, innermost first, until none remain.
pub fn reduce_calls(
    script: &str,
    registry: &FunctionRegistry,
    config: &EngineConfig,
) -> Result<String> {
    let mut current = script.to_string();

    for pass in 0..config.max_nesting_depth {
        let calls = innermost_calls(&current)?;
        if calls.is_empty() {
            return Ok(current);
        }
        trace!(pass, calls = calls.len(), "resolving innermost calls");

        // Right to left so earlier offsets stay valid.
        for call in calls.iter().rev() {
            let args = split_args(&current[call.open + 1..call.close]);
            let value = dispatch(&call.name, &args, registry, config)?;
            current.replace_range(call.start..=call.close, &value_literal(&value));
        }
    }

    if innermost_calls(&current)?.is_empty() {
        Ok(current)
    } else {
        Err(FormulaError::TooComplex(config.max_nesting_depth))
    }
}
