//! Reference substitution.
//!
//! Before any function runs, every cell and range reference outside string
//! literals is rewritten into literal values taken from the grid snapshot:
//!
//! - **Cells**: `A1` → `10`, `(-3)` or `"text"`; empty or missing cells → `0`
//! - **Ranges**: `A1:B2` → `10,20,30` (numeric-coercible cells only, row-major);
//!   a range with no numeric cells becomes `()` so argument positions hold
//! - **CONCAT arguments** are text context: cells become quoted text, missing
//!   cells become `""`, and range tokens are left verbatim
//!
//! Tokens immediately followed by `(` are function names, not references.

use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::debug;

use super::cell_ref::parse_cell_token;
use super::format::{EMPTY_RANGE_LITERAL, format_number, number_literal, text_literal};
use super::grid::{CellValue, Grid};
use super::range::{RangeRef, numeric_values};
use crate::config::EngineConfig;
use crate::error::{FormulaError, Result};

/// Function whose direct arguments are read in text context.
const TEXT_CONTEXT_FUNCTION: &str = "CONCAT";

/// Regex that matches reference tokens.
///
/// Captures:
/// - `range`: `A1:B5`, `A:C` or `2:4`
/// - `cell`: `A1`
pub fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?<range>\b[A-Za-z]+[0-9]+\s*:\s*[A-Za-z]+[0-9]+\b|\b[A-Za-z]+:[A-Za-z]+\b|\b[0-9]+:[0-9]+\b)|(?<cell>\b[A-Za-z]+[0-9]+\b)",
        )
        .expect("reference regex must compile")
    })
}

#[derive(Clone, Copy, Default)]
struct ByteContext {
    in_string: bool,
    text_context: bool,
}

/// Classify every byte of `script`: inside a string literal, and whether the
/// innermost enclosing function call reads its arguments as text.
fn classify(script: &str) -> Vec<ByteContext> {
    let bytes = script.as_bytes();
    let mut contexts = vec![ByteContext::default(); bytes.len()];
    // One entry per open parenthesis: does this level read text?
    let mut stack: Vec<bool> = Vec::new();
    let mut in_string = false;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        let text_context = stack.last().copied().unwrap_or(false);
        if in_string {
            contexts[i] = ByteContext {
                in_string: true,
                text_context,
            };
            if b == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    contexts[i + 1] = contexts[i];
                    i += 2;
                    continue;
                }
                in_string = false;
            }
            i += 1;
            continue;
        }

        contexts[i] = ByteContext {
            in_string: false,
            text_context,
        };
        match b {
            b'"' => {
                in_string = true;
                contexts[i].in_string = true;
            }
            b'(' => {
                let level = match call_name_before(script, i) {
                    Some(name) => name.eq_ignore_ascii_case(TEXT_CONTEXT_FUNCTION),
                    // Grouping parentheses inherit the enclosing context.
                    None => text_context,
                };
                stack.push(level);
            }
            b')' => {
                stack.pop();
            }
            _ => {}
        }
        i += 1;
    }

    contexts
}

/// Identifier immediately preceding the `(` at byte `open`, if it names a call.
pub(crate) fn call_name_before(script: &str, open: usize) -> Option<&str> {
    let head = &script.as_bytes()[..open];
    let start = head
        .iter()
        .rposition(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))
        .map_or(0, |p| p + 1);
    let name = &script[start..open];
    let first = name.bytes().next()?;
    if first.is_ascii_alphabetic() || first == b'_' {
        Some(name)
    } else {
        None
    }
}

/// Replace every reference outside string literals with literal values.
pub fn substitute_references(script: &str, grid: &Grid, config: &EngineConfig) -> Result<String> {
    let contexts = classify(script);
    let mut failure: Option<FormulaError> = None;

    let substituted = reference_re()
        .replace_all(script, |caps: &Captures| {
            let whole = caps.get(0).map_or_else(|| (0, 0), |m| (m.start(), m.end()));
            let token = &caps[0];
            let ctx = contexts.get(whole.0).copied().unwrap_or_default();

            if ctx.in_string || script[whole.1..].starts_with('(') || failure.is_some() {
                return token.to_string();
            }

            let replaced = if caps.name("range").is_some() {
                substitute_range(token, grid, config, ctx.text_context)
            } else {
                substitute_cell(token, grid, config, ctx.text_context)
            };
            match replaced {
                Ok(literal) => literal,
                Err(err) => {
                    failure = Some(err);
                    token.to_string()
                }
            }
        })
        .to_string();

    match failure {
        Some(err) => Err(err),
        None => Ok(substituted),
    }
}

fn substitute_range(
    token: &str,
    grid: &Grid,
    config: &EngineConfig,
    text_context: bool,
) -> Result<String> {
    if text_context {
        return Ok(token.to_string());
    }
    let Some(range) = RangeRef::parse(token) else {
        return degrade(token, config, EMPTY_RANGE_LITERAL);
    };
    if config.strict_references && range.cells(grid).is_empty() {
        return degrade(token, config, EMPTY_RANGE_LITERAL);
    }
    let values = numeric_values(grid, &range);
    if values.is_empty() {
        return Ok(EMPTY_RANGE_LITERAL.to_string());
    }
    Ok(values
        .into_iter()
        .map(number_literal)
        .collect::<Vec<_>>()
        .join(","))
}

fn substitute_cell(
    token: &str,
    grid: &Grid,
    config: &EngineConfig,
    text_context: bool,
) -> Result<String> {
    let missing = if text_context { "\"\"" } else { "0" };
    let Some(cell) = parse_cell_token(token) else {
        return degrade(token, config, missing);
    };
    let Some(value) = grid.get(&cell) else {
        return degrade(token, config, missing);
    };

    if text_context {
        return Ok(match value {
            CellValue::Number(n) => text_literal(&format_number(*n)),
            CellValue::Text(s) => text_literal(s),
        });
    }
    if let Some(n) = value.as_number() {
        return Ok(number_literal(n));
    }
    Ok(match value {
        _ if value.is_blank() => "0".to_string(),
        CellValue::Text(s) => text_literal(s),
        CellValue::Number(_) => "0".to_string(),
    })
}

/// Malformed or out-of-bounds references resolve to a neutral literal unless
/// the engine runs with strict references.
fn degrade(token: &str, config: &EngineConfig, fallback: &str) -> Result<String> {
    if config.strict_references {
        return Err(FormulaError::MalformedReference(token.to_ascii_uppercase()));
    }
    debug!(reference = token, fallback, "unresolvable reference degraded");
    Ok(fallback.to_string())
}
