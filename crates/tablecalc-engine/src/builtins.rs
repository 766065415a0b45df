//! Built-in spreadsheet functions and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing built-in names are ALL CAPS (e.g. `SUM`, `AVERAGE`);
//!   lookups canonicalize to upper case, so `sum(...)` works too.
//! - Every built-in declares its arity and how it wants its arguments
//!   delivered (see [`Call`]). The dispatcher enforces arity before calling.
//! - To add a function, append it to [`BUILTINS`] or call
//!   [`FunctionRegistry::register`] on an engine's registry.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::config::{EmptyExtremum, EmptyProduct, EngineConfig};
use crate::engine::Value;
use crate::engine::format::{format_number, unquote};
use crate::engine::grid::parse_numeric_text;
use crate::error::{FormulaError, Result};

/// Evaluates one raw argument; handed to [`Call::Lazy`] implementations.
pub type ArgEvaluator<'a> = &'a dyn Fn(&str) -> Result<Value>;

/// How a built-in receives its arguments.
#[derive(Clone, Copy)]
pub enum Call {
    /// Numeric-coercible values of every argument after range expansion.
    /// Text that does not coerce is skipped, never zero-filled.
    Aggregate(fn(&[f64], &EngineConfig) -> Result<Value>),
    /// Every argument evaluated to a value.
    Scalar(fn(&[Value], &EngineConfig) -> Result<Value>),
    /// Raw argument text plus an evaluator; the function decides what to evaluate.
    Lazy(fn(&[&str], ArgEvaluator<'_>, &EngineConfig) -> Result<Value>),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const fn any() -> Arity {
        Arity { min: 0, max: None }
    }

    pub const fn exactly(n: usize) -> Arity {
        Arity {
            min: n,
            max: Some(n),
        }
    }

    pub const fn between(min: usize, max: usize) -> Arity {
        Arity {
            min,
            max: Some(max),
        }
    }

    pub fn check(&self, name: &str, count: usize) -> Result<()> {
        let ok = count >= self.min && self.max.is_none_or(|max| count <= max);
        if ok {
            return Ok(());
        }
        let expected = match self.max {
            Some(max) if max == self.min => format!("{}", max),
            Some(max) => format!("{} to {}", self.min, max),
            None => format!("at least {}", self.min),
        };
        Err(FormulaError::invalid(format!(
            "{} expects {} argument(s), got {}",
            name, expected, count
        )))
    }
}

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub call: Call,
    pub description: &'static str,
}

pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "SUM",
        arity: Arity::any(),
        call: Call::Aggregate(sum),
        description: "Sum of numeric values",
    },
    Builtin {
        name: "AVERAGE",
        arity: Arity::any(),
        call: Call::Aggregate(average),
        description: "Mean of numeric values (0 when there are none)",
    },
    Builtin {
        name: "MIN",
        arity: Arity::any(),
        call: Call::Aggregate(min),
        description: "Smallest numeric value",
    },
    Builtin {
        name: "MAX",
        arity: Arity::any(),
        call: Call::Aggregate(max),
        description: "Largest numeric value",
    },
    Builtin {
        name: "COUNT",
        arity: Arity::any(),
        call: Call::Aggregate(count),
        description: "Count of numeric values",
    },
    Builtin {
        name: "MEDIAN",
        arity: Arity::any(),
        call: Call::Aggregate(median),
        description: "Middle numeric value (mean of the two middles for even counts)",
    },
    Builtin {
        name: "PRODUCT",
        arity: Arity::any(),
        call: Call::Aggregate(product),
        description: "Product of numeric values",
    },
    Builtin {
        name: "ROUND",
        arity: Arity::between(1, 2),
        call: Call::Scalar(round),
        description: "Round half away from zero to N decimal places",
    },
    Builtin {
        name: "ABS",
        arity: Arity::exactly(1),
        call: Call::Scalar(abs),
        description: "Absolute value",
    },
    Builtin {
        name: "POWER",
        arity: Arity::exactly(2),
        call: Call::Scalar(power),
        description: "Base raised to an exponent",
    },
    Builtin {
        name: "SQRT",
        arity: Arity::exactly(1),
        call: Call::Scalar(sqrt),
        description: "Square root (0 for negative input)",
    },
    Builtin {
        name: "IF",
        arity: Arity::between(2, 3),
        call: Call::Lazy(if_fn),
        description: "Choose a value by condition; nonzero is true",
    },
    Builtin {
        name: "CONCAT",
        arity: Arity::any(),
        call: Call::Lazy(concat),
        description: "Join arguments as text",
    },
];

/// Name-keyed lookup table of callable functions.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Builtin>,
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> FunctionRegistry {
        FunctionRegistry::default()
    }

    /// A registry holding every entry of [`BUILTINS`].
    pub fn with_builtins() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        for builtin in BUILTINS {
            registry.register(*builtin);
        }
        registry
    }

    /// Add or replace a function.
    pub fn register(&mut self, builtin: Builtin) {
        self.functions
            .insert(builtin.name.to_ascii_uppercase(), builtin);
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.functions.get(&name.to_ascii_uppercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &Builtin> {
        let mut builtins: Vec<&Builtin> = self.functions.values().collect();
        builtins.sort_by_key(|b| b.name);
        builtins.into_iter()
    }
}

/// Shared registry of the built-ins, built once.
pub fn default_registry() -> &'static FunctionRegistry {
    static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();
    REGISTRY.get_or_init(FunctionRegistry::with_builtins)
}

fn sum(values: &[f64], _: &EngineConfig) -> Result<Value> {
    Ok(Value::Number(values.iter().sum()))
}

fn average(values: &[f64], _: &EngineConfig) -> Result<Value> {
    if values.is_empty() {
        return Ok(Value::Number(0.0));
    }
    Ok(Value::Number(values.iter().sum::<f64>() / values.len() as f64))
}

fn extremum(
    values: &[f64],
    config: &EngineConfig,
    name: &str,
    pick: fn(f64, f64) -> f64,
) -> Result<Value> {
    match values.split_first() {
        Some((first, rest)) => Ok(Value::Number(rest.iter().copied().fold(*first, pick))),
        None => match config.empty_min_max {
            EmptyExtremum::Zero => Ok(Value::Number(0.0)),
            EmptyExtremum::Error => Err(FormulaError::invalid(format!(
                "{} of an empty set is undefined",
                name
            ))),
        },
    }
}

fn min(values: &[f64], config: &EngineConfig) -> Result<Value> {
    extremum(values, config, "MIN", f64::min)
}

fn max(values: &[f64], config: &EngineConfig) -> Result<Value> {
    extremum(values, config, "MAX", f64::max)
}

fn count(values: &[f64], _: &EngineConfig) -> Result<Value> {
    Ok(Value::Number(values.len() as f64))
}

fn median(values: &[f64], _: &EngineConfig) -> Result<Value> {
    if values.is_empty() {
        return Ok(Value::Number(0.0));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let value = if sorted.len().is_multiple_of(2) {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    Ok(Value::Number(value))
}

fn product(values: &[f64], config: &EngineConfig) -> Result<Value> {
    if values.is_empty() {
        let empty = match config.empty_product {
            EmptyProduct::Zero => 0.0,
            EmptyProduct::One => 1.0,
        };
        return Ok(Value::Number(empty));
    }
    Ok(Value::Number(values.iter().product()))
}

fn number_arg(args: &[Value], index: usize, name: &str) -> Result<f64> {
    args.get(index)
        .and_then(Value::as_number)
        .ok_or_else(|| FormulaError::invalid(format!("{} expects a numeric argument", name)))
}

/// Decimal digits ROUND accepts; larger requests are clamped.
const MAX_ROUND_DIGITS: i32 = 15;

/// Round half away from zero to `digits` places (negative digits round to
/// tens, hundreds, ...).
///
/// The scaled value is first snapped to 15 significant digits so binary
/// representation error (`2.675 * 100 == 267.49999999999997`) does not decide
/// the tie, which also makes rounding idempotent. Snapping only applies while
/// at least one fractional digit survives it.
pub fn round_half_away(x: f64, digits: i32) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let digits = digits.clamp(-MAX_ROUND_DIGITS, MAX_ROUND_DIGITS);
    let factor = 10f64.powi(digits.abs());
    let scaled = if digits >= 0 { x * factor } else { x / factor };
    if !scaled.is_finite() {
        return x;
    }
    let snapped = if scaled.abs() < 1e14 {
        format!("{:.14e}", scaled).parse::<f64>().unwrap_or(scaled)
    } else {
        scaled
    };
    let rounded = snapped.round();
    if digits >= 0 {
        rounded / factor
    } else {
        rounded * factor
    }
}

fn round(args: &[Value], _: &EngineConfig) -> Result<Value> {
    let x = number_arg(args, 0, "ROUND")?;
    let digits = if args.len() > 1 {
        number_arg(args, 1, "ROUND")?.trunc()
    } else {
        0.0
    };
    let digits = digits.clamp(-(MAX_ROUND_DIGITS as f64), MAX_ROUND_DIGITS as f64) as i32;
    Ok(Value::Number(round_half_away(x, digits)))
}

fn abs(args: &[Value], _: &EngineConfig) -> Result<Value> {
    Ok(Value::Number(number_arg(args, 0, "ABS")?.abs()))
}

fn power(args: &[Value], _: &EngineConfig) -> Result<Value> {
    let base = number_arg(args, 0, "POWER")?;
    let exponent = number_arg(args, 1, "POWER")?;
    Ok(Value::Number(base.powf(exponent)))
}

fn sqrt(args: &[Value], _: &EngineConfig) -> Result<Value> {
    let x = number_arg(args, 0, "SQRT")?;
    Ok(Value::Number(if x < 0.0 { 0.0 } else { x.sqrt() }))
}

fn if_fn(args: &[&str], eval: ArgEvaluator<'_>, _: &EngineConfig) -> Result<Value> {
    let condition = eval(args[0])?;
    if condition.is_truthy() {
        eval(args[1])
    } else if let Some(&otherwise) = args.get(2) {
        eval(otherwise)
    } else {
        Ok(Value::Number(0.0))
    }
}

fn concat(args: &[&str], _: ArgEvaluator<'_>, _: &EngineConfig) -> Result<Value> {
    let mut out = String::new();
    for raw in args {
        let raw = raw.trim();
        if let Some(text) = unquote(raw) {
            out.push_str(&text);
            continue;
        }
        // Spliced-in numbers such as `(-3)` read back in display form.
        let bare = raw
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .unwrap_or(raw);
        if bare.trim().is_empty() {
            continue;
        }
        match parse_numeric_text(bare) {
            Some(n) => out.push_str(&format_number(n)),
            None => out.push_str(raw),
        }
    }
    Ok(Value::Text(out))
}
