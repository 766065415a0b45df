//! Value formatting: display strings for callers and literal spellings for
//! the rewrite pipeline.

use super::Value;

/// Decimal places kept when rendering non-integral numbers for display.
const DISPLAY_DECIMALS: usize = 10;

/// Spliced in for a range with no numeric cells. It keeps its argument slot so
/// later arguments do not shift; aggregates skip it and scalars read it as 0.
pub const EMPTY_RANGE_LITERAL: &str = "()";

/// Format a value for display.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        Value::Text(s) => s.clone(),
    }
}

/// Format a number for display.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "#NAN!".to_string()
    } else if n.is_infinite() {
        "#INF!".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n + 0.0)
    } else {
        let fixed = format!("{:.*}", DISPLAY_DECIMALS, n);
        let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
        if trimmed == "-0" {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    }
}

/// Spell a number so it can be spliced back into formula text.
///
/// Uses the shortest round-trip representation (never exponent notation) and
/// parenthesises negatives so `5-A1` with `A1 = -3` reads `5-(-3)`.
pub fn number_literal(n: f64) -> String {
    let n = n + 0.0;
    if n < 0.0 {
        format!("({})", n)
    } else {
        format!("{}", n)
    }
}

/// Spell text as a double-quoted literal, doubling embedded quotes.
pub fn text_literal(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Spell a value as formula text.
pub fn value_literal(value: &Value) -> String {
    match value {
        Value::Number(n) => number_literal(*n),
        Value::Text(s) => text_literal(s),
    }
}

/// Strip the surrounding quotes of a literal produced by [`text_literal`].
/// Returns None when `token` is not exactly one quoted literal.
pub fn unquote(token: &str) -> Option<String> {
    let inner = token.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
                out.push('"');
            } else {
                return None;
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_display() {
        assert_eq!(format_number(14.0), "14");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-1.25), "-1.25");
        assert_eq!(format_number(f64::INFINITY), "#INF!");
    }

    #[test]
    fn test_number_literal_round_trips() {
        assert_eq!(number_literal(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(number_literal(-3.0), "(-3)");
        assert_eq!(number_literal(-0.0), "0");
        assert_eq!(number_literal(1e21), "1000000000000000000000");
    }

    #[test]
    fn test_text_literal_and_unquote() {
        let literal = text_literal("say \"hi\"");
        assert_eq!(literal, "\"say \"\"hi\"\"\"");
        assert_eq!(unquote(&literal).as_deref(), Some("say \"hi\""));
        assert_eq!(unquote("\"\"").as_deref(), Some(""));
        assert!(unquote("\"a\" + \"b\"").is_none());
        assert!(unquote("abc").is_none());
    }
}
