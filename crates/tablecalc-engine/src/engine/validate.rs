//! Static formula validation.
//!
//! Side-effect free and grid-independent, so it can run on every keystroke
//! in an editor. Passing validation does not guarantee evaluation succeeds:
//! division by zero, for one, only shows up once real data is substituted.

use regex::Regex;
use std::sync::OnceLock;

use crate::builtins::FunctionRegistry;
use crate::error::FormulaError;

fn function_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\(").expect("function call regex must compile")
    })
}

/// Strip the optional leading `=` and surrounding whitespace.
pub fn formula_body(formula: &str) -> &str {
    let trimmed = formula.trim();
    trimmed.strip_prefix('=').unwrap_or(trimmed).trim()
}

/// Every problem found in `formula`, in source order.
pub fn check_formula(formula: &str, registry: &FunctionRegistry) -> Vec<FormulaError> {
    let body = formula_body(formula);
    if body.is_empty() {
        return vec![FormulaError::invalid("empty formula")];
    }

    let mut issues = Vec::new();
    let outside = mask_strings(body);
    if outside.unterminated {
        issues.push(FormulaError::invalid("unterminated string literal"));
    }

    let mut depth = 0i64;
    let mut stray_close = false;
    for b in outside.text.bytes() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth < 0 {
                    stray_close = true;
                    depth = 0;
                }
            }
            _ => {}
        }
    }
    if stray_close || depth != 0 {
        issues.push(FormulaError::UnbalancedParentheses);
    }

    let mut reported: Vec<String> = Vec::new();
    for caps in function_call_re().captures_iter(&outside.text) {
        let name = caps[1].to_ascii_uppercase();
        if !registry.contains(&name) && !reported.contains(&name) {
            reported.push(name.clone());
            issues.push(FormulaError::UnknownFunction(name));
        }
    }

    issues
}

struct Masked {
    text: String,
    unterminated: bool,
}

/// Replace string literal contents (quotes included) with spaces so
/// parentheses and names inside text are ignored.
fn mask_strings(body: &str) -> Masked {
    let mut text = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    text.push_str("  ");
                    continue;
                }
                in_string = false;
            }
            text.push(' ');
        } else if c == '"' {
            in_string = true;
            text.push(' ');
        } else {
            text.push(c);
        }
    }

    Masked {
        text,
        unterminated: in_string,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::default_registry;

    fn issues(formula: &str) -> Vec<FormulaError> {
        check_formula(formula, default_registry())
    }

    #[test]
    fn test_valid_formulas() {
        assert!(issues("=ROUND(AVERAGE(A1:A5),2)").is_empty());
        assert!(issues("=IF(A1>5,\"Big (really)\",\"Small\")").is_empty());
        assert!(issues("2+3*4").is_empty());
        assert!(issues("=sum(A:A)").is_empty());
    }

    #[test]
    fn test_empty_formula() {
        assert_eq!(issues(" = "), vec![FormulaError::invalid("empty formula")]);
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert_eq!(issues("=SUM(A1:A3"), vec![FormulaError::UnbalancedParentheses]);
        assert_eq!(issues("=(1+2))"), vec![FormulaError::UnbalancedParentheses]);
        assert_eq!(issues("=)1+2("), vec![FormulaError::UnbalancedParentheses]);
    }

    #[test]
    fn test_unknown_functions_reported_once() {
        assert_eq!(
            issues("=FOO(1)+foo(2)+BAR(SUM(1))"),
            vec![
                FormulaError::UnknownFunction("FOO".into()),
                FormulaError::UnknownFunction("BAR".into()),
            ]
        );
    }

    #[test]
    fn test_names_inside_strings_are_ignored() {
        assert!(issues("=CONCAT(\"NOPE(\", \"x\")").is_empty());
    }

    #[test]
    fn test_unterminated_string() {
        let found = issues("=CONCAT(\"abc)");
        assert_eq!(found[0], FormulaError::invalid("unterminated string literal"));
    }

    #[test]
    fn test_formula_body() {
        assert_eq!(formula_body("  =SUM(1) "), "SUM(1)");
        assert_eq!(formula_body("1+1"), "1+1");
    }
}
