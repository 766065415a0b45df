//! Recursive-descent expression evaluator.
//!
//! Runs after every reference and function call has been rewritten into a
//! literal. Two entry points share one parser:
//!
//! - [`evaluate_arithmetic`] - the final stage. The text must contain only
//!   digits, whitespace, `.`, `+ - * /` and parentheses; anything else is
//!   rejected before a single token is read.
//! - [`evaluate_operand`] - function arguments. Additionally accepts quoted
//!   text literals and one comparison (`= <> < <= > >=`), which is how IF
//!   conditions are written.
//!
//! # Grammar
//!
//! ```bnf
//! Comparison     ::= Addition ( CmpOp Addition )?
//! Addition       ::= Multiplication ( ( "+" | "-" ) Multiplication )*
//! Multiplication ::= Unary ( ( "*" | "/" ) Unary )*
//! Unary          ::= ( "+" | "-" ) Unary | Primary
//! Primary        ::= Number | Text | "(" Comparison ")"
//! ```

use crate::error::{FormulaError, Result};

use super::Value;
use super::grid::parse_numeric_text;

/// Parenthesis depth after which the parser gives up instead of recursing further.
pub const MAX_GROUP_DEPTH: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Text(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Cmp(CmpOp),
}

/// True for characters allowed in a fully reduced arithmetic expression.
pub fn is_arithmetic_char(c: char) -> bool {
    c.is_ascii_digit() || c.is_whitespace() || matches!(c, '.' | '+' | '-' | '*' | '/' | '(' | ')')
}

/// Evaluate a pure arithmetic expression such as `2+3*(4-1)`.
pub fn evaluate_arithmetic(text: &str) -> Result<f64> {
    if !text.chars().all(is_arithmetic_char) {
        return Err(FormulaError::invalid("unexpected character in expression"));
    }
    match evaluate_operand(text)? {
        Value::Number(n) => Ok(n),
        Value::Text(_) => Err(FormulaError::invalid("expected a number")),
    }
}

/// Evaluate a function argument: arithmetic, a text literal, or one comparison.
/// Comparisons yield `1` for true and `0` for false.
pub fn evaluate_operand(text: &str) -> Result<Value> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(FormulaError::invalid("empty expression"));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.parse_comparison()?;
    if parser.pos != parser.tokens.len() {
        return Err(FormulaError::invalid("unexpected token"));
    }
    if let Value::Number(n) = value
        && !n.is_finite()
    {
        return Err(FormulaError::invalid("result is not a finite number"));
    }
    Ok(value)
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let n = literal
                    .parse::<f64>()
                    .map_err(|_| FormulaError::invalid("malformed number"))?;
                tokens.push(Token::Number(n));
            }
            '"' => {
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(FormulaError::invalid("unterminated string literal")),
                        Some('"') if chars.get(i + 1) == Some(&'"') => {
                            text.push('"');
                            i += 2;
                        }
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some(ch) => {
                            text.push(*ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Text(text));
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Cmp(CmpOp::Eq));
                i += 1;
            }
            '<' | '>' => {
                let next = chars.get(i + 1).copied();
                let (op, width) = match (c, next) {
                    ('<', Some('>')) => (CmpOp::Ne, 2),
                    ('<', Some('=')) => (CmpOp::Le, 2),
                    ('<', _) => (CmpOp::Lt, 1),
                    ('>', Some('=')) => (CmpOp::Ge, 2),
                    _ => (CmpOp::Gt, 1),
                };
                tokens.push(Token::Cmp(op));
                i += width;
            }
            _ => return Err(FormulaError::invalid("unexpected character in expression")),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_comparison(&mut self) -> Result<Value> {
        let left = self.parse_addition()?;
        let Some(Token::Cmp(op)) = self.peek().cloned() else {
            return Ok(left);
        };
        self.pos += 1;
        let right = self.parse_addition()?;
        Ok(Value::Number(if compare(&left, op, &right) { 1.0 } else { 0.0 }))
    }

    fn parse_addition(&mut self) -> Result<Value> {
        let mut left = self.parse_multiplication()?;
        while let Some(token @ (Token::Plus | Token::Minus)) = self.peek().cloned() {
            self.pos += 1;
            let right = as_number(&self.parse_multiplication()?)?;
            let acc = as_number(&left)?;
            left = Value::Number(if token == Token::Plus {
                acc + right
            } else {
                acc - right
            });
        }
        Ok(left)
    }

    fn parse_multiplication(&mut self) -> Result<Value> {
        let mut left = self.parse_unary()?;
        while let Some(token @ (Token::Star | Token::Slash)) = self.peek().cloned() {
            self.pos += 1;
            let right = as_number(&self.parse_unary()?)?;
            let acc = as_number(&left)?;
            left = Value::Number(if token == Token::Star {
                acc * right
            } else {
                if right == 0.0 {
                    return Err(FormulaError::DivisionByZero);
                }
                acc / right
            });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Value> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                self.enter()?;
                let value = as_number(&self.parse_unary()?)?;
                self.depth -= 1;
                Ok(Value::Number(-value))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.enter()?;
                let value = as_number(&self.parse_unary()?)?;
                self.depth -= 1;
                Ok(Value::Number(value))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Value> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Value::Number(n)),
            Some(Token::Text(s)) => Ok(Value::Text(s)),
            Some(Token::LParen) => {
                self.enter()?;
                let value = self.parse_comparison()?;
                self.depth -= 1;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(FormulaError::UnbalancedParentheses),
                }
            }
            Some(Token::RParen) => Err(FormulaError::UnbalancedParentheses),
            Some(_) => Err(FormulaError::invalid("unexpected operator")),
            None => Err(FormulaError::invalid("unexpected end of expression")),
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_GROUP_DEPTH {
            return Err(FormulaError::TooComplex(MAX_GROUP_DEPTH));
        }
        Ok(())
    }
}

fn as_number(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Text(s) => {
            parse_numeric_text(s).ok_or_else(|| FormulaError::invalid("text used in arithmetic"))
        }
    }
}

fn compare(left: &Value, op: CmpOp, right: &Value) -> bool {
    use std::cmp::Ordering;

    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        _ => None,
    };
    match (op, ordering) {
        (CmpOp::Eq, Some(o)) => o == Ordering::Equal,
        (CmpOp::Ne, Some(o)) => o != Ordering::Equal,
        (CmpOp::Ne, None) => true,
        (CmpOp::Lt, Some(o)) => o == Ordering::Less,
        (CmpOp::Le, Some(o)) => o != Ordering::Greater,
        (CmpOp::Gt, Some(o)) => o == Ordering::Greater,
        (CmpOp::Ge, Some(o)) => o != Ordering::Less,
        (_, None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(evaluate_arithmetic("2+3*4"), Ok(14.0));
        assert_eq!(evaluate_arithmetic("(2+3)*4"), Ok(20.0));
        assert_eq!(evaluate_arithmetic("2*3+4*5"), Ok(26.0));
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(evaluate_arithmetic("10-4-3"), Ok(3.0));
        assert_eq!(evaluate_arithmetic("100/10/5"), Ok(2.0));
        assert_eq!(evaluate_arithmetic("8/4*2"), Ok(4.0));
    }

    #[test]
    fn test_nested_parentheses_and_whitespace() {
        assert_eq!(evaluate_arithmetic(" ( ( 1 + 2 ) * ( 3 + 4 ) ) / 7 "), Ok(3.0));
        assert_eq!(evaluate_arithmetic("((((5))))"), Ok(5.0));
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(evaluate_arithmetic("5-(-3)"), Ok(8.0));
        assert_eq!(evaluate_arithmetic("-2*3"), Ok(-6.0));
        assert_eq!(evaluate_arithmetic("--4"), Ok(4.0));
        assert_eq!(evaluate_arithmetic("+.5"), Ok(0.5));
    }

    #[test]
    fn test_division_by_zero_is_tagged() {
        assert_eq!(evaluate_arithmetic("1/0"), Err(FormulaError::DivisionByZero));
        assert_eq!(evaluate_arithmetic("5/(2-2)"), Err(FormulaError::DivisionByZero));
        assert_eq!(evaluate_arithmetic("0/0"), Err(FormulaError::DivisionByZero));
    }

    #[test]
    fn test_whitelist_rejects_before_parsing() {
        for text in ["1;2", "1+a", "\"x\"", "2>1", "1,2", "2^3", "1%2"] {
            let err = evaluate_arithmetic(text).unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::InvalidExpression, "{}", text);
        }
    }

    #[test]
    fn test_malformed_arithmetic() {
        assert!(evaluate_arithmetic("").is_err());
        assert!(evaluate_arithmetic("1+").is_err());
        assert!(evaluate_arithmetic("1.2.3").is_err());
        assert!(evaluate_arithmetic("2 3").is_err());
        assert_eq!(evaluate_arithmetic("(1+2"), Err(FormulaError::UnbalancedParentheses));
        assert_eq!(evaluate_arithmetic("1+2)"), Err(FormulaError::invalid("unexpected token")));
    }

    #[test]
    fn test_group_depth_limit() {
        let deep = format!("{}1{}", "(".repeat(MAX_GROUP_DEPTH + 1), ")".repeat(MAX_GROUP_DEPTH + 1));
        assert_eq!(
            evaluate_arithmetic(&deep),
            Err(FormulaError::TooComplex(MAX_GROUP_DEPTH))
        );
    }

    #[test]
    fn test_overflow_is_rejected() {
        let huge = format!("1{}*1{}", "0".repeat(300), "0".repeat(300));
        assert_eq!(evaluate_arithmetic(&huge).unwrap_err().kind(), crate::ErrorKind::InvalidExpression);
    }

    #[test]
    fn test_operand_comparisons() {
        assert_eq!(evaluate_operand("10>5"), Ok(Value::Number(1.0)));
        assert_eq!(evaluate_operand("10<=5"), Ok(Value::Number(0.0)));
        assert_eq!(evaluate_operand("2+2=4"), Ok(Value::Number(1.0)));
        assert_eq!(evaluate_operand("3<>3"), Ok(Value::Number(0.0)));
        assert_eq!(evaluate_operand("\"Yes\"=\"Yes\""), Ok(Value::Number(1.0)));
        assert_eq!(evaluate_operand("\"a\"=1"), Ok(Value::Number(0.0)));
        assert_eq!(evaluate_operand("\"a\"<>1"), Ok(Value::Number(1.0)));
    }

    #[test]
    fn test_operand_text_literal() {
        assert_eq!(
            evaluate_operand("\"say \"\"hi\"\"\""),
            Ok(Value::Text("say \"hi\"".into()))
        );
        assert_eq!(evaluate_operand("\"4\"+1"), Ok(Value::Number(5.0)));
        assert_eq!(
            evaluate_operand("\"abc\"+1"),
            Err(FormulaError::invalid("text used in arithmetic"))
        );
        assert_eq!(
            evaluate_operand("\"open"),
            Err(FormulaError::invalid("unterminated string literal"))
        );
    }
}
