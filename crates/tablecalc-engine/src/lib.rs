//! tablecalc_engine - Formula evaluation for spreadsheet-like tables.
//!
//! ```
//! use tablecalc_engine::{Grid, evaluate};
//!
//! let grid = Grid::from_numbers(&[[10.0, 20.0], [30.0, 40.0]]);
//! assert_eq!(evaluate("=SUM(A1:B2)", &grid).display(), "100");
//! ```

pub mod builtins;
pub mod config;
pub mod engine;
pub mod error;

pub use builtins::{Arity, Builtin, Call, FunctionRegistry, default_registry};
pub use config::{EmptyExtremum, EmptyProduct, EngineConfig};
pub use engine::{
    CellRef, CellValue, Engine, EvaluationResult, Grid, RangeRef, ValidationResult, Value,
    evaluate, validate,
};
pub use error::{ErrorKind, FormulaError};

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::from_numbers(&[[10.0, 20.0], [30.0, 40.0]])
    }

    fn number(formula: &str, grid: &Grid) -> f64 {
        match evaluate(formula, grid) {
            EvaluationResult::Success {
                value: Value::Number(n),
            } => n,
            other => panic!("{} gave {:?}", formula, other),
        }
    }

    fn kind(formula: &str, grid: &Grid) -> Option<ErrorKind> {
        evaluate(formula, grid).error_kind()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(number("=2+3*4", &Grid::default()), 14.0);
    }

    #[test]
    fn test_end_to_end_examples() {
        let grid = grid();
        assert_eq!(number("=SUM(A1:B2)", &grid), 100.0);
        assert_eq!(number("=AVERAGE(A1:A2)", &grid), 20.0);
        assert_eq!(
            evaluate("=IF(A1>5,\"Big\",\"Small\")", &grid),
            EvaluationResult::success(Value::Text("Big".into()))
        );
        assert_eq!(kind("=A1/0", &grid), Some(ErrorKind::DivisionByZero));
        assert_eq!(evaluate("=A1/0", &grid).display(), "#ERROR: Division by zero");
    }

    #[test]
    fn test_nested_functions() {
        let grid = Grid::from_numbers(&[[1.0], [2.0], [2.0], [3.0], [3.0]]);
        assert_eq!(number("=ROUND(AVERAGE(A1:A5),2)", &grid), 2.2);
        assert_eq!(number("=ROUND(AVERAGE(A1:A5)*3,0)+1", &grid), 8.0);
        assert_eq!(number("=MEDIAN(A1:A5)", &grid), 2.0);
        assert_eq!(number("=PRODUCT(A1:A5)", &grid), 36.0);
    }

    #[test]
    fn test_mixed_arguments() {
        let grid = Grid::new(vec![
            vec![1.0.into(), 2.0.into()],
            vec!["n/a".into(), 3.0.into()],
            vec![4.0.into(), "7".into()],
        ]);
        assert_eq!(number("=SUM(A1,B2:B3,5)", &grid), 16.0);
        assert_eq!(number("=COUNT(A1:A3)", &grid), 2.0);
        assert_eq!(number("=AVERAGE(A1:A3)", &grid), 2.5);
        assert_eq!(number("=MAX(A:A)", &grid), 4.0);
    }

    #[test]
    fn test_text_results() {
        let grid = Grid::new(vec![vec!["Jane".into(), 42.0.into()]]);
        assert_eq!(
            evaluate("=CONCAT(A1,\" is \",B1)", &grid).display(),
            "Jane is 42"
        );
        assert_eq!(
            evaluate("=IF(B1>=40,CONCAT(\"old \",A1),\"young\")", &grid).display(),
            "old Jane"
        );
    }

    #[test]
    fn test_if_skips_untaken_division() {
        let grid = Grid::from_numbers(&[[0.0]]);
        assert_eq!(number("=IF(A1=0,0,10/A1)", &grid), 0.0);
    }

    #[test]
    fn test_whitelist_is_unconditional() {
        let grid = grid();
        assert_eq!(kind("=1;2", &grid), Some(ErrorKind::InvalidExpression));
        assert_eq!(kind("=A1>5", &grid), Some(ErrorKind::InvalidExpression));
        assert_eq!(kind("=\"a\"+1", &grid), Some(ErrorKind::InvalidExpression));
    }

    #[test]
    fn test_empty_arguments_do_not_shift_positions() {
        let grid = grid();
        assert_eq!(number("=IF(A1>5,C9:C9,7)", &grid), 0.0);
        assert_eq!(number("=ROUND(A5:A5,1)", &grid), 0.0);
        assert_eq!(number("=IF(1,,\"x\")", &grid), 0.0);
        assert_eq!(number("=POWER(Z1:Z2,2)", &grid), 0.0);
        assert_eq!(number("=SUM(Z1:Z2,A1:B1)", &grid), 30.0);
    }

    #[test]
    fn test_strict_references_reject_out_of_bounds_ranges() {
        let strict = Engine::new(EngineConfig {
            strict_references: true,
            ..EngineConfig::default()
        });
        let grid = grid();
        for formula in ["=SUM(Z1:Z9)", "=SUM(C:C)", "=Z9"] {
            assert_eq!(
                strict.evaluate(formula, &grid).error_kind(),
                Some(ErrorKind::MalformedReference),
                "{}",
                formula
            );
        }
        assert_eq!(strict.evaluate("=SUM(A:A)", &grid).display(), "40");
    }

    #[test]
    fn test_error_kinds() {
        let grid = grid();
        assert_eq!(kind("=FOO(A1)", &grid), Some(ErrorKind::UnknownFunction));
        assert_eq!(kind("=SUM(A1:A2", &grid), Some(ErrorKind::UnbalancedParentheses));
        assert_eq!(kind("=", &grid), Some(ErrorKind::InvalidExpression));
        assert_eq!(kind("=ROUND(1,2,3)", &grid), Some(ErrorKind::InvalidExpression));
    }

    #[test]
    fn test_nesting_depth_limit() {
        let nest = |depth: usize| format!("={}1{}", "ABS(".repeat(depth), ")".repeat(depth));
        assert_eq!(number(&nest(32), &Grid::default()), 1.0);
        assert_eq!(kind(&nest(33), &Grid::default()), Some(ErrorKind::TooComplex));
    }

    #[test]
    fn test_lenient_and_strict_references() {
        let grid = grid();
        assert_eq!(number("=Z100+A0+1", &grid), 1.0);

        let strict = Engine::new(EngineConfig {
            strict_references: true,
            ..EngineConfig::default()
        });
        assert_eq!(
            strict.evaluate("=Z100+1", &grid).error_kind(),
            Some(ErrorKind::MalformedReference)
        );
    }

    #[test]
    fn test_custom_function_through_engine() {
        fn triple(args: &[Value], _: &EngineConfig) -> Result<Value, FormulaError> {
            Ok(Value::Number(args[0].as_number().unwrap_or(0.0) * 3.0))
        }
        let mut engine = Engine::default();
        engine.registry_mut().register(Builtin {
            name: "TRIPLE",
            arity: Arity::exactly(1),
            call: Call::Scalar(triple),
            description: "Three times the argument",
        });
        assert_eq!(engine.evaluate("=TRIPLE(A2)", &grid()).display(), "90");
        assert!(engine.validate("=triple(1)").valid);
        assert!(!validate("=TRIPLE(1)").valid);
    }

    #[test]
    fn test_validate_reports_messages() {
        let result = validate("=FOO(1");
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec!["Unbalanced parentheses".to_string(), "Unknown function: FOO".to_string()]
        );
        assert!(validate("=SUM(A1:A3)/0").valid);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn cell() -> impl Strategy<Value = CellValue> {
        prop_oneof![
            (-1000i32..1000).prop_map(|n| CellValue::Number(n as f64 / 4.0)),
            "[a-z]{0,4}".prop_map(CellValue::Text),
        ]
    }

    fn grid() -> impl Strategy<Value = Grid> {
        prop::collection::vec(prop::collection::vec(cell(), 1..5), 1..6).prop_map(Grid::new)
    }

    fn number(result: EvaluationResult) -> f64 {
        result.value().and_then(Value::as_number).unwrap_or(f64::NAN)
    }

    proptest! {
        #[test]
        fn sum_counts_only_numeric_cells(grid in grid()) {
            let range = RangeRef::parse("A1:E6").unwrap();
            let expected: f64 = engine::numeric_values(&grid, &range).iter().sum();
            let got = number(evaluate("=SUM(A1:E6)", &grid));
            prop_assert!((got - expected).abs() < 1e-9);
        }

        #[test]
        fn average_is_sum_over_count(grid in grid()) {
            let count = number(evaluate("=COUNT(A1:E6)", &grid));
            prop_assume!(count > 0.0);
            let sum = number(evaluate("=SUM(A1:E6)", &grid));
            let average = number(evaluate("=AVERAGE(A1:E6)", &grid));
            prop_assert!((average - sum / count).abs() < 1e-9);
        }

        #[test]
        fn round_is_idempotent(x in -1.0e6f64..1.0e6, digits in -3i32..6) {
            let once = builtins::round_half_away(x, digits);
            prop_assert_eq!(builtins::round_half_away(once, digits), once);
        }

        #[test]
        fn division_by_zero_is_tagged(a in -1000i32..1000, b in 0i32..5) {
            let formula = format!("={}/({}-{})", a, b, b);
            prop_assert_eq!(
                evaluate(&formula, &Grid::default()).error_kind(),
                Some(ErrorKind::DivisionByZero)
            );
        }
    }
}
