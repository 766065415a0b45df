//! Rectangular range references and range resolution.
//!
//! Three spellings are accepted:
//!
//! - `A1:C10` - bounded corners, normalized so `start <= end` on both axes
//! - `A:C` - whole columns, every row currently present in the grid
//! - `2:4` - whole rows, every column currently present in the grid
//!
//! Unbounded ends are stored as `usize::MAX` and clamped to the grid when the
//! range is expanded, so expansion is always finite.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::cell_ref::{CellRef, letters_to_col, parse_cell_token};
use super::grid::{CellValue, Grid};

const UNBOUNDED: usize = usize::MAX;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RangeRef {
    pub start: CellRef,
    pub end: CellRef,
}

impl RangeRef {
    /// Build a bounded range from two corners in any order.
    pub fn new(a: CellRef, b: CellRef) -> RangeRef {
        RangeRef {
            start: CellRef::new(a.col.min(b.col), a.row.min(b.row)),
            end: CellRef::new(a.col.max(b.col), a.row.max(b.row)),
        }
    }

    pub fn columns(first: usize, last: usize) -> RangeRef {
        RangeRef {
            start: CellRef::new(first.min(last), 0),
            end: CellRef::new(first.max(last), UNBOUNDED),
        }
    }

    pub fn rows(first: usize, last: usize) -> RangeRef {
        RangeRef {
            start: CellRef::new(0, first.min(last)),
            end: CellRef::new(UNBOUNDED, first.max(last)),
        }
    }

    /// Parse `A1:B2`, `A:B` or `1:2`. Returns None for anything malformed.
    pub fn parse(text: &str) -> Option<RangeRef> {
        let (left, right) = text.trim().split_once(':')?;
        let (left, right) = (left.trim(), right.trim());

        if let (Some(a), Some(b)) = (parse_cell_token(left), parse_cell_token(right)) {
            return Some(RangeRef::new(a, b));
        }
        if is_letters(left) && is_letters(right) {
            return Some(RangeRef::columns(letters_to_col(left)?, letters_to_col(right)?));
        }
        if is_digits(left) && is_digits(right) {
            let first = left.parse::<usize>().ok()?.checked_sub(1)?;
            let last = right.parse::<usize>().ok()?.checked_sub(1)?;
            return Some(RangeRef::rows(first, last));
        }
        None
    }

    pub fn is_bounded(&self) -> bool {
        self.end.row != UNBOUNDED && self.end.col != UNBOUNDED
    }

    /// Cells of the range that exist in `grid`, in row-major order.
    pub fn cells(&self, grid: &Grid) -> Vec<CellRef> {
        let mut cells = Vec::new();
        let Some(last_row) = grid.row_count().checked_sub(1) else {
            return cells;
        };
        let max_row = self.end.row.min(last_row);
        for row in self.start.row..=max_row {
            let Some(last_col) = grid.rows[row].len().checked_sub(1) else {
                continue;
            };
            let max_col = self.end.col.min(last_col);
            if self.start.col > max_col {
                continue;
            }
            for col in self.start.col..=max_col {
                cells.push(CellRef::new(col, row));
            }
        }
        cells
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.end.row == UNBOUNDED {
            write!(
                f,
                "{}:{}",
                CellRef::col_to_letters(self.start.col),
                CellRef::col_to_letters(self.end.col)
            )
        } else if self.end.col == UNBOUNDED {
            write!(f, "{}:{}", self.start.row + 1, self.end.row + 1)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

fn is_letters(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphabetic())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Values of every present cell in the range, row-major.
pub fn resolve_range(grid: &Grid, range: &RangeRef) -> Vec<CellValue> {
    range
        .cells(grid)
        .iter()
        .filter_map(|cell| grid.get(cell).cloned())
        .collect()
}

/// Numeric-coercible values of the range. Text cells are skipped, never zero-filled.
pub fn numeric_values(grid: &Grid, range: &RangeRef) -> Vec<f64> {
    range
        .cells(grid)
        .iter()
        .filter_map(|cell| grid.get(cell).and_then(CellValue::as_number))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Grid {
        Grid::new(vec![
            vec![10.0.into(), 20.0.into(), "x".into()],
            vec![30.0.into(), "n/a".into()],
            vec!["5".into(), 40.0.into(), 1.0.into()],
        ])
    }

    #[test]
    fn test_parse_normalizes_corners() {
        let range = RangeRef::parse("B3:A1").unwrap();
        assert_eq!(range.start, CellRef::new(0, 0));
        assert_eq!(range.end, CellRef::new(1, 2));
        assert_eq!(range.to_string(), "A1:B3");
    }

    #[test]
    fn test_parse_unbounded_forms() {
        let cols = RangeRef::parse("C:A").unwrap();
        assert!(!cols.is_bounded());
        assert_eq!(cols.to_string(), "A:C");

        let rows = RangeRef::parse("2:2").unwrap();
        assert_eq!(rows.start.row, 1);
        assert_eq!(rows.to_string(), "2:2");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(RangeRef::parse("A1").is_none());
        assert!(RangeRef::parse("A0:B2").is_none());
        assert!(RangeRef::parse("A1:2").is_none());
        assert!(RangeRef::parse("0:3").is_none());
    }

    #[test]
    fn test_resolve_range_row_major() {
        let grid = sample();
        let values = resolve_range(&grid, &RangeRef::parse("A1:B2").unwrap());
        assert_eq!(
            values,
            vec![10.0.into(), 20.0.into(), 30.0.into(), "n/a".into()]
        );
    }

    #[test]
    fn test_numeric_values_skip_text() {
        let grid = sample();
        let values = numeric_values(&grid, &RangeRef::parse("A1:C3").unwrap());
        assert_eq!(values, vec![10.0, 20.0, 30.0, 5.0, 40.0, 1.0]);
    }

    #[test]
    fn test_unbounded_column_uses_present_rows() {
        let grid = sample();
        let values = numeric_values(&grid, &RangeRef::parse("B:B").unwrap());
        assert_eq!(values, vec![20.0, 40.0]);
    }

    #[test]
    fn test_unbounded_row_uses_present_columns() {
        let grid = sample();
        let values = numeric_values(&grid, &RangeRef::parse("3:3").unwrap());
        assert_eq!(values, vec![5.0, 40.0, 1.0]);
    }

    #[test]
    fn test_out_of_bounds_range_is_clamped() {
        let grid = sample();
        let values = numeric_values(&grid, &RangeRef::parse("C1:Z1000000").unwrap());
        assert_eq!(values, vec![1.0]);
        assert!(resolve_range(&Grid::default(), &RangeRef::parse("A:A").unwrap()).is_empty());
    }
}
