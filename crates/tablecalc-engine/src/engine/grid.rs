//! Grid snapshot data structures.
//!
//! - [`CellValue`] - The content of a single cell (text or number)
//! - [`Grid`] - An immutable, row-major snapshot of table data plus display headers
//!
//! Formula addressing is purely positional; headers are carried for display only.

use serde::{Deserialize, Serialize};

use super::cell_ref::CellRef;

/// The content stored in a grid cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    /// Numeric coercion: numbers pass through, text counts only when it
    /// parses as a plain decimal number. Empty text is not numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Number(_) => None,
            CellValue::Text(s) => parse_numeric_text(s),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.trim().is_empty())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// Parse text as a number, rejecting `inf`, `NaN` and other non-decimal spellings.
pub(crate) fn parse_numeric_text(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let body = trimmed.strip_prefix(['-', '+']).unwrap_or(trimmed);
    let plain = !body.is_empty()
        && body.bytes().any(|b| b.is_ascii_digit())
        && body
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'-' | b'+'));
    if !plain {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// An immutable snapshot of tabular data, addressed by 0-based (row, column).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub rows: Vec<Vec<CellValue>>,
    #[serde(default)]
    pub headers: Vec<String>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Grid {
        Grid {
            rows,
            headers: Vec::new(),
        }
    }

    pub fn with_headers(rows: Vec<Vec<CellValue>>, headers: Vec<String>) -> Grid {
        Grid { rows, headers }
    }

    /// Build a numeric grid; handy for callers and tests.
    pub fn from_numbers<R: AsRef<[f64]>>(rows: &[R]) -> Grid {
        Grid::new(
            rows.iter()
                .map(|row| row.as_ref().iter().map(|n| CellValue::Number(*n)).collect())
                .collect(),
        )
    }

    pub fn get(&self, cell: &CellRef) -> Option<&CellValue> {
        self.rows.get(cell.row)?.get(cell.col)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row; rows may be ragged.
    pub fn col_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn contains(&self, cell: &CellRef) -> bool {
        self.get(cell).is_some()
    }
}
