//! Table snapshot: display headers plus the positional grid formulas read.

use serde::{Deserialize, Serialize};
use tablecalc_engine::{CellValue, Grid};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub grid: Grid,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Table {
        Table {
            grid: Grid::with_headers(rows, headers),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.grid.headers
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn row_count(&self) -> usize {
        self.grid.row_count()
    }

    pub fn col_count(&self) -> usize {
        self.grid.col_count().max(self.grid.headers.len())
    }

    /// Header for a column, falling back to its A1 letters.
    pub fn header(&self, col: usize) -> String {
        self.grid
            .headers
            .get(col)
            .filter(|h| !h.is_empty())
            .cloned()
            .unwrap_or_else(|| tablecalc_engine::CellRef::col_to_letters(col))
    }
}
