// ============================================================
// Layer 4 - Table
// ============================================================
// An in-memory CSV: a header row plus string cells.
//
// Cells are kept as the raw strings read from disk so the
// editor can write them back untouched. Typed views (numbers,
// booleans, column kinds) are computed on demand.
//
// Missing values follow the usual dataframe conventions: an
// empty cell or one of NA / N/A / NaN / null / None / #N/A.

use std::collections::HashSet;

use anyhow::Result;
use serde::{Deserialize, Serialize};

const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "none", "#N/A",
];

/// A text column becomes `Text` (rather than `Categorical`) when
/// more than half its values are distinct and they are this long
/// on average.
const TEXT_MIN_MEAN_LEN: f64 = 20.0;

/// Returns true if `cell` counts as a missing value.
pub fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

/// Parse a cell as a finite number. Missing cells are `None`.
pub fn parse_number(cell: &str) -> Option<f64> {
    if is_missing(cell) {
        return None;
    }
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a cell as a boolean: true/false or yes/no, any case.
pub fn parse_bool(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" | "yes"  => Some(true),
        "false" | "no"  => Some(false),
        _ => None,
    }
}

/// The inferred type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Boolean,
    Categorical,
    Text,
    /// Every value is missing
    Empty,
}

impl ColumnKind {
    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Numeric     => "Numeric",
            ColumnKind::Boolean     => "Boolean",
            ColumnKind::Categorical => "Categorical",
            ColumnKind::Text        => "Text",
            ColumnKind::Empty       => "Empty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    /// Row-major cells; every row has exactly `headers.len()` cells
    pub rows:    Vec<Vec<String>>,
}

impl Table {
    /// Build a table, padding short rows with empty cells and
    /// truncating long ones so every row matches the header.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, String::new());
                r
            })
            .collect();
        Self { headers, rows }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All cells of one column, in row order.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |r| r[idx].as_str())
    }

    /// The non-missing cells of one column, trimmed.
    pub fn present_values(&self, idx: usize) -> Vec<&str> {
        self.column(idx)
            .filter(|c| !is_missing(c))
            .map(str::trim)
            .collect()
    }

    /// Numeric view of a column; non-numeric cells become `None`.
    pub fn numeric_column(&self, idx: usize) -> Vec<Option<f64>> {
        self.column(idx).map(parse_number).collect()
    }

    /// Infer the kind of a column from its present values.
    pub fn column_kind(&self, idx: usize) -> ColumnKind {
        let present = self.present_values(idx);
        if present.is_empty() {
            return ColumnKind::Empty;
        }
        if present.iter().all(|v| parse_bool(v).is_some()) {
            return ColumnKind::Boolean;
        }
        if present.iter().all(|v| parse_number(v).is_some()) {
            return ColumnKind::Numeric;
        }

        let distinct: HashSet<&str> = present.iter().copied().collect();
        let mean_len = present.iter().map(|v| v.chars().count()).sum::<usize>() as f64
            / present.len() as f64;
        if distinct.len() * 2 > present.len() && mean_len >= TEXT_MIN_MEAN_LEN {
            ColumnKind::Text
        } else {
            ColumnKind::Categorical
        }
    }

    /// Number of rows that exactly repeat an earlier row.
    pub fn duplicate_rows(&self) -> usize {
        let mut seen = HashSet::with_capacity(self.rows.len());
        self.rows.iter().filter(|r| !seen.insert(r.as_slice())).count()
    }

    /// Overwrite one cell.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) -> Result<()> {
        let (n_rows, n_cols) = (self.n_rows(), self.n_cols());
        let cell = self
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or_else(|| anyhow::anyhow!(
                "Cell ({row}, {col}) is outside a {n_rows}x{n_cols} table"
            ))?;
        *cell = value.into();
        Ok(())
    }

    /// Remove and return one row.
    pub fn remove_row(&mut self, row: usize) -> Result<Vec<String>> {
        if row >= self.n_rows() {
            anyhow::bail!("Row {row} is outside a table of {} rows", self.n_rows());
        }
        Ok(self.rows.remove(row))
    }

    /// A new table holding only the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            headers: self.headers.clone(),
            rows:    indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}
