use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::cell::CellValue;

/// One row of a sheet, aligned with the sheet's columns.
pub type Row = Vec<Option<CellValue>>;

/// A named table: ordered column headers from the header row, then data rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a sheet from raw grid rows. The first row is the header row;
    /// see [`normalize_headers`] for how header cells become column names.
    /// Rows with no present value are skipped; short rows are padded and
    /// cells past the header width are dropped.
    pub fn from_grid(name: impl Into<String>, grid: Vec<Row>) -> Self {
        let mut grid = grid.into_iter();
        let columns = match grid.next() {
            Some(header) => normalize_headers(&header),
            None => Vec::new(),
        };
        let width = columns.len();

        let rows = grid
            .filter(|row| row.iter().any(Option::is_some))
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();

        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn push_row(&mut self, mut row: Row) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn value(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row)?.get(col)?.as_ref()
    }
}

/// Turn a raw header row into unique column names.
///
/// Blank header cells become `Unnamed: <index>`. A name that repeats an
/// earlier one gets `.1`, `.2`, ... appended, skipping suffixes that are
/// themselves taken.
pub fn normalize_headers(header: &[Option<CellValue>]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::with_capacity(header.len());

    for (idx, cell) in header.iter().enumerate() {
        let base = match cell {
            Some(value) => value.to_string(),
            None => format!("Unnamed: {}", idx),
        };

        let mut name = base.clone();
        if let Some(count) = seen.get(&base).copied() {
            let mut n = count;
            loop {
                let candidate = format!("{}.{}", base, n);
                if !seen.contains_key(&candidate) {
                    name = candidate;
                    break;
                }
                n += 1;
            }
            seen.insert(base.clone(), n + 1);
        }
        seen.entry(name.clone()).or_insert(1);
        columns.push(name);
    }

    columns
}
