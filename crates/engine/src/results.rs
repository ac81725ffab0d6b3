//! Search results in display form.
//!
//! A [`ResultSet`] pairs the rows of one search with the display columns of
//! the settings that produced it. Rendering, sorting and export all read the
//! same in-memory rows; nothing here goes back to the file.

use std::collections::HashSet;

use thiserror::Error;

use crate::cell::{display_or_empty, CellValue};
use crate::filter::SearchResultRow;
use crate::settings::SearchSettings;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown result column '{0}'")]
pub struct UnknownColumn(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Text grid ready to be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    NoResults,
    Table(ResultTable),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<SearchResultRow>,
}

impl ResultSet {
    pub fn new(settings: &SearchSettings, rows: Vec<SearchResultRow>) -> Self {
        Self {
            columns: settings.display_columns(),
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[SearchResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One text row per result, in display-column order. Nulls render as
    /// empty cells.
    pub fn presentation(&self) -> Presentation {
        if self.rows.is_empty() {
            return Presentation::NoResults;
        }
        let rows = self
            .rows
            .iter()
            .map(|row| row.cells().iter().map(|c| display_or_empty(c.as_ref())).collect())
            .collect();
        Presentation::Table(ResultTable {
            headers: self.columns.clone(),
            rows,
        })
    }

    /// Stable sort on one display column. Values compare by type first, then
    /// by value; nulls come first in ascending order.
    pub fn sort_by(&mut self, column: &str, order: SortOrder) -> Result<(), UnknownColumn> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .ok_or_else(|| UnknownColumn(column.to_string()))?;

        self.rows.sort_by(|a, b| {
            let ord = cell_at(a, idx).cmp(&cell_at(b, idx));
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
        Ok(())
    }

    /// Rows with exact duplicates removed, first occurrence kept, plus the
    /// number of rows dropped.
    pub fn deduplicated(&self) -> (Vec<SearchResultRow>, usize) {
        let mut seen: HashSet<&SearchResultRow> = HashSet::with_capacity(self.rows.len());
        let mut unique = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            if seen.insert(row) {
                unique.push(row.clone());
            }
        }
        let dropped = self.rows.len() - unique.len();
        (unique, dropped)
    }
}

fn cell_at(row: &SearchResultRow, idx: usize) -> Option<CellValue> {
    if idx == 0 {
        Some(CellValue::text(row.sheet.as_str()))
    } else {
        row.values.get(idx - 1).cloned().flatten()
    }
}
