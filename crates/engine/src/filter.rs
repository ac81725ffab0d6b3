//! Row filter for phrase search.
//!
//! A row matches when its search-column value, as text, contains a
//! case-insensitive match of the phrase compiled as a regular expression.
//! Rows whose search-column value is absent never match.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cell::CellValue;
use crate::settings::SearchSettings;
use crate::sheet::Sheet;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search phrase is empty")]
    EmptyPhrase,

    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("column '{column}' not found in sheet '{sheet}'")]
    MissingColumn { sheet: String, column: String },

    /// The file or sheet could not be read.
    #[error("{0}")]
    Source(String),
}

/// Compiled search phrase.
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    regex: Regex,
}

impl PhraseMatcher {
    /// Compile `phrase` as a case-insensitive regular expression. Special
    /// characters keep their regex meaning.
    pub fn new(phrase: &str) -> Result<Self, SearchError> {
        if phrase.is_empty() {
            return Err(SearchError::EmptyPhrase);
        }
        let regex = RegexBuilder::new(phrase).case_insensitive(true).build()?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, value: &CellValue) -> bool {
        match value {
            CellValue::Text(s) => self.regex.is_match(s),
            other => self.regex.is_match(&other.to_string()),
        }
    }
}

/// One matching row: the sheet it came from, then the value of each
/// selected column (search column first) in settings order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchResultRow {
    pub sheet: String,
    pub values: Vec<Option<CellValue>>,
}

impl SearchResultRow {
    /// Cells in display-column order, the sheet name first.
    pub fn cells(&self) -> Vec<Option<CellValue>> {
        std::iter::once(Some(CellValue::text(self.sheet.as_str())))
            .chain(self.values.iter().cloned())
            .collect()
    }

    pub fn search_value(&self) -> Option<&CellValue> {
        self.values.first().and_then(Option::as_ref)
    }
}

/// Map the empty string to the null sentinel.
fn normalize(value: &Option<CellValue>) -> Option<CellValue> {
    match value {
        Some(CellValue::Text(s)) if s.is_empty() => None,
        other => other.clone(),
    }
}

/// Filter `sheet` with `settings`, projecting each matching row onto the
/// selected columns.
pub fn filter_sheet(
    sheet: &Sheet,
    settings: &SearchSettings,
    matcher: &PhraseMatcher,
) -> Result<Vec<SearchResultRow>, SearchError> {
    let indices = settings
        .selected_columns()
        .into_iter()
        .map(|column| {
            sheet.column_index(column).ok_or_else(|| SearchError::MissingColumn {
                sheet: sheet.name.clone(),
                column: column.to_string(),
            })
        })
        .collect::<Result<Vec<usize>, SearchError>>()?;
    let search_idx = indices[0];

    let results: Vec<SearchResultRow> = sheet
        .rows
        .iter()
        .filter(|row| match row.get(search_idx).and_then(normalize) {
            Some(value) => matcher.is_match(&value),
            None => false,
        })
        .map(|row| SearchResultRow {
            sheet: settings.sheet_name.clone(),
            values: indices
                .iter()
                .map(|&idx| row.get(idx).and_then(normalize))
                .collect(),
        })
        .collect();

    log::debug!(
        "sheet '{}': {} of {} rows matched",
        sheet.name,
        results.len(),
        sheet.row_count()
    );
    Ok(results)
}
