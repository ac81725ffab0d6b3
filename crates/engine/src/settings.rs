// Search settings: which sheet, which column to match, which columns to show

use serde::{Deserialize, Serialize};

/// Header of the leading result column holding the sheet name.
pub const SHEET_COLUMN: &str = "Sheet";

/// A confirmed search configuration.
///
/// Values are produced by [`crate::selector::SettingsSelector::confirm`] and
/// replaced wholesale, never edited field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub sheet_name: String,
    pub search_column: String,
    pub additional_columns: Vec<String>,
}

impl SearchSettings {
    pub fn new(
        sheet_name: impl Into<String>,
        search_column: impl Into<String>,
        additional_columns: Vec<String>,
    ) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            search_column: search_column.into(),
            additional_columns,
        }
    }

    /// True until a selection has been confirmed.
    pub fn is_empty(&self) -> bool {
        self.sheet_name.is_empty() || self.search_column.is_empty()
    }

    /// Columns taken from the sheet for each match: the search column first,
    /// then the additional columns in their configured order.
    pub fn selected_columns(&self) -> Vec<&str> {
        std::iter::once(self.search_column.as_str())
            .chain(self.additional_columns.iter().map(String::as_str))
            .collect()
    }

    /// Fixed column order for rendering and export:
    /// `[Sheet, search column, additional columns...]`.
    pub fn display_columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.additional_columns.len() + 2);
        columns.push(SHEET_COLUMN.to_string());
        columns.push(self.search_column.clone());
        columns.extend(self.additional_columns.iter().cloned());
        columns
    }
}
