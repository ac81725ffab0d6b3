//! Settings selection: sheet → search column → additional columns.
//!
//! Each field's valid options depend on the field before it. The rules live
//! in [`evaluate`], a pure function from a catalog and a partial selection to
//! the options and problems of that selection. [`SettingsSelector`] keeps a
//! selection between edits and applies the same rules on every change.

use thiserror::Error;

use crate::settings::SearchSettings;
use crate::workbook::SheetCatalog;

/// Offered as the only (unusable) search column when a single-sheet file has
/// no columns at all.
pub const NO_COLUMNS_PLACEHOLDER: &str = "No columns available";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Sheet Name and Search Column are required.")]
    Incomplete,

    #[error("sheet '{0}' not found")]
    UnknownSheet(String),

    #[error("column '{column}' not found in sheet '{sheet}'")]
    UnknownColumn { sheet: String, column: String },

    #[error("column '{0}' is not an eligible additional column")]
    IneligibleColumn(String),
}

/// A selection that may still be incomplete or invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub sheet_name: String,
    pub search_column: String,
    pub additional_columns: Vec<String>,
}

/// Options for the search-column field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnChoice {
    /// The sheet's columns, in header order.
    Columns(Vec<String>),
    /// No sheet chosen, or the sheet has no columns.
    Disabled,
    /// The file's only sheet has no columns; [`NO_COLUMNS_PLACEHOLDER`] is
    /// shown but cannot be confirmed.
    Placeholder,
}

impl ColumnChoice {
    pub fn columns(&self) -> &[String] {
        match self {
            ColumnChoice::Columns(columns) => columns,
            _ => &[],
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, ColumnChoice::Columns(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionView {
    pub sheets: Vec<String>,
    pub search_columns: ColumnChoice,
    pub eligible_additional: Vec<String>,
    pub errors: Vec<ValidationError>,
}

impl SelectionView {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Compute the options and validation problems of `selection` against
/// `catalog`. Problems are listed with `Incomplete` first when present.
pub fn evaluate(catalog: &SheetCatalog, selection: &Selection) -> SelectionView {
    let sheets: Vec<String> = catalog.sheet_names().into_iter().map(String::from).collect();
    let mut errors = Vec::new();

    let sheet = if selection.sheet_name.is_empty() {
        None
    } else {
        let sheet = catalog.sheet(&selection.sheet_name);
        if sheet.is_none() {
            errors.push(ValidationError::UnknownSheet(selection.sheet_name.clone()));
        }
        sheet
    };
    let columns: Vec<String> = sheet.map(|s| s.columns.clone()).unwrap_or_default();

    let search_columns = if !columns.is_empty() {
        ColumnChoice::Columns(columns.clone())
    } else if catalog.len() == 1 {
        ColumnChoice::Placeholder
    } else {
        ColumnChoice::Disabled
    };

    let search_column = selection.search_column.as_str();
    if !search_column.is_empty()
        && search_column != NO_COLUMNS_PLACEHOLDER
        && sheet.is_some()
        && !columns.iter().any(|c| c == search_column)
    {
        errors.push(ValidationError::UnknownColumn {
            sheet: selection.sheet_name.clone(),
            column: search_column.to_string(),
        });
    }

    let eligible_additional: Vec<String> = columns
        .iter()
        .filter(|c| c.as_str() != search_column)
        .cloned()
        .collect();

    for column in &selection.additional_columns {
        if !eligible_additional.contains(column) {
            errors.push(ValidationError::IneligibleColumn(column.clone()));
        }
    }

    if selection.sheet_name.is_empty() || !is_usable_column(search_column) {
        errors.insert(0, ValidationError::Incomplete);
    }

    SelectionView {
        sheets,
        search_columns,
        eligible_additional,
        errors,
    }
}

fn is_usable_column(column: &str) -> bool {
    !column.is_empty() && column != NO_COLUMNS_PLACEHOLDER
}

/// Stateful front for [`evaluate`], mirroring a dependent-fields form.
#[derive(Debug, Clone)]
pub struct SettingsSelector<'a> {
    catalog: &'a SheetCatalog,
    selection: Selection,
}

impl<'a> SettingsSelector<'a> {
    /// Start a selection with the first sheet (and its first column)
    /// preselected, the way a freshly populated drop-down would be.
    pub fn new(catalog: &'a SheetCatalog) -> Self {
        let mut selector = Self {
            catalog,
            selection: Selection::default(),
        };
        if let Some(first) = catalog.sheets().first() {
            selector.set_sheet(first.name.clone());
        }
        selector
    }

    /// Start from previously confirmed settings, keeping each field only
    /// while it is still valid for this catalog.
    pub fn with_settings(catalog: &'a SheetCatalog, prior: &SearchSettings) -> Self {
        let mut selector = Self::new(catalog);
        if selector.select_sheet(&prior.sheet_name).is_err() {
            return selector;
        }
        if selector.select_search_column(&prior.search_column).is_err() {
            return selector;
        }
        let eligible = selector.view().eligible_additional;
        let kept: Vec<String> = prior
            .additional_columns
            .iter()
            .filter(|c| eligible.contains(c))
            .cloned()
            .collect();
        selector.selection.additional_columns = order_like(&eligible, &kept);
        selector
    }

    /// Resume editing a selection kept from an earlier selector over the
    /// same catalog.
    pub fn from_selection(catalog: &'a SheetCatalog, selection: Selection) -> Self {
        Self { catalog, selection }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn view(&self) -> SelectionView {
        evaluate(self.catalog, &self.selection)
    }

    /// Choose a sheet. Resets the search column to the sheet's first column
    /// and clears the additional columns.
    pub fn select_sheet(&mut self, name: &str) -> Result<SelectionView, ValidationError> {
        if !self.catalog.contains(name) {
            return Err(ValidationError::UnknownSheet(name.to_string()));
        }
        self.set_sheet(name.to_string());
        Ok(self.view())
    }

    /// Choose the search column. Additional columns that are no longer
    /// eligible are dropped.
    pub fn select_search_column(&mut self, name: &str) -> Result<SelectionView, ValidationError> {
        let has_column = self
            .catalog
            .sheet(&self.selection.sheet_name)
            .map(|s| s.has_column(name))
            .unwrap_or(false);
        if !has_column {
            return Err(ValidationError::UnknownColumn {
                sheet: self.selection.sheet_name.clone(),
                column: name.to_string(),
            });
        }
        self.selection.search_column = name.to_string();
        self.selection.additional_columns.retain(|c| c != name);
        Ok(self.view())
    }

    /// Replace the additional columns. Every name must be eligible; the
    /// stored order follows the sheet's column order.
    pub fn set_additional(&mut self, names: &[String]) -> Result<SelectionView, ValidationError> {
        let eligible = self.view().eligible_additional;
        if let Some(bad) = names.iter().find(|n| !eligible.contains(n)) {
            return Err(ValidationError::IneligibleColumn(bad.clone()));
        }
        self.selection.additional_columns = order_like(&eligible, names);
        Ok(self.view())
    }

    /// Check or uncheck one additional column.
    pub fn toggle_additional(&mut self, name: &str, on: bool) -> Result<SelectionView, ValidationError> {
        let mut names = self.selection.additional_columns.clone();
        names.retain(|c| c != name);
        if on {
            names.push(name.to_string());
        } else if !self.view().eligible_additional.iter().any(|c| c == name) {
            return Err(ValidationError::IneligibleColumn(name.to_string()));
        }
        self.set_additional(&names)
    }

    /// Validate and produce new settings. On error nothing is produced and
    /// whatever settings the caller already holds stay in effect.
    pub fn confirm(&self) -> Result<SearchSettings, ValidationError> {
        let view = self.view();
        if let Some(err) = view.errors.into_iter().next() {
            return Err(err);
        }
        Ok(SearchSettings {
            sheet_name: self.selection.sheet_name.clone(),
            search_column: self.selection.search_column.clone(),
            additional_columns: self.selection.additional_columns.clone(),
        })
    }

    fn set_sheet(&mut self, name: String) {
        let first_column = self
            .catalog
            .sheet(&name)
            .and_then(|s| s.columns.first().cloned());
        self.selection = Selection {
            sheet_name: name,
            search_column: match first_column {
                Some(column) => column,
                None if self.catalog.len() == 1 => NO_COLUMNS_PLACEHOLDER.to_string(),
                None => String::new(),
            },
            additional_columns: Vec::new(),
        };
    }
}

/// `names` deduplicated and arranged in the order they appear in `order`.
fn order_like(order: &[String], names: &[String]) -> Vec<String> {
    order.iter().filter(|c| names.contains(c)).cloned().collect()
}
