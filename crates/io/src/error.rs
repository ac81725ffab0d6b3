use sheetfind_engine::SearchError;
use thiserror::Error;

/// Failure to read a spreadsheet file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to open spreadsheet '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: calamine::Error,
    },

    #[error("Failed to read sheet '{sheet}' in '{path}': {source}")]
    Read {
        path: String,
        sheet: String,
        #[source]
        source: calamine::Error,
    },

    #[error("Spreadsheet '{path}' contains no sheets")]
    NoSheets { path: String },

    #[error("Sheet '{sheet}' not found in '{path}'")]
    SheetNotFound { path: String, sheet: String },
}

/// Failure to export a result set.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No search results to export.")]
    NoResults,

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
}

impl From<LoadError> for SearchError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::SheetNotFound { sheet, .. } => SearchError::SheetNotFound(sheet),
            other => SearchError::Source(other.to_string()),
        }
    }
}
