// File I/O operations: spreadsheet catalogs, file search, result export

pub mod error;
pub mod search;
pub mod xlsx;

pub use error::{ExportError, LoadError};
pub use search::{search_file, SearchOutcome};
pub use xlsx::{export_results, load_catalog, load_sheet, sheet_names, ExportSummary};
