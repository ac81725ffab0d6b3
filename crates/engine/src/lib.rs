// Search engine: sheet tables, settings selection, row filtering, result sets.
// Pure data and rules; reading and writing files lives in sheetfind-io.

pub mod cell;
pub mod filter;
pub mod results;
pub mod selector;
pub mod settings;
pub mod sheet;
pub mod workbook;

pub use cell::CellValue;
pub use filter::{SearchError, SearchResultRow};
pub use results::{Presentation, ResultSet, SortOrder};
pub use selector::{SettingsSelector, ValidationError};
pub use settings::SearchSettings;
pub use sheet::Sheet;
pub use workbook::SheetCatalog;
