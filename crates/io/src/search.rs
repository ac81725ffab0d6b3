// Search a sheet straight from a file.
//
// This is the body of a background search: open the file, check the sheet
// is still there, load it, filter it. Failures never propagate; they turn
// into an empty outcome that keeps the cause for logging.

use std::path::Path;
use std::time::Instant;

use sheetfind_engine::filter::{filter_sheet, PhraseMatcher, SearchError, SearchResultRow};
use sheetfind_engine::settings::SearchSettings;

use crate::xlsx;

/// What a finished search reports.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    /// Matching rows; empty when nothing matched or the search failed
    pub rows: Vec<SearchResultRow>,
    /// Why the search failed, if it did. Display treats it as "no results".
    pub error: Option<SearchError>,
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Run a search, folding any failure into an empty outcome.
pub fn search_file(path: &Path, settings: &SearchSettings, phrase: &str) -> SearchOutcome {
    let start_time = Instant::now();
    match try_search_file(path, settings, phrase) {
        Ok(rows) => {
            log::info!(
                "search {:?} in '{}'/'{}': {} match(es) in {} ms",
                phrase,
                settings.sheet_name,
                settings.search_column,
                rows.len(),
                start_time.elapsed().as_millis()
            );
            SearchOutcome { rows, error: None }
        }
        Err(err) => {
            log::warn!("search {:?} in {} failed: {}", phrase, path.display(), err);
            SearchOutcome {
                rows: Vec::new(),
                error: Some(err),
            }
        }
    }
}

/// Run a search, returning failures as errors.
pub fn try_search_file(
    path: &Path,
    settings: &SearchSettings,
    phrase: &str,
) -> Result<Vec<SearchResultRow>, SearchError> {
    let matcher = PhraseMatcher::new(phrase)?;
    let sheet = xlsx::load_sheet(path, &settings.sheet_name)?;
    filter_sheet(&sheet, settings, &matcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use sheetfind_engine::cell::CellValue;

    fn inventory(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet().set_name("Inventory").unwrap();
        sheet.write_string(0, 0, "SKU").unwrap();
        sheet.write_string(0, 1, "Qty").unwrap();
        sheet.write_string(1, 0, "AB12").unwrap();
        sheet.write_number(1, 1, 5.0).unwrap();
        sheet.write_string(2, 0, "cd99").unwrap();
        sheet.write_number(2, 1, 2.0).unwrap();
        workbook.save(path).unwrap();
    }

    fn settings() -> SearchSettings {
        SearchSettings::new("Inventory", "SKU", vec!["Qty".into()])
    }

    #[test]
    fn finds_matching_rows_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inv.xlsx");
        inventory(&path);

        let outcome = search_file(&path, &settings(), "ab");
        assert!(outcome.error.is_none());
        assert_eq!(
            outcome.rows,
            vec![SearchResultRow {
                sheet: "Inventory".into(),
                values: vec![Some(CellValue::text("AB12")), Some(CellValue::number(5.0))],
            }]
        );
    }

    #[test]
    fn missing_sheet_is_an_empty_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inv.xlsx");
        inventory(&path);

        let outcome = search_file(&path, &SearchSettings::new("Gone", "SKU", vec![]), "ab");
        assert!(outcome.is_empty());
        assert!(matches!(outcome.error, Some(SearchError::SheetNotFound(ref s)) if s == "Gone"));
    }

    #[test]
    fn failures_are_folded_into_empty_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inv.xlsx");
        inventory(&path);

        let bad_pattern = search_file(&path, &settings(), "[");
        assert!(bad_pattern.is_empty());
        assert!(matches!(bad_pattern.error, Some(SearchError::InvalidPattern(_))));

        let bad_column = search_file(&path, &SearchSettings::new("Inventory", "Price", vec![]), "ab");
        assert!(bad_column.is_empty());
        assert!(matches!(bad_column.error, Some(SearchError::MissingColumn { .. })));

        let no_file = search_file(&dir.path().join("gone.xlsx"), &settings(), "ab");
        assert!(no_file.is_empty());
        assert!(matches!(no_file.error, Some(SearchError::Source(_))));
    }

    #[test]
    fn no_matches_has_no_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inv.xlsx");
        inventory(&path);

        let outcome = search_file(&path, &settings(), "zz");
        assert!(outcome.is_empty());
        assert!(outcome.error.is_none());
    }
}
