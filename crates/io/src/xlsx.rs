// Excel file import (xlsx, xlsm, xlsb, xls, ods) and result export (xlsx only)
//
// Import: every sheet becomes a header row plus typed data rows.
// Export: one sheet, header row = display columns, one row per unique result.

use std::path::{Path, PathBuf};
use std::time::Instant;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use sheetfind_engine::cell::CellValue;
use sheetfind_engine::results::ResultSet;
use sheetfind_engine::sheet::{Row, Sheet};
use sheetfind_engine::workbook::SheetCatalog;

use crate::error::{ExportError, LoadError};

/// Number format applied to exported datetime cells
const DATETIME_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Extension given to export paths that have none
const EXPORT_EXTENSION: &str = "xlsx";

type FileWorkbook = Sheets<std::io::BufReader<std::fs::File>>;

fn open(path: &Path) -> Result<FileWorkbook, LoadError> {
    open_workbook_auto(path).map_err(|source| LoadError::Open {
        path: path.display().to_string(),
        source,
    })
}

fn read_sheet(workbook: &mut FileWorkbook, path: &Path, name: &str) -> Result<Sheet, LoadError> {
    let range = workbook.worksheet_range(name).map_err(|source| LoadError::Read {
        path: path.display().to_string(),
        sheet: name.to_string(),
        source,
    })?;
    Ok(sheet_from_range(name, &range))
}

/// Load every sheet of a spreadsheet file.
///
/// All-or-nothing: any unreadable sheet fails the whole load, so a caller
/// holding an older catalog keeps it intact.
pub fn load_catalog(path: &Path) -> Result<SheetCatalog, LoadError> {
    let start_time = Instant::now();
    let mut workbook = open(path)?;

    let sheet_names = workbook.sheet_names();
    if sheet_names.is_empty() {
        return Err(LoadError::NoSheets {
            path: path.display().to_string(),
        });
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for name in &sheet_names {
        sheets.push(read_sheet(&mut workbook, path, name)?);
    }

    log::info!(
        "loaded {} sheet(s) from {} in {} ms",
        sheets.len(),
        path.display(),
        start_time.elapsed().as_millis()
    );
    Ok(SheetCatalog::new(sheets))
}

/// Sheet names in workbook order, without reading sheet contents.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, LoadError> {
    Ok(open(path)?.sheet_names())
}

/// Load a single sheet by name.
pub fn load_sheet(path: &Path, name: &str) -> Result<Sheet, LoadError> {
    let mut workbook = open(path)?;
    if !workbook.sheet_names().iter().any(|s| s == name) {
        return Err(LoadError::SheetNotFound {
            path: path.display().to_string(),
            sheet: name.to_string(),
        });
    }
    let sheet = read_sheet(&mut workbook, path, name)?;
    log::debug!("loaded sheet '{}' ({} rows)", name, sheet.row_count());
    Ok(sheet)
}

/// Convert a calamine range into a sheet. The range's first row is the header.
fn sheet_from_range(name: &str, range: &Range<Data>) -> Sheet {
    let (height, width) = range.get_size();
    if height == 0 || width == 0 {
        return Sheet::new(name, Vec::new());
    }

    let grid: Vec<Row> = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();
    Sheet::from_grid(name, grid)
}

fn convert_cell(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) => CellValue::from_text(s.as_str()),
        Data::Float(n) => Some(CellValue::number(*n)),
        Data::Int(n) => Some(CellValue::number(*n as f64)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => Some(CellValue::DateTime(value)),
            None => Some(CellValue::number(dt.as_f64())),
        },
        Data::DateTimeIso(s) => match chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            Ok(value) => Some(CellValue::DateTime(value)),
            Err(_) => CellValue::from_text(s.as_str()),
        },
        Data::DurationIso(s) => CellValue::from_text(s.as_str()),
        Data::Error(e) => Some(CellValue::Error(e.to_string())),
    }
}

/// Result of an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Path actually written (extension added when missing)
    pub path: PathBuf,
    /// Data rows written, excluding the header
    pub rows_written: usize,
    /// Exact-duplicate rows left out
    pub duplicates_removed: usize,
}

impl ExportSummary {
    pub fn summary(&self) -> String {
        let mut text = format!(
            "{} row{} exported to {}",
            self.rows_written,
            if self.rows_written == 1 { "" } else { "s" },
            self.path.display()
        );
        if self.duplicates_removed > 0 {
            text.push_str(&format!(" ({} duplicate{} removed)",
                self.duplicates_removed,
                if self.duplicates_removed == 1 { "" } else { "s" }));
        }
        text
    }
}

/// `path`, with `.xlsx` appended when it has no extension.
pub fn export_path(path: &Path) -> PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().is_none() {
        path.set_extension(EXPORT_EXTENSION);
    }
    path
}

/// Export a result set to XLSX.
///
/// Duplicate rows are dropped. An empty result set is refused before the
/// destination is touched.
pub fn export_results(results: &ResultSet, path: &Path) -> Result<ExportSummary, ExportError> {
    if results.is_empty() {
        return Err(ExportError::NoResults);
    }

    let path = export_path(path);
    let write_err = |source: XlsxError| ExportError::Write {
        path: path.display().to_string(),
        source,
    };

    let (rows, duplicates_removed) = results.deduplicated();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let header_format = Format::new().set_bold();
    for (col, name) in results.columns().iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, name, &header_format)
            .map_err(write_err)?;
    }

    let datetime_format = Format::new().set_num_format(DATETIME_NUM_FORMAT);
    for (idx, row) in rows.iter().enumerate() {
        let row32 = (idx + 1) as u32;
        for (col, cell) in row.cells().iter().enumerate() {
            if let Some(value) = cell {
                write_cell(worksheet, row32, col as u16, value, &datetime_format).map_err(write_err)?;
            }
        }
    }

    workbook.save(&path).map_err(write_err)?;

    let summary = ExportSummary {
        path,
        rows_written: rows.len(),
        duplicates_removed,
    };
    log::info!("{}", summary.summary());
    Ok(summary)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    datetime_format: &Format,
) -> Result<(), XlsxError> {
    match value {
        CellValue::Text(s) | CellValue::Error(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellValue::Number(n) => {
            worksheet.write_number(row, col, n.into_inner())?;
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellValue::DateTime(dt) => {
            worksheet.write_datetime_with_format(row, col, dt, datetime_format)?;
        }
    }
    Ok(())
}
