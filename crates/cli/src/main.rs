// sheetfind CLI - search spreadsheet sheets by column, export the matches

mod exit_codes;
mod logging;

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use sheetfind_cli::shell::{describe_settings, describe_view, parse_column_list, Shell};
use sheetfind_cli::table;
use sheetfind_cli::worker::{ConcurrencyError, SearchWorker};
use sheetfind_config::Settings;
use sheetfind_engine::cell::CellValue;
use sheetfind_engine::results::{ResultSet, ResultTable, SortOrder, UnknownColumn};
use sheetfind_engine::selector::{ColumnChoice, SettingsSelector, ValidationError};
use sheetfind_engine::settings::SearchSettings;
use sheetfind_engine::workbook::SheetCatalog;
use sheetfind_io::{export_results, load_catalog, sheet_names, ExportError, LoadError};

use exit_codes::{EXIT_BUSY, EXIT_ERROR, EXIT_EXPORT, EXIT_LOAD, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "sheetfind")]
#[command(about = "Search a spreadsheet column for a phrase and export the matching rows")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheets of a spreadsheet with their columns
    #[command(after_help = "\
Examples:
  sheetfind sheets stock.xlsx
  sheetfind sheets stock.xlsx --json
  sheetfind sheets stock.xlsx --names")]
    Sheets {
        /// Spreadsheet file (.xlsx, .xlsm, .xlsb, .xls, .ods)
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Only list sheet names, one per line, without reading sheet contents
        #[arg(long)]
        names: bool,
    },

    /// Show which search and additional columns a selection offers
    #[command(after_help = "\
Examples:
  sheetfind columns stock.xlsx
  sheetfind columns stock.xlsx --sheet Inventory --column SKU")]
    Columns {
        /// Spreadsheet file
        file: PathBuf,

        /// Sheet to inspect (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Search column (default: the sheet's first column)
        #[arg(long)]
        column: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate and store the search settings used by `search`
    #[command(after_help = "\
Examples:
  sheetfind configure stock.xlsx --sheet Inventory --column SKU
  sheetfind configure stock.xlsx --sheet Inventory --column SKU --with Qty,Bin")]
    Configure {
        /// Spreadsheet file
        file: PathBuf,

        /// Sheet to search
        #[arg(long)]
        sheet: String,

        /// Column matched against the phrase
        #[arg(long)]
        column: String,

        /// Additional columns to show. Repeatable; comma-separated accepted.
        #[arg(long = "with", value_name = "COLS")]
        with: Vec<String>,
    },

    /// Search for a phrase (case-insensitive regex) in the configured column
    #[command(after_help = "\
Examples:
  sheetfind search ab12
  sheetfind search '^AB' --file stock.xlsx --sheet Inventory --column SKU --with Qty
  sheetfind search ab --sort Qty --desc
  sheetfind search ab --export matches.xlsx
  sheetfind search ab --json

Settings not given on the command line come from `sheetfind configure`.
A search that cannot be carried out reports no results.")]
    Search {
        /// Phrase to look for; regex syntax, matched case-insensitively
        phrase: String,

        /// Spreadsheet file (default: the configured file)
        #[arg(long, short = 'f', env = "SHEETFIND_FILE")]
        file: Option<PathBuf>,

        /// Sheet to search (default: configured sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Search column (default: configured column)
        #[arg(long)]
        column: Option<String>,

        /// Additional columns. Repeatable; comma-separated accepted.
        #[arg(long = "with", value_name = "COLS")]
        with: Vec<String>,

        /// Sort results by this column
        #[arg(long, value_name = "COL")]
        sort: Option<String>,

        /// Sort descending (with --sort)
        #[arg(long, requires = "sort")]
        desc: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Also write the results to an .xlsx file
        #[arg(long, short = 'o', value_name = "FILE")]
        export: Option<PathBuf>,
    },

    /// Interactive session: pick settings, search in the background, export
    Shell {
        /// Spreadsheet to open (default: the configured file)
        file: Option<PathBuf>,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  sheetfind-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  sheetfind-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (settings, config_problem) = match Settings::try_load() {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };
    logging::init(settings.log_filter.as_deref());
    if let Some(e) = config_problem {
        log::warn!("{}; using default settings", e);
    }

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: sheetfind <command> [options]");
            eprintln!("       sheetfind --help for more information");
            Ok(())
        }
        Some(Commands::Sheets { file, json, names }) => {
            if names {
                cmd_sheet_names(&file, json)
            } else {
                cmd_sheets(&file, json, settings.max_column_width)
            }
        }
        Some(Commands::Columns { file, sheet, column, json }) => cmd_columns(&file, sheet, column, json),
        Some(Commands::Configure { file, sheet, column, with }) => {
            cmd_configure(settings, &file, &sheet, &column, &with)
        }
        Some(Commands::Search { phrase, file, sheet, column, with, sort, desc, json, export }) => {
            let order = if desc { SortOrder::Descending } else { SortOrder::Ascending };
            cmd_search(&settings, phrase, file, sheet, column, &with, sort.map(|c| (c, order)), json, export)
        }
        Some(Commands::Shell { file }) => cmd_shell(settings, file),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn load(msg: impl Into<String>) -> Self {
        Self { code: EXIT_LOAD, message: msg.into(), hint: None }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self { code: EXIT_EXPORT, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<LoadError> for CliError {
    fn from(err: LoadError) -> Self {
        let hint = match &err {
            LoadError::Open { .. } => Some("supported formats: .xlsx, .xlsm, .xlsb, .xls, .ods"),
            _ => None,
        };
        let cli = CliError::load(err.to_string());
        match hint {
            Some(hint) => cli.with_hint(hint),
            None => cli,
        }
    }
}

impl From<ExportError> for CliError {
    fn from(err: ExportError) -> Self {
        CliError::export(err.to_string())
    }
}

impl From<ConcurrencyError> for CliError {
    fn from(err: ConcurrencyError) -> Self {
        Self { code: EXIT_BUSY, message: err.to_string(), hint: None }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::io(err.to_string())
    }
}

/// Validation error with a hint listing the valid choices.
fn validation_error(err: ValidationError, catalog: &SheetCatalog, sheet: &str) -> CliError {
    let hint = match &err {
        ValidationError::UnknownSheet(_) => Some(format!("sheets: {}", catalog.sheet_names().join(", "))),
        ValidationError::UnknownColumn { .. } | ValidationError::IneligibleColumn(_) => catalog
            .sheet(sheet)
            .map(|s| format!("columns in '{}': {}", s.name, s.columns.join(", "))),
        ValidationError::Incomplete => None,
    };
    let cli = CliError::args(err.to_string());
    match hint {
        Some(hint) => cli.with_hint(hint),
        None => cli,
    }
}

/// Apply command-line overrides on top of `base` through the selector, so
/// the result obeys the same rules as an interactive selection.
fn select_settings(
    catalog: &SheetCatalog,
    base: &SearchSettings,
    sheet: Option<&str>,
    column: Option<&str>,
    with: &[String],
) -> Result<SearchSettings, CliError> {
    let mut selector = SettingsSelector::with_settings(catalog, base);

    if let Some(sheet) = sheet {
        selector
            .select_sheet(sheet)
            .map_err(|e| validation_error(e, catalog, sheet))?;
    }
    let sheet = selector.selection().sheet_name.clone();
    if let Some(column) = column {
        selector
            .select_search_column(column)
            .map_err(|e| validation_error(e, catalog, &sheet))?;
    }
    let additional = parse_column_list(with);
    if !additional.is_empty() {
        selector
            .set_additional(&additional)
            .map_err(|e| validation_error(e, catalog, &sheet))?;
    }

    selector.confirm().map_err(|e| validation_error(e, catalog, &sheet))
}

fn write_stdout(text: &str) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(text.as_bytes())?;
    handle.flush()?;
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::io(e.to_string()))?;
    write_stdout(&format!("{}\n", text))
}

/// Typed JSON for one cell; text forms for datetimes and errors.
fn cell_json(value: Option<&CellValue>) -> serde_json::Value {
    match value {
        None => serde_json::Value::Null,
        Some(CellValue::Bool(b)) => json!(b),
        Some(CellValue::Number(n)) => {
            let n = n.into_inner();
            if n.fract() == 0.0 && n.abs() < 9.0e15 {
                json!(n as i64)
            } else {
                json!(n)
            }
        }
        Some(other) => json!(other.to_string()),
    }
}

// ============================================================================
// sheets
// ============================================================================

fn cmd_sheet_names(file: &Path, json: bool) -> Result<(), CliError> {
    let names = sheet_names(file)?;
    if json {
        return print_json(&json!({ "file": file.display().to_string(), "sheets": names }));
    }
    let mut text = String::new();
    for name in &names {
        text.push_str(name);
        text.push('\n');
    }
    write_stdout(&text)
}

fn cmd_sheets(file: &Path, json: bool, max_column_width: usize) -> Result<(), CliError> {
    let catalog = load_catalog(file)?;

    if json {
        let sheets: Vec<serde_json::Value> = catalog
            .sheets()
            .iter()
            .map(|s| json!({ "name": s.name, "columns": s.columns, "rows": s.row_count() }))
            .collect();
        return print_json(&json!({ "file": file.display().to_string(), "sheets": sheets }));
    }

    let rows = catalog
        .sheets()
        .iter()
        .map(|s| vec![s.name.clone(), s.row_count().to_string(), s.columns.join(", ")])
        .collect();
    let grid = ResultTable {
        headers: vec!["Sheet".into(), "Rows".into(), "Columns".into()],
        rows,
    };
    write_stdout(&table::render_table(&grid, max_column_width))
}

// ============================================================================
// columns
// ============================================================================

fn cmd_columns(
    file: &Path,
    sheet: Option<String>,
    column: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let catalog = load_catalog(file)?;
    let mut selector = SettingsSelector::new(&catalog);

    if let Some(sheet) = &sheet {
        selector
            .select_sheet(sheet)
            .map_err(|e| validation_error(e, &catalog, sheet))?;
    }
    if let Some(column) = &column {
        let sheet = selector.selection().sheet_name.clone();
        selector
            .select_search_column(column)
            .map_err(|e| validation_error(e, &catalog, &sheet))?;
    }

    let view = selector.view();
    if json {
        let search_columns = match &view.search_columns {
            ColumnChoice::Columns(columns) => json!({ "state": "enabled", "columns": columns }),
            ColumnChoice::Disabled => json!({ "state": "disabled", "columns": [] }),
            ColumnChoice::Placeholder => json!({ "state": "placeholder", "columns": [] }),
        };
        let errors: Vec<String> = view.errors.iter().map(|e| e.to_string()).collect();
        return print_json(&json!({
            "sheets": view.sheets,
            "sheet": selector.selection().sheet_name,
            "search_column": selector.selection().search_column,
            "search_columns": search_columns,
            "eligible_additional": view.eligible_additional,
            "valid": view.is_valid(),
            "errors": errors,
        }));
    }

    write_stdout(&describe_view(selector.selection(), &view))
}

// ============================================================================
// configure
// ============================================================================

fn cmd_configure(
    mut prefs: Settings,
    file: &Path,
    sheet: &str,
    column: &str,
    with: &[String],
) -> Result<(), CliError> {
    let catalog = load_catalog(file)?;
    let confirmed = select_settings(
        &catalog,
        &SearchSettings::default(),
        Some(sheet),
        Some(column),
        with,
    )?;

    let file = std::fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
    prefs.remember(&file, confirmed.clone());
    prefs.save().map_err(|e| {
        CliError::io(e.to_string()).with_hint(format!("settings file: {}", Settings::config_path_display()))
    })?;

    write_stdout(&format!(
        "Saved settings for {}: {}\n",
        file.display(),
        describe_settings(&confirmed)
    ))
}

// ============================================================================
// search
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn cmd_search(
    prefs: &Settings,
    phrase: String,
    file: Option<PathBuf>,
    sheet: Option<String>,
    column: Option<String>,
    with: &[String],
    sort: Option<(String, SortOrder)>,
    json: bool,
    export: Option<PathBuf>,
) -> Result<(), CliError> {
    let file = file.or_else(|| prefs.last_file.clone()).ok_or_else(|| {
        CliError::args("No Excel file selected.")
            .with_hint("pass --file, or run `sheetfind configure <FILE> ...` first")
    })?;
    if phrase.is_empty() {
        return Err(CliError::args("Please enter a search phrase."));
    }

    let overridden = sheet.is_some() || column.is_some() || !with.is_empty();
    let settings = if overridden {
        let catalog = load_catalog(&file)?;
        select_settings(&catalog, &prefs.search, sheet.as_deref(), column.as_deref(), with)?
    } else if prefs.search.is_empty() {
        return Err(CliError::args(ValidationError::Incomplete.to_string())
            .with_hint("pass --sheet and --column, or run `sheetfind configure` first"));
    } else {
        prefs.search.clone()
    };

    let mut worker = SearchWorker::new();
    worker.start(file, settings, phrase)?;
    let completion = worker
        .wait()
        .ok_or_else(|| CliError::io("search ended without a result"))?;

    let mut results = ResultSet::new(&completion.settings, completion.outcome.rows);
    if let Some((column, order)) = sort {
        if !results.is_empty() {
            results
                .sort_by(&column, order)
                .map_err(|UnknownColumn(c)| {
                    CliError::args(format!("unknown column in --sort: \"{}\"", c))
                        .with_hint(format!("available columns: {}", results_columns(&completion.settings)))
                })?;
        }
    }

    if json {
        print_json(&results_json(&results))?;
    } else {
        write_stdout(&table::render(&results.presentation(), prefs.max_column_width))?;
    }

    if let Some(path) = export {
        let summary = export_results(&results, &path)?;
        eprintln!("{}", summary.summary());
    }
    Ok(())
}

fn results_columns(settings: &SearchSettings) -> String {
    settings.display_columns().join(", ")
}

fn results_json(results: &ResultSet) -> serde_json::Value {
    let rows: Vec<Vec<serde_json::Value>> = results
        .rows()
        .iter()
        .map(|row| row.cells().iter().map(|c| cell_json(c.as_ref())).collect())
        .collect();
    json!({
        "columns": results.columns(),
        "count": rows.len(),
        "rows": rows,
    })
}

// ============================================================================
// shell
// ============================================================================

fn cmd_shell(prefs: Settings, file: Option<PathBuf>) -> Result<(), CliError> {
    let file = file.or_else(|| prefs.last_file.clone().filter(|f| f.exists()));
    let interactive = io::stdin().is_terminal();
    let mut shell = Shell::new(prefs, Settings::config_path()).with_prompt(interactive);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if interactive {
        writeln!(out, "sheetfind {} - type 'help' for commands", env!("CARGO_PKG_VERSION"))?;
    }
    if let Some(file) = file {
        shell.open(&file, &mut out)?;
    }

    let stdin = io::stdin();
    shell.run(stdin.lock(), &mut out)?;
    Ok(())
}
