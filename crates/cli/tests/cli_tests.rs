// Integration tests for the `sheetfind` binary.
// Run with: cargo test -p sheetfind-cli --test cli_tests -- --nocapture
//
// Every test gets its own settings file through SHEETFIND_CONFIG, and builds
// its spreadsheet fixtures with rust_xlsxwriter.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use rust_xlsxwriter::Workbook;
use sheetfind_engine::cell::CellValue;
use tempfile::TempDir;

struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self) -> PathBuf {
        self.path("config").join("settings.json")
    }

    fn sheetfind(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_sheetfind"));
        cmd.current_dir(self.dir.path());
        cmd.env("SHEETFIND_CONFIG", self.config());
        cmd.env_remove("RUST_LOG");
        cmd.env_remove("SHEETFIND_FILE");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.sheetfind().args(args).output().unwrap()
    }

    /// Inventory (SKU, Qty, Bin) with a repeated row, plus an Orders sheet.
    fn inventory(&self) -> PathBuf {
        let path = self.path("stock.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet().set_name("Inventory").unwrap();
        for (col, name) in ["SKU", "Qty", "Bin"].iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        let rows: [(&str, f64, &str); 4] = [
            ("AB12", 5.0, "A1"),
            ("cd99", 2.0, "B4"),
            ("ab77", 9.0, "C2"),
            ("AB12", 5.0, "A1"),
        ];
        for (i, (sku, qty, bin)) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            sheet.write_string(r, 0, *sku).unwrap();
            sheet.write_number(r, 1, *qty).unwrap();
            sheet.write_string(r, 2, *bin).unwrap();
        }
        let orders = workbook.add_worksheet().set_name("Orders").unwrap();
        orders.write_string(0, 0, "Order").unwrap();
        orders.write_string(0, 1, "SKU").unwrap();
        orders.write_string(1, 0, "O-1").unwrap();
        orders.write_string(1, 1, "AB12").unwrap();
        workbook.save(&path).unwrap();
        path
    }

    fn configure(&self, book: &Path, with: &str) {
        let out = self.run(&[
            "configure",
            book.to_str().unwrap(),
            "--sheet",
            "Inventory",
            "--column",
            "SKU",
            "--with",
            with,
        ]);
        assert!(out.status.success(), "configure failed: {}", stderr(&out));
    }
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

fn json(out: &Output) -> serde_json::Value {
    serde_json::from_str(stdout(out).trim())
        .unwrap_or_else(|e| panic!("stdout must be JSON: {}\n{}", e, stdout(out)))
}

// ===========================================================================
// sheets / columns
// ===========================================================================

#[test]
fn sheets_json_lists_columns_and_rows() {
    let env = Env::new();
    let book = env.inventory();
    let out = env.run(&["sheets", book.to_str().unwrap(), "--json"]);
    assert!(out.status.success());

    let val = json(&out);
    let sheets = val["sheets"].as_array().unwrap();
    assert_eq!(sheets.len(), 2);
    assert_eq!(sheets[0]["name"], "Inventory");
    assert_eq!(sheets[0]["columns"], serde_json::json!(["SKU", "Qty", "Bin"]));
    assert_eq!(sheets[0]["rows"], 4);
    assert_eq!(sheets[1]["name"], "Orders");
}

#[test]
fn sheets_names_lists_only_names() {
    let env = Env::new();
    let book = env.inventory();
    let out = env.run(&["sheets", book.to_str().unwrap(), "--names"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout(&out), "Inventory\nOrders\n");

    let out = env.run(&["sheets", book.to_str().unwrap(), "--names", "--json"]);
    assert_eq!(json(&out)["sheets"], serde_json::json!(["Inventory", "Orders"]));
}

#[test]
fn sheets_on_non_spreadsheet_is_load_error() {
    let env = Env::new();
    let bogus = env.path("notes.txt");
    std::fs::write(&bogus, "just text").unwrap();
    let out = env.run(&["sheets", bogus.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("error:"));
}

#[test]
fn columns_exclude_search_column_from_additional() {
    let env = Env::new();
    let book = env.inventory();
    let out = env.run(&["columns", book.to_str().unwrap(), "--column", "Qty", "--json"]);
    assert!(out.status.success(), "{}", stderr(&out));

    let val = json(&out);
    assert_eq!(val["sheet"], "Inventory");
    assert_eq!(val["search_columns"]["state"], "enabled");
    assert_eq!(val["eligible_additional"], serde_json::json!(["SKU", "Bin"]));
    assert_eq!(val["valid"], true);
}

#[test]
fn columns_of_blank_single_sheet_show_placeholder() {
    let env = Env::new();
    let path = env.path("blank.xlsx");
    let mut workbook = Workbook::new();
    workbook.add_worksheet().set_name("Only").unwrap();
    workbook.save(&path).unwrap();

    let out = env.run(&["columns", path.to_str().unwrap(), "--json"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let val = json(&out);
    assert_eq!(val["sheet"], "Only");
    assert_eq!(val["search_columns"]["state"], "placeholder");
    assert_eq!(val["valid"], false);
    assert_eq!(val["errors"][0], "Sheet Name and Search Column are required.");
}

// ===========================================================================
// configure
// ===========================================================================

#[test]
fn configure_stores_settings() {
    let env = Env::new();
    let book = env.inventory();
    env.configure(&book, "Bin,Qty");

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(env.config()).unwrap()).unwrap();
    let search = &stored["search.settings"];
    assert_eq!(search["sheet_name"], "Inventory");
    assert_eq!(search["search_column"], "SKU");
    // Kept in sheet order, not argument order
    assert_eq!(search["additional_columns"], serde_json::json!(["Qty", "Bin"]));
    assert!(stored["file.lastOpened"].as_str().unwrap().ends_with("stock.xlsx"));
}

#[test]
fn configure_unknown_column_is_usage_error() {
    let env = Env::new();
    let book = env.inventory();
    let out = env.run(&[
        "configure",
        book.to_str().unwrap(),
        "--sheet",
        "Inventory",
        "--column",
        "Price",
    ]);
    assert_eq!(out.status.code(), Some(2));
    let err = stderr(&out);
    assert!(err.contains("error: column 'Price' not found in sheet 'Inventory'"));
    assert!(err.contains("hint:  columns in 'Inventory': SKU, Qty, Bin"));
    assert!(!env.config().exists() || !std::fs::read_to_string(env.config()).unwrap().contains("Price"));
}

// ===========================================================================
// search
// ===========================================================================

#[test]
fn search_uses_configured_settings() {
    let env = Env::new();
    let book = env.inventory();
    env.configure(&book, "Qty");

    let out = env.run(&["search", "ab"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.starts_with("Sheet"));
    assert!(text.contains("AB12"));
    assert!(text.contains("ab77"));
    assert!(!text.contains("cd99"));
}

#[test]
fn search_json_is_typed_and_ordered() {
    let env = Env::new();
    let book = env.inventory();
    let out = env.run(&[
        "search",
        "^ab",
        "--file",
        book.to_str().unwrap(),
        "--sheet",
        "Inventory",
        "--column",
        "SKU",
        "--with",
        "Qty",
        "--sort",
        "Qty",
        "--desc",
        "--json",
    ]);
    assert!(out.status.success(), "{}", stderr(&out));

    let val = json(&out);
    assert_eq!(val["columns"], serde_json::json!(["Sheet", "SKU", "Qty"]));
    assert_eq!(val["count"], 3);
    assert_eq!(val["rows"][0], serde_json::json!(["Inventory", "ab77", 9]));
    assert_eq!(val["rows"][1], serde_json::json!(["Inventory", "AB12", 5]));
}

#[test]
fn search_without_settings_is_usage_error() {
    let env = Env::new();
    let book = env.inventory();
    let out = env.run(&["search", "ab", "--file", book.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("Sheet Name and Search Column are required."));
}

#[test]
fn search_without_file_is_usage_error() {
    let env = Env::new();
    let out = env.run(&["search", "ab"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("No Excel file selected."));
}

#[test]
fn failed_search_reports_no_results() {
    let env = Env::new();
    let book = env.inventory();
    env.configure(&book, "Qty");

    // Invalid pattern
    let out = env.run(&["search", "[unclosed"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "No matching results found.\n");

    // Configured file gone
    std::fs::remove_file(&book).unwrap();
    let out = env.run(&["search", "ab"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "No matching results found.\n");
}

#[test]
fn search_sort_on_unknown_column_is_usage_error() {
    let env = Env::new();
    let book = env.inventory();
    env.configure(&book, "Qty");
    let out = env.run(&["search", "ab", "--sort", "Price"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("hint:  available columns: Sheet, SKU, Qty"));
}

// ===========================================================================
// export
// ===========================================================================

#[test]
fn export_drops_duplicates_and_reloads() {
    let env = Env::new();
    let book = env.inventory();
    env.configure(&book, "Qty,Bin");

    let target = env.path("matches");
    let out = env.run(&["search", "ab12", "--export", target.to_str().unwrap()]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stderr(&out).contains("1 row exported to"));
    assert!(stderr(&out).contains("(1 duplicate removed)"));

    let written = env.path("matches.xlsx");
    let sheet = sheetfind_io::load_sheet(&written, "Sheet1").unwrap();
    assert_eq!(sheet.columns, vec!["Sheet", "SKU", "Qty", "Bin"]);
    assert_eq!(sheet.row_count(), 1);
    assert_eq!(sheet.value(0, 1), Some(&CellValue::text("AB12")));
    assert_eq!(sheet.value(0, 2), Some(&CellValue::number(5.0)));
}

#[test]
fn export_of_no_results_fails_without_writing() {
    let env = Env::new();
    let book = env.inventory();
    env.configure(&book, "");

    let target = env.path("none.xlsx");
    let out = env.run(&["search", "zzz", "--export", target.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("error: No search results to export."));
    assert!(!target.exists());
}

// ===========================================================================
// shell
// ===========================================================================

#[test]
fn shell_runs_piped_session() {
    let env = Env::new();
    let book = env.inventory();
    let script = "sheet Orders\nconfirm\nsearch ab\nwait\nresults\nquit\n";

    let mut child = env
        .sheetfind()
        .args(["shell", book.to_str().unwrap()])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(script.as_bytes()).unwrap();
    let out = child.wait_with_output().unwrap();

    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("Opened"));
    assert!(text.contains("Settings confirmed: sheet 'Orders', column 'Order'"));
    // Orders' first column is Order; "ab" doesn't match "O-1"
    assert!(text.contains("Search for 'ab' finished: 0 results"));
    assert!(text.contains("No matching results found."));
}

#[test]
fn no_subcommand_prints_usage() {
    let env = Env::new();
    let out = env.run(&[]);
    assert!(out.status.success());
    assert!(stderr(&out).contains("Usage: sheetfind <command>"));
}
