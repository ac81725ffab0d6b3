//! Interactive search session.
//!
//! One session holds an open file, a draft selection being edited, the
//! confirmed settings, the background worker and the latest results. Each
//! input line is one command. A finished background search is picked up
//! before the next command runs, or at `wait`.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use sheetfind_config::Settings;
use sheetfind_engine::results::{ResultSet, SortOrder};
use sheetfind_engine::selector::{
    evaluate, ColumnChoice, Selection, SelectionView, SettingsSelector, ValidationError,
    NO_COLUMNS_PLACEHOLDER,
};
use sheetfind_engine::settings::SearchSettings;
use sheetfind_engine::workbook::SheetCatalog;
use sheetfind_io::xlsx::{export_results, load_catalog};

use crate::table::{self, NO_RESULTS_MESSAGE};
use crate::worker::{SearchCompletion, SearchWorker};

pub const PROMPT: &str = "sheetfind> ";

pub const NO_FILE_MESSAGE: &str = "No Excel file selected.";
pub const NO_PHRASE_MESSAGE: &str = "Please enter a search phrase.";

const HELP: &str = "\
Commands:
  open <FILE>          load a spreadsheet
  sheets               list sheets in the open file
  sheet <NAME>         choose the sheet to search
  column <NAME>        choose the column to match against
  with [COLS]          set additional columns (comma-separated; +COL / -COL toggle)
  confirm              validate the selection and make it the search settings
  settings             show confirmed settings and the selection being edited
  search <PHRASE>      start a background search (phrase is a regex)
  wait                 block until the running search finishes
  results              show the latest results
  sort <COL> [desc]    sort the latest results by a column
  export <FILE>        write the latest results to .xlsx
  help                 show this list
  quit                 leave the shell";

/// Whether the session should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Split `--with`-style arguments: repeatable, commas accepted.
pub fn parse_column_list<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    args.iter()
        .flat_map(|a| a.as_ref().split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// One-line summary of confirmed settings.
pub fn describe_settings(settings: &SearchSettings) -> String {
    if settings.is_empty() {
        return "(not configured)".to_string();
    }
    let mut text = format!("sheet '{}', column '{}'", settings.sheet_name, settings.search_column);
    if !settings.additional_columns.is_empty() {
        text.push_str(&format!(", with {}", settings.additional_columns.join(", ")));
    }
    text
}

/// Human-readable selector view, one field per line.
pub fn describe_view(selection: &Selection, view: &SelectionView) -> String {
    let mut text = String::new();
    let sheet = if selection.sheet_name.is_empty() {
        "(none)"
    } else {
        selection.sheet_name.as_str()
    };
    text.push_str(&format!("sheet:      {}\n", sheet));
    let columns = match &view.search_columns {
        ColumnChoice::Columns(columns) => columns.join(", "),
        ColumnChoice::Disabled => "(disabled)".to_string(),
        ColumnChoice::Placeholder => format!("{} (disabled)", NO_COLUMNS_PLACEHOLDER),
    };
    text.push_str(&format!("columns:    {}\n", columns));
    if view.search_columns.is_enabled() {
        text.push_str(&format!("search:     {}\n", selection.search_column));
        let eligible: Vec<String> = view
            .eligible_additional
            .iter()
            .map(|c| {
                let mark = if selection.additional_columns.contains(c) { "x" } else { " " };
                format!("[{}] {}", mark, c)
            })
            .collect();
        text.push_str(&format!("additional: {}\n", eligible.join("  ")));
    }
    for err in &view.errors {
        if *err != ValidationError::Incomplete {
            text.push_str(&format!("note:       {}\n", err));
        }
    }
    text
}

pub struct Shell {
    prefs: Settings,
    prefs_path: PathBuf,
    max_column_width: usize,
    file: Option<PathBuf>,
    catalog: SheetCatalog,
    draft: Selection,
    settings: SearchSettings,
    worker: SearchWorker,
    results: ResultSet,
    prompt: bool,
}

impl Shell {
    /// Start a session seeded with stored preferences. Confirmed settings
    /// are written back to `prefs_path`.
    pub fn new(prefs: Settings, prefs_path: PathBuf) -> Self {
        Self {
            settings: prefs.search.clone(),
            max_column_width: prefs.max_column_width,
            prefs,
            prefs_path,
            file: None,
            catalog: SheetCatalog::default(),
            draft: Selection::default(),
            worker: SearchWorker::new(),
            results: ResultSet::default(),
            prompt: false,
        }
    }

    /// Print a prompt before each command.
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    /// Read commands until `quit` or end of input. A search still running at
    /// end of input is waited for so its results are shown.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        let mut lines = input.lines();
        loop {
            if self.prompt {
                write!(out, "{}", PROMPT)?;
                out.flush()?;
            }
            let Some(line) = lines.next() else { break };
            let line = line?;
            self.check_worker(out)?;
            if self.execute(&line, out)? == Flow::Quit {
                return Ok(());
            }
        }
        if let Some(completion) = self.worker.wait() {
            self.deliver(completion, out)?;
        }
        Ok(())
    }

    /// Run one command line.
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        // The search phrase is a regex, so only the line terminator and the
        // one separator after the command word are removed from it
        let line = line.trim_end_matches(['\r', '\n']).trim_start();
        if line.trim_end().is_empty() || line.starts_with('#') {
            return Ok(Flow::Continue);
        }
        let (command, raw) = match line.char_indices().find(|(_, c)| c.is_whitespace()) {
            Some((at, sep)) => (&line[..at], &line[at + sep.len_utf8()..]),
            None => (line, ""),
        };
        let rest = raw.trim();

        match command.to_ascii_lowercase().as_str() {
            "open" => self.cmd_open(rest, out)?,
            "sheets" => self.cmd_sheets(out)?,
            "sheet" => self.cmd_sheet(rest, out)?,
            "column" => self.cmd_column(rest, out)?,
            "with" => self.cmd_with(rest, out)?,
            "confirm" => self.cmd_confirm(out)?,
            "settings" => self.cmd_settings(out)?,
            "search" => self.cmd_search(raw, out)?,
            "wait" => self.cmd_wait(out)?,
            "results" => self.show_results(out)?,
            "sort" => self.cmd_sort(rest, out)?,
            "export" => self.cmd_export(rest, out)?,
            "help" | "?" => writeln!(out, "{}", HELP)?,
            "quit" | "exit" => return Ok(Flow::Quit),
            other => writeln!(out, "error: unknown command '{}' (try 'help')", other)?,
        }
        Ok(Flow::Continue)
    }

    /// Load `path`, replacing the current catalog. On failure the previous
    /// file stays open.
    pub fn open<W: Write>(&mut self, path: &Path, out: &mut W) -> io::Result<()> {
        let catalog = match load_catalog(path) {
            Ok(catalog) => catalog,
            Err(e) => return writeln!(out, "error: {}", e),
        };
        self.draft = SettingsSelector::with_settings(&catalog, &self.settings)
            .selection()
            .clone();
        self.catalog = catalog;
        self.file = Some(path.to_path_buf());
        self.results = ResultSet::default();

        writeln!(
            out,
            "Opened {} ({} sheet{})",
            path.display(),
            self.catalog.len(),
            if self.catalog.len() == 1 { "" } else { "s" }
        )?;
        self.print_view(out)
    }

    fn check_worker<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if let Some(completion) = self.worker.poll() {
            self.deliver(completion, out)?;
        }
        Ok(())
    }

    fn deliver<W: Write>(&mut self, completion: SearchCompletion, out: &mut W) -> io::Result<()> {
        let count = completion.outcome.rows.len();
        self.results = ResultSet::new(&completion.settings, completion.outcome.rows);
        writeln!(
            out,
            "Search for '{}' finished: {} result{}",
            completion.phrase,
            count,
            if count == 1 { "" } else { "s" }
        )?;
        self.show_results(out)
    }

    fn print_view<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let view = evaluate(&self.catalog, &self.draft);
        write!(out, "{}", describe_view(&self.draft, &view))
    }

    fn require_file<W: Write>(&self, out: &mut W) -> io::Result<bool> {
        if self.file.is_none() {
            writeln!(out, "error: {}", NO_FILE_MESSAGE)?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Apply one selector edit to the draft and show the outcome.
    fn edit<W, F>(&mut self, out: &mut W, apply: F) -> io::Result<()>
    where
        W: Write,
        F: FnOnce(&mut SettingsSelector<'_>) -> Result<SelectionView, ValidationError>,
    {
        if !self.require_file(out)? {
            return Ok(());
        }
        let mut selector = SettingsSelector::from_selection(&self.catalog, self.draft.clone());
        match apply(&mut selector) {
            Ok(_) => {
                self.draft = selector.selection().clone();
                self.print_view(out)
            }
            Err(e) => writeln!(out, "error: {}", e),
        }
    }

    fn cmd_open<W: Write>(&mut self, rest: &str, out: &mut W) -> io::Result<()> {
        if rest.is_empty() {
            return writeln!(out, "error: usage: open <FILE>");
        }
        self.open(Path::new(rest), out)
    }

    fn cmd_sheets<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if !self.require_file(out)? {
            return Ok(());
        }
        for sheet in self.catalog.sheets() {
            let mark = if sheet.name == self.draft.sheet_name { "*" } else { " " };
            writeln!(
                out,
                "{} {} ({} columns, {} rows)",
                mark,
                sheet.name,
                sheet.columns.len(),
                sheet.row_count()
            )?;
        }
        Ok(())
    }

    fn cmd_sheet<W: Write>(&mut self, rest: &str, out: &mut W) -> io::Result<()> {
        if rest.is_empty() {
            return writeln!(out, "error: usage: sheet <NAME>");
        }
        self.edit(out, |s| s.select_sheet(rest))
    }

    fn cmd_column<W: Write>(&mut self, rest: &str, out: &mut W) -> io::Result<()> {
        if rest.is_empty() {
            return writeln!(out, "error: usage: column <NAME>");
        }
        self.edit(out, |s| s.select_search_column(rest))
    }

    fn cmd_with<W: Write>(&mut self, rest: &str, out: &mut W) -> io::Result<()> {
        let names = parse_column_list(&[rest]);
        let toggles = names.iter().any(|n| n.starts_with('+') || n.starts_with('-'));
        self.edit(out, |s| {
            if !toggles {
                return s.set_additional(&names);
            }
            let mut view = s.view();
            for name in &names {
                view = match name.strip_prefix('-') {
                    Some(col) => s.toggle_additional(col.trim(), false)?,
                    None => s.toggle_additional(name.trim_start_matches('+').trim(), true)?,
                };
            }
            Ok(view)
        })
    }

    fn cmd_confirm<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let confirmed = SettingsSelector::from_selection(&self.catalog, self.draft.clone()).confirm();
        let settings = match confirmed {
            Ok(settings) => settings,
            Err(e) => return writeln!(out, "error: {}", e),
        };

        self.settings = settings.clone();
        if let Some(file) = &self.file {
            self.prefs.remember(file, settings);
            if let Err(e) = self.prefs.save_to(&self.prefs_path) {
                log::warn!("{}", e);
            }
        }
        writeln!(out, "Settings confirmed: {}", describe_settings(&self.settings))
    }

    fn cmd_settings<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match &self.file {
            Some(file) => writeln!(out, "file:       {}", file.display())?,
            None => writeln!(out, "file:       (none)")?,
        }
        writeln!(out, "confirmed:  {}", describe_settings(&self.settings))?;
        if self.file.is_some() {
            writeln!(out, "editing:")?;
            self.print_view(out)?;
        }
        Ok(())
    }

    fn cmd_search<W: Write>(&mut self, phrase: &str, out: &mut W) -> io::Result<()> {
        let Some(file) = self.file.clone() else {
            return writeln!(out, "error: {}", NO_FILE_MESSAGE);
        };
        if phrase.is_empty() {
            return writeln!(out, "error: {}", NO_PHRASE_MESSAGE);
        }
        match self.worker.start(file, self.settings.clone(), phrase.to_string()) {
            Ok(()) => {
                self.results = ResultSet::default();
                writeln!(out, "Searching for '{}'...", phrase)
            }
            Err(e) => writeln!(out, "error: {}", e),
        }
    }

    fn cmd_wait<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        match self.worker.wait() {
            Some(completion) => self.deliver(completion, out),
            None => writeln!(out, "No search is running."),
        }
    }

    fn show_results<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}", table::render(&self.results.presentation(), self.max_column_width))
    }

    fn cmd_sort<W: Write>(&mut self, rest: &str, out: &mut W) -> io::Result<()> {
        if rest.is_empty() {
            return writeln!(out, "error: usage: sort <COL> [asc|desc]");
        }
        if self.results.is_empty() {
            return writeln!(out, "{}", NO_RESULTS_MESSAGE);
        }
        let (column, order) = match rest.rsplit_once(char::is_whitespace) {
            Some((column, dir)) if dir.eq_ignore_ascii_case("desc") => (column.trim(), SortOrder::Descending),
            Some((column, dir)) if dir.eq_ignore_ascii_case("asc") => (column.trim(), SortOrder::Ascending),
            _ => (rest, SortOrder::Ascending),
        };
        match self.results.sort_by(column, order) {
            Ok(()) => self.show_results(out),
            Err(e) => writeln!(out, "error: {}", e),
        }
    }

    fn cmd_export<W: Write>(&mut self, rest: &str, out: &mut W) -> io::Result<()> {
        if rest.is_empty() {
            return writeln!(out, "error: usage: export <FILE>");
        }
        match export_results(&self.results, Path::new(rest)) {
            Ok(summary) => writeln!(out, "{}", summary.summary()),
            Err(e) => writeln!(out, "error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    fn inventory(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("inventory.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet().set_name("Inventory").unwrap();
        sheet.write_string(0, 0, "SKU").unwrap();
        sheet.write_string(0, 1, "Qty").unwrap();
        sheet.write_string(0, 2, "Bin").unwrap();
        sheet.write_string(1, 0, "AB12").unwrap();
        sheet.write_number(1, 1, 5.0).unwrap();
        sheet.write_string(1, 2, "A1").unwrap();
        sheet.write_string(2, 0, "cd99").unwrap();
        sheet.write_number(2, 1, 2.0).unwrap();
        sheet.write_string(2, 2, "B4").unwrap();
        sheet.write_string(3, 0, "ab77").unwrap();
        sheet.write_number(3, 1, 9.0).unwrap();
        let other = workbook.add_worksheet().set_name("Orders").unwrap();
        other.write_string(0, 0, "Order").unwrap();
        workbook.add_worksheet().set_name("Empty").unwrap();
        workbook.save(&path).unwrap();
        path
    }

    fn shell(dir: &TempDir) -> Shell {
        Shell::new(Settings::default(), dir.path().join("prefs").join("settings.json"))
    }

    fn run(shell: &mut Shell, script: &str) -> String {
        let mut out = Vec::new();
        shell.run(script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn column_list_accepts_commas_and_repeats() {
        assert_eq!(parse_column_list(&["Qty, Bin", "Price"]), vec!["Qty", "Bin", "Price"]);
        assert!(parse_column_list(&[""]).is_empty());
    }

    #[test]
    fn commands_need_an_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell(&dir);
        let text = run(&mut shell, "sheet Inventory\nsearch ab\n");
        assert_eq!(text.matches(NO_FILE_MESSAGE).count(), 2);
    }

    #[test]
    fn configure_search_sort_export() {
        let dir = tempfile::tempdir().unwrap();
        let book = inventory(&dir);
        let out_path = dir.path().join("found");
        let mut shell = shell(&dir);

        let script = format!(
            "open {}\nsheet Inventory\ncolumn SKU\nwith Qty\nconfirm\nsearch ab\nwait\nsort Qty desc\nexport {}\n",
            book.display(),
            out_path.display()
        );
        let text = run(&mut shell, &script);

        assert!(text.contains("Settings confirmed: sheet 'Inventory', column 'SKU', with Qty"));
        assert!(text.contains("Search for 'ab' finished: 2 results"));
        assert_eq!(shell.results().len(), 2);
        let first = shell.results().rows()[0].search_value().unwrap().to_string();
        assert_eq!(first, "ab77");
        assert!(text.contains("2 rows exported to"));
        assert!(dir.path().join("found.xlsx").exists());

        let saved = Settings::load_from(&dir.path().join("prefs").join("settings.json")).unwrap();
        assert_eq!(saved.search, SearchSettings::new("Inventory", "SKU", vec!["Qty".into()]));
        assert_eq!(saved.last_file.as_deref(), Some(book.as_path()));
    }

    #[test]
    fn rejected_edits_leave_draft_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let book = inventory(&dir);
        let mut shell = shell(&dir);
        let script = format!("open {}\ncolumn Nope\nwith Nope\nconfirm\n", book.display());
        let text = run(&mut shell, &script);
        assert!(text.contains("error: column 'Nope' not found in sheet 'Inventory'"));
        assert!(text.contains("error: column 'Nope' is not an eligible additional column"));
        // Draft is still the preselected first sheet and column
        assert_eq!(shell.settings(), &SearchSettings::new("Inventory", "SKU", vec![]));
    }

    #[test]
    fn failed_confirm_keeps_previous_settings() {
        let dir = tempfile::tempdir().unwrap();
        let book = inventory(&dir);
        let mut shell = shell(&dir);
        let script = format!("open {}\nconfirm\nsheet Empty\nconfirm\n", book.display());
        let text = run(&mut shell, &script);
        assert!(text.contains("columns:    (disabled)"));
        assert!(text.contains("error: Sheet Name and Search Column are required."));
        assert_eq!(shell.settings(), &SearchSettings::new("Inventory", "SKU", vec![]));
    }

    #[test]
    fn search_phrase_keeps_its_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet().set_name("People").unwrap();
        sheet.write_string(0, 0, "Name").unwrap();
        sheet.write_string(1, 0, "John Smith").unwrap();
        sheet.write_string(2, 0, "JohnSmith").unwrap();
        workbook.save(&path).unwrap();

        let mut shell = shell(&dir);
        let script = format!("open {}
confirm
search n 
wait
search  
wait
search
", path.display());
        let text = run(&mut shell, &script);

        assert!(text.contains("Search for 'n ' finished: 1 result\n"));
        assert!(text.contains("Search for ' ' finished: 1 result\n"));
        assert_eq!(text.matches(NO_PHRASE_MESSAGE).count(), 1);
        assert_eq!(shell.results().rows()[0].search_value().unwrap().to_string(), "John Smith");
    }

    #[test]
    fn toggling_additional_columns() {
        let dir = tempfile::tempdir().unwrap();
        let book = inventory(&dir);
        let mut shell = shell(&dir);
        let script = format!("open {}\nwith +Bin, +Qty\nwith -Bin\nconfirm\n", book.display());
        run(&mut shell, &script);
        assert_eq!(shell.settings().additional_columns, vec!["Qty".to_string()]);
    }

    #[test]
    fn search_failure_shows_no_results() {
        let dir = tempfile::tempdir().unwrap();
        let book = inventory(&dir);
        let mut shell = shell(&dir);
        let script = format!("open {}\nconfirm\nsearch [unclosed\nwait\n", book.display());
        let text = run(&mut shell, &script);
        assert!(text.contains("finished: 0 results"));
        assert!(text.contains(NO_RESULTS_MESSAGE));
    }

    #[test]
    fn empty_export_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell(&dir);
        let target = dir.path().join("out.xlsx");
        let text = run(&mut shell, &format!("export {}\n", target.display()));
        assert!(text.contains("error: No search results to export."));
        assert!(!target.exists());
    }

    #[test]
    fn search_left_running_at_end_of_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let book = inventory(&dir);
        let mut shell = shell(&dir);
        let text = run(&mut shell, &format!("open {}\nconfirm\nsearch cd\n", book.display()));
        assert!(text.contains("Search for 'cd' finished: 1 result\n"));
    }

    #[test]
    fn quit_stops_reading() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = shell(&dir);
        let text = run(&mut shell, "quit\nhelp\n");
        assert!(!text.contains("Commands:"));
    }
}
