//! Plain-text rendering of search results.

use sheetfind_engine::results::{Presentation, ResultTable};

use crate::util::{display_width, pad_right, single_line};

/// Shown instead of a table when a search matched nothing.
pub const NO_RESULTS_MESSAGE: &str = "No matching results found.";

const COLUMN_GAP: &str = "  ";

/// Render a presentation, or the no-results notice.
pub fn render(presentation: &Presentation, max_column_width: usize) -> String {
    match presentation {
        Presentation::NoResults => format!("{}\n", NO_RESULTS_MESSAGE),
        Presentation::Table(table) => render_table(table, max_column_width),
    }
}

/// Aligned columns with a dashed rule under the header. Each column is as
/// wide as its widest cell, capped at `max_column_width`; longer cells are
/// cut with "..".
pub fn render_table(table: &ResultTable, max_column_width: usize) -> String {
    let cap = max_column_width.max(1);
    let headers: Vec<String> = table.headers.iter().map(|h| single_line(h)).collect();
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|c| single_line(c)).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in &rows {
        for (col, cell) in row.iter().enumerate() {
            if col < widths.len() {
                widths[col] = widths[col].max(display_width(cell));
            }
        }
    }
    for w in &mut widths {
        *w = (*w).min(cap);
    }

    let mut out = String::new();
    push_line(&mut out, &headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(col, w)| pad_right(cells.get(col).map(String::as_str).unwrap_or(""), *w))
        .collect();
    out.push_str(line.join(COLUMN_GAP).trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> ResultTable {
        ResultTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn no_results_notice() {
        assert_eq!(render(&Presentation::NoResults, 40), "No matching results found.\n");
    }

    #[test]
    fn columns_align() {
        let t = table(&["Sheet", "SKU", "Qty"], &[&["Inventory", "AB12", "5"]]);
        let text = render_table(&t, 40);
        assert_eq!(
            text,
            "Sheet      SKU   Qty\n\
             ---------  ----  ---\n\
             Inventory  AB12  5\n"
        );
    }

    #[test]
    fn wide_cells_are_cut() {
        let t = table(&["Sheet", "Note"], &[&["A", "a very long note indeed"]]);
        let text = render_table(&t, 8);
        let last = text.lines().last().unwrap();
        assert_eq!(last, "A      a very..");
    }

    #[test]
    fn empty_cells_render_blank() {
        let t = table(&["Sheet", "SKU", "Qty"], &[&["A", "x", ""], &["A", "y", "2"]]);
        let text = render_table(&t, 40);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[2], "A      x");
        assert_eq!(lines[3], "A      y    2");
    }
}
