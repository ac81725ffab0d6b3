use serde::{Deserialize, Serialize};

use crate::sheet::Sheet;

/// Every sheet of one spreadsheet file, in workbook order.
///
/// A catalog is built whole by the loader and replaced whole when another
/// file is chosen; nothing mutates it in place after loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetCatalog {
    sheets: Vec<Sheet>,
}

impl SheetCatalog {
    /// Build a catalog. A sheet whose name repeats an earlier one is dropped,
    /// keeping names unique.
    pub fn new(sheets: Vec<Sheet>) -> Self {
        let mut unique: Vec<Sheet> = Vec::with_capacity(sheets.len());
        for sheet in sheets {
            if unique.iter().any(|s| s.name == sheet.name) {
                log::warn!("duplicate sheet name '{}' ignored", sheet.name);
                continue;
            }
            unique.push(sheet);
        }
        Self { sheets: unique }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sheet(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_preserves_order() {
        let catalog = SheetCatalog::new(vec![
            Sheet::new("B", vec!["x".into()]),
            Sheet::new("A", vec!["y".into()]),
        ]);
        assert_eq!(catalog.sheet_names(), vec!["B", "A"]);
        assert_eq!(catalog.sheet("A").map(|s| s.columns.clone()), Some(vec!["y".to_string()]));
        assert!(!catalog.contains("C"));
    }

    #[test]
    fn duplicate_names_keep_first() {
        let catalog = SheetCatalog::new(vec![
            Sheet::new("A", vec!["first".into()]),
            Sheet::new("A", vec!["second".into()]),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.sheet("A").unwrap().columns, vec!["first"]);
    }
}
