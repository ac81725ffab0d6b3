// Application settings
// Loaded from ~/.config/sheetfind/settings.json (or $SHEETFIND_CONFIG)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sheetfind_engine::settings::SearchSettings;
use thiserror::Error;

/// Environment variable that overrides the settings file location
pub const CONFIG_ENV: &str = "SHEETFIND_CONFIG";

/// Default cap on rendered table column width, in display columns
pub const DEFAULT_MAX_COLUMN_WIDTH: usize = 40;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Error writing {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // File handling
    #[serde(rename = "file.lastOpened", skip_serializing_if = "Option::is_none")]
    pub last_file: Option<PathBuf>,

    // Last confirmed search settings
    #[serde(rename = "search.settings")]
    pub search: SearchSettings,

    // Results table
    #[serde(rename = "table.maxColumnWidth")]
    pub max_column_width: usize,

    // Logging (RUST_LOG wins when set)
    #[serde(rename = "log.filter", skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_file: None,
            search: SearchSettings::default(),
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
            log_filter: None,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sheetfind")
            .join("settings.json")
    }

    /// Load settings from disk, falling back to defaults on any problem
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    /// Load settings from the config path. A missing file yields defaults and
    /// writes a commented default file for the user to edit.
    pub fn try_load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(&path);
            return Ok(settings);
        }
        Self::load_from(&path)
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        // Strip comments (lines starting with //)
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        serde_json::from_str(&cleaned).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Save current settings to the config path
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save current settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        };

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        fs::write(path, json).map_err(write_err)?;
        log::debug!("settings saved to {}", path.display());
        Ok(())
    }

    /// Record a confirmed search against the file it was made for
    pub fn remember(&mut self, file: &Path, search: SearchSettings) {
        self.last_file = Some(file.to_path_buf());
        self.search = search;
    }

    /// Create default settings file with comments
    fn create_default_file(&self, path: &Path) {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Error creating config directory: {}", e);
                return;
            }
        }

        let default_config = format!(
            r#"{{
    // Last file opened with `sheetfind configure` or the shell
    // "file.lastOpened": "/path/to/book.xlsx",

    // Search settings used when `sheetfind search` gets no --sheet/--column
    "search.settings": {{
        "sheet_name": "",
        "search_column": "",
        "additional_columns": []
    }},

    // Widest a results table column may render before it is truncated
    "table.maxColumnWidth": {}

    // Log filter, e.g. "info" or "sheetfind_io=debug" (RUST_LOG wins)
    // "log.filter": "warn"
}}
"#,
            DEFAULT_MAX_COLUMN_WIDTH
        );

        if let Err(e) = fs::write(path, default_config) {
            log::warn!("Error writing default settings.json: {}", e);
        }
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
