//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage or validation error (bad args, bad selection)  |
//! | 3    | Spreadsheet could not be loaded                      |
//! | 4    | Export failed (no results, write error)              |
//! | 5    | A search is already in progress                      |
//!
//! A search that fails while scanning is not an error: it reports no
//! results and exits 0.
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `CliError`

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure (stdout closed, settings not saved).
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, or a selection that fails validation.
pub const EXIT_USAGE: u8 = 2;

/// The spreadsheet could not be opened or has no sheets.
pub const EXIT_LOAD: u8 = 3;

/// Export refused (no results) or the output file could not be written.
pub const EXIT_EXPORT: u8 = 4;

/// A second search was started while one was still running.
pub const EXIT_BUSY: u8 = 5;
