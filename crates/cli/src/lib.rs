// sheetfind CLI library: background worker, results table, interactive shell

pub mod shell;
pub mod table;
pub mod worker;

mod util;
