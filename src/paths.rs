//! Default file locations for persisted review history.
//!
//! ## Environment Variables
//!
//! - `DATA_DIR`: Override the base data directory (default: "data")
//!
//! `config.toml` and `REVIEW_STORE_PATH` (see config.rs) take precedence over
//! these defaults.

use std::env;
use std::sync::OnceLock;

/// Lazily initialized data directory from DATA_DIR env var
static DATA_DIR_VALUE: OnceLock<String> = OnceLock::new();

/// Get the base data directory (from DATA_DIR env var or default "data")
pub fn data_dir() -> &'static str {
    DATA_DIR_VALUE.get_or_init(|| env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()))
}

/// SQLite review history
pub fn sqlite_path() -> String {
    format!("{}/reviews.db", data_dir())
}

/// JSON review history
pub fn json_path() -> String {
    format!("{}/spaced_repetition_data.json", data_dir())
}
