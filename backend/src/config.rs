//! Application configuration.
//!
//! Sheet layout knobs live in [`IngestOptions`]; server settings in
//! [`ServerConfig`], read from the environment (a `.env` file is loaded by
//! the CLI at start-up).

use serde::{Deserialize, Serialize};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default upload limit, in megabytes.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

/// Where things are in the attendance export.
///
/// Row and column indices are 0-based and absolute (row 0 is the first row
/// of the sheet, even when it is blank).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Row holding the column headers; data starts on the next row.
    pub header_row: usize,

    /// How many leading rows may hold the period cell.
    pub period_scan_rows: usize,

    /// Cell holding the reporting period.
    pub period_cell: (usize, usize),

    /// Cell read when `period_cell` is empty.
    pub period_fallback_cell: (usize, usize),

    /// Characters kept from the period cell (`YYYY-MM`).
    pub period_len: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            header_row: 5,
            period_scan_rows: 10,
            period_cell: (3, 2),
            period_fallback_cell: (3, 1),
            period_len: 7,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Read `REPORTS_PORT` and `REPORTS_MAX_UPLOAD_MB`, falling back to the
    /// defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let port = lookup("REPORTS_PORT")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.port);
        let max_upload_bytes = lookup("REPORTS_MAX_UPLOAD_MB")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|mb| mb.checked_mul(1024 * 1024))
            .unwrap_or(defaults.max_upload_bytes);
        Self {
            port,
            max_upload_bytes,
        }
    }
}
