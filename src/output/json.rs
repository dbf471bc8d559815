//! JSON output formatter for scan reports.
//!
//! The document is the [`ScanReport`] itself plus exit code information:
//!
//! ```json
//! {
//!   "unique_count": 2,
//!   "duplicate_count": 1,
//!   "failure_count": 0,
//!   "total_count": 3,
//!   "hash_duplicate_groups": { "900150983cd24fb0d6963f7d28e17f72": ["/data/a", "/data/b"] },
//!   "size_duplicate_groups": {},
//!   "failures": [],
//!   "roots": [{ "path": "/data", "status": "completed", "files": 3, "inline_tasks": 0, "elapsed": 0.004 }],
//!   "duration": 0.005,
//!   "algorithm": "md5",
//!   "exit_code": 0,
//!   "exit_code_name": "DS000"
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::duplicates::ScanReport;
use crate::error::ExitCode;
use crate::scanner::HashAlgorithm;

/// JSON document for one scan.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// The scan report, flattened into the top level
    #[serde(flatten)]
    pub report: &'a ScanReport,
    /// Digest that keys `hash_duplicate_groups`
    pub algorithm: HashAlgorithm,
    /// Process exit code
    pub exit_code: i32,
    /// Machine-readable exit code name
    pub exit_code_name: &'static str,
}

impl<'a> JsonOutput<'a> {
    /// Create a JSON output for a report.
    #[must_use]
    pub fn new(report: &'a ScanReport, algorithm: HashAlgorithm, exit_code: ExitCode) -> Self {
        Self {
            report,
            algorithm,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
        }
    }

    /// Serialize to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        if pretty {
            serde_json::to_writer_pretty(&mut *writer, self)?;
        } else {
            serde_json::to_writer(&mut *writer, self)?;
        }
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// Serialization failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing failed.
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
