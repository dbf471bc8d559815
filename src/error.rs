//! Exit codes and structured errors for the binary.

use serde::Serialize;

use crate::duplicates::{FinderError, ScanReport};

/// Process exit codes.
///
/// - 0: duplicates found
/// - 1: error
/// - 2: no duplicates
/// - 3: completed, but some files failed or some roots were missing
/// - 130: interrupted (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Scan completed and duplicates were found.
    Success = 0,
    /// An error stopped the scan.
    GeneralError = 1,
    /// Scan completed without duplicates.
    NoDuplicates = 2,
    /// Scan completed with per-file failures or missing roots.
    PartialSuccess = 3,
    /// Scan was interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code name.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::NoDuplicates => "DS002",
            Self::PartialSuccess => "DS003",
            Self::Interrupted => "DS130",
        }
    }

    /// Exit code for a completed scan.
    ///
    /// Partial results take precedence over the duplicate outcome.
    #[must_use]
    pub fn for_report(report: &ScanReport) -> Self {
        if report.is_partial() {
            Self::PartialSuccess
        } else if report.has_duplicates() {
            Self::Success
        } else {
            Self::NoDuplicates
        }
    }

    /// Exit code for an error that escaped `run_app`.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FinderError>() {
            Some(FinderError::Interrupted) => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
