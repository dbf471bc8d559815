//! Output formatters for scan reports.
//!
//! - text for terminals
//! - JSON for automation and scripting
//! - link scripts that collect each duplicate group into one directory
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::DuplicateFinder;
//! use dupescan::error::ExitCode;
//! use dupescan::output::JsonOutput;
//! use dupescan::scanner::HashAlgorithm;
//! use std::path::Path;
//!
//! let report = DuplicateFinder::with_defaults().scan_path(Path::new(".")).unwrap();
//! let output = JsonOutput::new(&report, HashAlgorithm::Md5, ExitCode::for_report(&report));
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod script;
pub mod text;

// Re-export main types
pub use json::{JsonOutput, JsonOutputError};
pub use script::{write_link_scripts, LinkScript, LinkScriptError, ScriptType};
pub use text::TextOutput;
