//! Command-line interface definitions for dupescan.
//!
//! # Example
//!
//! ```bash
//! # Scan two trees, text summary
//! dupescan scan ~/Photos /mnt/backup/Photos
//!
//! # SHA-256, 8 workers, rendezvous hand-off, JSON report
//! dupescan scan ~/Downloads --algorithm sha256 --workers 8 --queue-capacity 0 --output json
//!
//! # Write link scripts for every duplicate group
//! dupescan scan ~/Downloads --link-script ./links
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::output::ScriptType;

/// Concurrent duplicate file scanner.
///
/// Walks each root on its own thread, hashes file contents on a bounded
/// worker pool and reports groups of identical files.
#[derive(Debug, Parser)]
#[command(name = "dupescan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print errors to stderr as JSON objects
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML)
    ///
    /// Defaults to config.toml in the platform configuration directory.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan one or more directories for duplicate files
    Scan(ScanArgs),
}

/// Arguments for the scan subcommand.
///
/// Options left unset fall back to the config file and environment.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Roots to scan (directories or single files)
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Digest algorithm: md5, sha256 or blake3
    #[arg(short, long, value_name = "NAME")]
    pub algorithm: Option<String>,

    /// Files larger than this are grouped by size instead of hashed
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub threshold: Option<u64>,

    /// Number of worker threads (default: logical CPUs)
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Queue capacity between walkers and workers (default: worker count)
    ///
    /// 0 hands files only to idle workers; otherwise walkers hash the file
    /// themselves.
    #[arg(long, value_name = "N")]
    pub queue_capacity: Option<usize>,

    /// Follow symbolic links during scan
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Glob patterns to ignore (can be specified multiple times)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Fail if any root does not exist
    #[arg(long)]
    pub strict: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Write link scripts for duplicate groups into DIR/hash and DIR/size
    #[arg(long, value_name = "DIR")]
    pub link_script: Option<PathBuf>,

    /// Link script flavor
    #[arg(long, value_enum, default_value = "auto")]
    pub script_type: ScriptTypeArg,
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Machine-readable JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Link script flavor selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScriptTypeArg {
    /// PowerShell on Windows, POSIX sh elsewhere
    Auto,
    /// POSIX sh
    Posix,
    /// Windows PowerShell
    Powershell,
}

impl ScriptTypeArg {
    /// Resolve to a concrete script type.
    #[must_use]
    pub fn resolve(self) -> ScriptType {
        match self {
            Self::Auto => ScriptType::detect(),
            Self::Posix => ScriptType::Posix,
            Self::Powershell => ScriptType::PowerShell,
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Accepts plain numbers and decimal (KB, MB, ...) or binary (KiB, MiB, ...)
/// suffixes, case-insensitive.
///
/// # Errors
///
/// Returns a message for empty, negative or malformed input.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1 << 10,
        "MB" | "M" => 1_000_000,
        "MIB" => 1 << 20,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1 << 30,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1 << 40,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
