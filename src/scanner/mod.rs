//! Scanner module for directory traversal, file reading and content hashing.
//!
//! This module provides functionality for:
//! - Sequential per-root directory walking using walkdir
//! - Whole-file reads bounded by an oversize threshold
//! - Content digests (MD5 by default, SHA-256 or BLAKE3 on request)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`reader`]: Loads file contents or reports them as oversized
//! - [`hasher`]: Digest engine producing hex content addresses
//!
//! None of these touch dedup state; the `duplicates` module wires them
//! together.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::scanner::{FileContent, FileReader, HashAlgorithm, Hasher, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig::default().with_skip_hidden(true);
//! let reader = FileReader::default();
//! let mut hasher = Hasher::new(HashAlgorithm::Md5);
//!
//! Walker::new(Path::new("."), config)
//!     .walk(|path| match reader.read(&path) {
//!         Ok(FileContent::Bytes(bytes)) => println!("{} {}", hasher.digest_hex(&bytes), path.display()),
//!         Ok(FileContent::Oversized { size }) => println!("{size} bytes: {}", path.display()),
//!         Err(e) => eprintln!("Warning: {e}"),
//!     })
//!     .unwrap();
//! ```

pub mod hasher;
pub mod reader;
pub mod walker;

use std::path::PathBuf;

// Re-export main types
pub use hasher::{hash_to_hex, HashAlgorithm, Hasher};
pub use reader::{
    FileContent, FileReader, ReadError, DEFAULT_OVERSIZE_THRESHOLD, MAX_OVERSIZE_THRESHOLD,
};
pub use walker::{WalkStats, Walker};

/// Configuration for directory walking.
///
/// Controls filtering and symlink handling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    /// Link cycles are detected and skipped.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Glob patterns to ignore (gitignore-style).
    pub ignore_patterns: Vec<String>,
}

impl WalkerConfig {
    /// Create a new configuration from CLI arguments.
    #[must_use]
    pub fn new(follow_symlinks: bool, skip_hidden: bool, ignore_patterns: Vec<String>) -> Self {
        Self {
            follow_symlinks,
            skip_hidden,
            ignore_patterns,
        }
    }

    /// Follow symbolic links.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Skip hidden entries.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Add a gitignore-style pattern.
    #[must_use]
    pub fn with_ignore_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.ignore_patterns.push(pattern.into());
        self
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The specified root was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The root exists but its metadata could not be read.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while setting up hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The requested digest algorithm is not supported.
    #[error("Digest algorithm unavailable: {0}")]
    DigestUnavailable(String),
}
