//! Whole-file reader with an in-memory buffer limit.
//!
//! # Overview
//!
//! [`FileReader`] loads a regular file into a single `Vec<u8>` for hashing.
//! Files whose length exceeds the configured threshold are not read at all;
//! the reader reports [`FileContent::Oversized`] with the declared length and
//! the caller routes the file to the size-keyed fallback.
//!
//! The length is taken once, at open time. The reader then reads at most one
//! byte past that length so that both growth and shrinkage during the read
//! are detected and reported as [`ReadError::SizeChanged`] instead of
//! producing a truncated payload.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Default oversize threshold: `2^31 - 1` bytes.
///
/// A Rust buffer could address more, but this bounds the memory held by a
/// single task to under 2 GiB.
pub const DEFAULT_OVERSIZE_THRESHOLD: u64 = i32::MAX as u64;

/// Largest accepted oversize threshold: 16 GiB, or `isize::MAX` where that is
/// smaller.
///
/// Configuration above this is rejected by
/// [`FinderConfig::validate`](crate::duplicates::FinderConfig::validate), and
/// [`FileReader::new`] clamps to it, so no single read allocates more.
pub const MAX_OVERSIZE_THRESHOLD: u64 = {
    let cap: u64 = 16 << 30;
    if (isize::MAX as u64) < cap {
        isize::MAX as u64
    } else {
        cap
    }
};

/// Result of reading a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Full file contents.
    Bytes(Vec<u8>),
    /// File length exceeds the threshold; contents were not read.
    Oversized {
        /// Declared length at open time
        size: u64,
    },
}

/// Errors that can occur while reading file contents.
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The file could not be opened or read.
    #[error("Read failed for {path}: {source}")]
    Io {
        /// Path that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file changed length while it was being read.
    #[error("File size changed during read for {path}: expected {expected} bytes, got {actual}")]
    SizeChanged {
        /// Path that changed
        path: PathBuf,
        /// Length at open time
        expected: u64,
        /// Bytes actually available (capped at `expected + 1`)
        actual: u64,
    },
}

impl ReadError {
    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::SizeChanged { path, .. } => path,
        }
    }
}

/// Reads files into memory, refusing anything above the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileReader {
    threshold: u64,
}

impl Default for FileReader {
    fn default() -> Self {
        Self::new(DEFAULT_OVERSIZE_THRESHOLD)
    }
}

impl FileReader {
    /// Create a reader with the given oversize threshold in bytes, clamped to
    /// [`MAX_OVERSIZE_THRESHOLD`].
    #[must_use]
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold: threshold.min(MAX_OVERSIZE_THRESHOLD),
        }
    }

    /// The oversize threshold in bytes.
    #[must_use]
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Whether a file of `size` bytes is routed to the size-keyed fallback.
    #[must_use]
    pub fn is_oversized(&self, size: u64) -> bool {
        size > self.threshold
    }

    /// Read the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Io`] if the file cannot be opened or read, and
    /// [`ReadError::SizeChanged`] if its length differs from the length seen
    /// at open time.
    pub fn read(&self, path: &Path) -> Result<FileContent, ReadError> {
        let io_err = |source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let expected = file.metadata().map_err(io_err)?.len();

        if self.is_oversized(expected) {
            log::debug!(
                "Oversized file ({} bytes > {}): {}",
                expected,
                self.threshold,
                path.display()
            );
            return Ok(FileContent::Oversized { size: expected });
        }

        // expected <= threshold <= MAX_OVERSIZE_THRESHOLD, which fits in usize
        let capacity = usize::try_from(expected).unwrap_or(0);
        let mut buf = Vec::with_capacity(capacity);
        file.take(expected.saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(io_err)?;

        let actual = buf.len() as u64;
        if actual != expected {
            log::warn!(
                "File size changed during read: {} ({} -> {} bytes)",
                path.display(),
                expected,
                actual
            );
            return Err(ReadError::SizeChanged {
                path: path.to_path_buf(),
                expected,
                actual,
            });
        }

        Ok(FileContent::Bytes(buf))
    }
}
