//! Per-root directory walker.
//!
//! # Overview
//!
//! [`Walker`] enumerates every regular file under one root and hands each
//! absolute path to a callback. It knows nothing about hashing or dedup
//! state; the pipeline runs one walker per root on its own thread.
//!
//! Traversal uses [`walkdir`], which walks a single root sequentially and
//! detects symlink loops when links are followed.
//!
//! # Failure policy
//!
//! - A missing root ([`ScanError::NotFound`]) or an unreadable one
//!   ([`ScanError::Io`]) is the only hard error, reported before the first
//!   callback.
//! - Unreadable directories, vanished entries and symlink loops are logged
//!   and skipped: a directory that cannot be listed contributes zero files.
//!
//! Visit order is unspecified.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let mut files = Vec::new();
//! let stats = walker.walk(|path| files.push(path)).unwrap();
//! assert_eq!(stats.files, files.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::{DirEntry, WalkDir};

use super::{ScanError, WalkerConfig};

/// Counters for a single walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Regular files passed to the callback
    pub files: usize,
    /// Entries skipped because they could not be read
    pub skipped_errors: usize,
    /// Whether the walk stopped early on shutdown
    pub interrupted: bool,
}

/// Directory walker for a single root.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given root.
    ///
    /// Relative roots are resolved against the current directory so that
    /// every emitted path is absolute.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        let root = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Self {
            root,
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// Once the flag is `true` the walker stops emitting paths.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The absolute root this walker traverses.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build gitignore matcher from config patterns.
    fn build_gitignore(&self) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(&self.root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Decide whether an entry (and for directories, its subtree) is skipped.
    fn is_filtered(&self, entry: &DirEntry, gitignore: Option<&Gitignore>) -> bool {
        // Never filter the root itself
        if entry.depth() == 0 {
            return false;
        }

        if self.config.skip_hidden
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.'))
        {
            log::trace!("Skipping hidden entry: {}", entry.path().display());
            return true;
        }

        if let Some(gi) = gitignore {
            let is_dir = entry.file_type().is_dir();
            if gi
                .matched_path_or_any_parents(entry.path(), is_dir)
                .is_ignore()
            {
                log::trace!("Ignoring: {}", entry.path().display());
                return true;
            }
        }

        false
    }

    /// Walk the tree, calling `on_file` once per regular file.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`] if the root does not exist, or
    /// [`ScanError::Io`] if it cannot be inspected. Nothing else aborts the
    /// walk.
    pub fn walk<F>(&self, mut on_file: F) -> Result<WalkStats, ScanError>
    where
        F: FnMut(PathBuf),
    {
        // Root links are always followed; a dangling one counts as missing.
        if let Err(source) = std::fs::metadata(&self.root) {
            return Err(match source.kind() {
                std::io::ErrorKind::NotFound => ScanError::NotFound(self.root.clone()),
                _ => ScanError::Io {
                    path: self.root.clone(),
                    source,
                },
            });
        }

        let gitignore = self.build_gitignore();
        let mut stats = WalkStats::default();

        let entries = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .into_iter()
            .filter_entry(|entry| !self.is_filtered(entry, gitignore.as_ref()));

        for entry in entries {
            if self.is_shutdown_requested() {
                log::debug!(
                    "Walker: Shutdown requested, stopping {}",
                    self.root.display()
                );
                stats.interrupted = true;
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    stats.skipped_errors += 1;
                    self.log_walk_error(&e);
                    continue;
                }
            };

            // With follow_links the file type is the link target's.
            // Without it, symlinks report as symlinks and are skipped here.
            if !entry.file_type().is_file() {
                continue;
            }

            stats.files += 1;
            on_file(entry.into_path());
        }

        log::debug!(
            "Walk of {} complete: {} files, {} skipped entries",
            self.root.display(),
            stats.files,
            stats.skipped_errors
        );

        Ok(stats)
    }

    fn log_walk_error(&self, error: &walkdir::Error) {
        let path = error
            .path()
            .map_or_else(|| self.root.display().to_string(), |p| p.display().to_string());

        if error.loop_ancestor().is_some() {
            log::debug!("Skipping symlink loop at {}", path);
            return;
        }

        match error.io_error().map(std::io::Error::kind) {
            Some(std::io::ErrorKind::PermissionDenied) => {
                log::warn!("Permission denied: {}", path);
            }
            Some(std::io::ErrorKind::NotFound) => {
                log::debug!("Entry vanished during walk: {}", path);
            }
            _ => {
                log::warn!("Walker error for {}: {}", path, error);
            }
        }
    }
}
