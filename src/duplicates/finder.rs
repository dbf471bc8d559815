//! Scan coordinator.
//!
//! # Overview
//!
//! [`DuplicateFinder`] validates roots and configuration, runs the
//! [`Pipeline`](super::pipeline::Pipeline) against a fresh
//! [`DedupRegistry`], waits for both completion phases and assembles the
//! [`ScanReport`].
//!
//! # Missing roots
//!
//! Roots are checked before any thread starts. A root whose metadata reports
//! `NotFound` is missing; any other metadata error (permission denied, a
//! file used as a directory) makes it unreadable.
//! - no root accessible: the scan fails with [`FinderError::PathNotFound`]
//!   or [`FinderError::RootUnreadable`] for the first failing root, and
//!   nothing is registered
//! - some roots failing: those get a `PathNotFound` or `Unreadable`
//!   outcome, the rest are scanned
//! - strict mode: any failing root fails the scan
//! - no roots: an empty report
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let config = FinderConfig::default().with_worker_count(8);
//! let finder = DuplicateFinder::new(config);
//!
//! let report = finder.scan(&[PathBuf::from("/photos"), PathBuf::from("/backup")]).unwrap();
//!
//! println!("{} unique, {} duplicates", report.unique_count, report.duplicate_count);
//! for (digest, paths) in &report.hash_duplicate_groups {
//!     println!("{digest}: {} copies", paths.len());
//! }
//! ```

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::pipeline::Pipeline;
use super::registry::DedupRegistry;
use super::report::{RootOutcome, ScanReport};
use crate::progress::ProgressCallback;
use crate::scanner::{
    HashAlgorithm, HashError, WalkerConfig, DEFAULT_OVERSIZE_THRESHOLD, MAX_OVERSIZE_THRESHOLD,
};

/// Number of workers used when none is configured.
#[must_use]
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism().map_or(4, NonZeroUsize::get)
}

/// Configuration for a scan.
#[derive(Clone)]
pub struct FinderConfig {
    /// Digest used for hash-space addresses.
    pub algorithm: HashAlgorithm,
    /// Files strictly larger than this are keyed by size instead of hash.
    pub oversize_threshold: u64,
    /// Number of worker threads (at least 1).
    pub worker_count: usize,
    /// Queue capacity; `None` means equal to the worker count.
    /// `Some(0)` hands tasks only to idle workers.
    pub queue_capacity: Option<usize>,
    /// Fail if any root is missing.
    pub strict: bool,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("algorithm", &self.algorithm)
            .field("oversize_threshold", &self.oversize_threshold)
            .field("worker_count", &self.worker_count)
            .field("queue_capacity", &self.queue_capacity)
            .field("strict", &self.strict)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            oversize_threshold: DEFAULT_OVERSIZE_THRESHOLD,
            worker_count: default_worker_count(),
            queue_capacity: None,
            strict: false,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the digest algorithm by name.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::DigestUnavailable`] for an unknown name.
    pub fn with_algorithm_name(self, name: &str) -> Result<Self, FinderError> {
        let algorithm = name.parse::<HashAlgorithm>()?;
        Ok(self.with_algorithm(algorithm))
    }

    /// Set the oversize threshold in bytes.
    ///
    /// Values above [`MAX_OVERSIZE_THRESHOLD`] fail [`validate`](Self::validate).
    #[must_use]
    pub fn with_oversize_threshold(mut self, bytes: u64) -> Self {
        self.oversize_threshold = bytes;
        self
    }

    /// Set the worker count (clamped to at least 1).
    #[must_use]
    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers.max(1);
        self
    }

    /// Set the queue capacity. 0 means rendezvous hand-off.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Set fail-fast on missing roots.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check settings that builders accept unchecked.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::InvalidThreshold`] if the oversize threshold
    /// exceeds [`MAX_OVERSIZE_THRESHOLD`].
    pub fn validate(&self) -> Result<(), FinderError> {
        if self.oversize_threshold > MAX_OVERSIZE_THRESHOLD {
            return Err(FinderError::InvalidThreshold {
                threshold: self.oversize_threshold,
                max: MAX_OVERSIZE_THRESHOLD,
            });
        }
        Ok(())
    }

    /// Queue capacity after applying the worker-count default.
    #[must_use]
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.worker_count.max(1))
    }
}

/// Errors that can occur during a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// A root does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// A root exists but its metadata could not be read.
    #[error("Cannot access {}: {source}", path.display())]
    RootUnreadable {
        /// Root as given by the caller
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The oversize threshold would allow unbounded read buffers.
    #[error("Oversize threshold {threshold} exceeds the maximum of {max} bytes")]
    InvalidThreshold {
        /// Requested threshold
        threshold: u64,
        /// Largest accepted threshold
        max: u64,
    },

    /// The requested digest algorithm is not supported.
    #[error("Digest algorithm unavailable: {0}")]
    DigestUnavailable(String),

    /// An I/O error occurred while setting up the scan.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<HashError> for FinderError {
    fn from(err: HashError) -> Self {
        match err {
            HashError::DigestUnavailable(name) => Self::DigestUnavailable(name),
        }
    }
}

/// Duplicate finder that coordinates walkers, workers and the registry.
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    fn is_shutdown_requested(&self) -> bool {
        self.config
            .shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Scan a single root.
    ///
    /// # Errors
    ///
    /// See [`scan`](Self::scan).
    pub fn scan_path(&self, path: &Path) -> Result<ScanReport, FinderError> {
        self.scan(&[path.to_path_buf()])
    }

    /// Scan all `roots` and report duplicates.
    ///
    /// Per-file problems never fail the scan; they are counted and listed in
    /// the report.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - the configuration is invalid
    /// - no root is accessible, or any root is missing or unreadable in
    ///   strict mode
    /// - the shutdown flag was set before or during the scan
    /// - worker or walker threads cannot be spawned
    pub fn scan(&self, roots: &[PathBuf]) -> Result<ScanReport, FinderError> {
        let start_time = Instant::now();
        self.config.validate()?;

        if roots.is_empty() {
            log::info!("No roots given, nothing to scan");
            return Ok(ScanReport {
                duration: start_time.elapsed(),
                ..Default::default()
            });
        }

        let mut checks: Vec<RootCheck> = roots.iter().map(|r| RootCheck::of(r)).collect();
        let any_present = checks.iter().any(RootCheck::is_present);
        if self.config.strict || !any_present {
            if let Some(i) = checks.iter().position(|c| !c.is_present()) {
                return Err(checks.swap_remove(i).into_error(&roots[i]));
            }
        }

        if self.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let present: Vec<PathBuf> = roots
            .iter()
            .zip(&checks)
            .filter(|(_, check)| check.is_present())
            .map(|(root, _)| root.clone())
            .collect();

        let progress = self.config.progress_callback.as_deref();
        if let Some(progress) = progress {
            progress.on_scan_start(roots.len());
        }

        let mut skipped_outcomes = Vec::new();
        for (root, check) in roots.iter().zip(&checks) {
            let outcome = match check {
                RootCheck::Present => continue,
                RootCheck::Missing => {
                    log::warn!("Path not found, skipping root: {}", root.display());
                    RootOutcome::missing(root)
                }
                RootCheck::Unreadable(e) => {
                    log::warn!("Cannot access root, skipping {}: {}", root.display(), e);
                    RootOutcome::unreadable(root)
                }
            };
            if let Some(progress) = progress {
                progress.on_root_end(&outcome);
            }
            skipped_outcomes.push(outcome);
        }

        let registry = DedupRegistry::new();
        let scanned = Pipeline::new(&registry, &self.config).run(&present)?;

        if self.is_shutdown_requested() {
            log::info!("Scan interrupted after {:?}", start_time.elapsed());
            if let Some(progress) = progress {
                progress.on_message("Interrupted");
            }
            return Err(FinderError::Interrupted);
        }

        if let Some(progress) = progress {
            progress.on_scan_end();
        }

        // Restore input order.
        let mut scanned = scanned.into_iter();
        let mut skipped = skipped_outcomes.into_iter();
        let outcomes: Vec<RootOutcome> = roots
            .iter()
            .zip(&checks)
            .map(|(root, check)| {
                let next = if check.is_present() {
                    scanned.next()
                } else {
                    skipped.next()
                };
                next.unwrap_or_else(|| RootOutcome::missing(root))
            })
            .collect();

        let report = ScanReport::from_registry(&registry, outcomes, start_time.elapsed());

        log::info!(
            "Scan complete: {} files, {} unique, {} duplicates, {} failures in {:.2}s",
            report.total_count,
            report.unique_count,
            report.duplicate_count,
            report.failure_count,
            report.duration.as_secs_f64()
        );

        Ok(report)
    }
}

/// Pre-scan state of one root.
#[derive(Debug)]
enum RootCheck {
    Present,
    Missing,
    Unreadable(std::io::Error),
}

impl RootCheck {
    fn of(root: &Path) -> Self {
        match std::fs::metadata(root) {
            Ok(_) => Self::Present,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::Missing,
            Err(e) => Self::Unreadable(e),
        }
    }

    fn is_present(&self) -> bool {
        matches!(self, Self::Present)
    }

    fn into_error(self, root: &Path) -> FinderError {
        match self {
            Self::Unreadable(source) => FinderError::RootUnreadable {
                path: root.to_path_buf(),
                source,
            },
            Self::Present | Self::Missing => FinderError::PathNotFound(root.to_path_buf()),
        }
    }
}
