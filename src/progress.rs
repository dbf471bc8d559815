//! Progress reporting utilities using indicatif.
//!
//! The scan pipeline reports through the [`ProgressCallback`] trait from
//! walker and worker threads at the same time. [`Progress`] is the terminal
//! implementation used by the CLI: a single spinner counting processed files
//! plus one line per finished root.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::duplicates::{RootOutcome, RootStatus};

/// Progress callback for a scan.
///
/// Implementations are shared between all pipeline threads and must
/// tolerate concurrent calls. A panic in `on_file_processed` aborts the
/// scan: remaining files are skipped and the panic resumes in the caller of
/// `scan` once every thread has stopped.
pub trait ProgressCallback: Send + Sync {
    /// Called once before any root is walked.
    ///
    /// # Arguments
    ///
    /// * `roots` - Number of roots that will be walked
    fn on_scan_start(&self, roots: usize);

    /// Called when a walker starts on `root`.
    fn on_root_start(&self, root: &Path);

    /// Called after each file is read, hashed and registered (or failed).
    ///
    /// # Arguments
    ///
    /// * `processed` - Files processed so far across all roots
    /// * `path` - File just processed
    fn on_file_processed(&self, processed: usize, path: &Path);

    /// Called when a root's walker and all of its tasks have finished.
    fn on_root_end(&self, outcome: &RootOutcome);

    /// Called once after every root has finished.
    fn on_scan_end(&self);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Terminal progress reporter.
pub struct Progress {
    multi: MultiProgress,
    files: ProgressBar,
    roots_pending: AtomicUsize,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupescan::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        let files = multi.add(ProgressBar::new_spinner());
        files.set_style(Self::spinner_style());

        Self {
            multi,
            files,
            roots_pending: AtomicUsize::new(0),
            quiet,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }
}

impl ProgressCallback for Progress {
    fn on_scan_start(&self, roots: usize) {
        self.roots_pending.store(roots, Ordering::SeqCst);
        if self.quiet {
            return;
        }
        self.files.set_message("Scanning");
        self.files.enable_steady_tick(Duration::from_millis(100));
    }

    fn on_root_start(&self, root: &Path) {
        log::debug!("Walking {}", root.display());
    }

    fn on_file_processed(&self, processed: usize, path: &Path) {
        if self.quiet {
            return;
        }
        self.files.set_position(processed as u64);
        self.files.set_message(truncate_path(path, 30));
    }

    fn on_root_end(&self, outcome: &RootOutcome) {
        let left = self
            .roots_pending
            .fetch_sub(1, Ordering::SeqCst)
            .saturating_sub(1);
        if self.quiet {
            return;
        }

        let line = match outcome.status {
            RootStatus::Completed => format!(
                "Finished {} ({} files, {:.2}s)",
                outcome.path.display(),
                outcome.files,
                outcome.elapsed.as_secs_f64()
            ),
            RootStatus::PathNotFound => format!("Not found: {}", outcome.path.display()),
            RootStatus::Unreadable => format!("Unreadable: {}", outcome.path.display()),
        };
        let _ = self.multi.println(line);

        if left > 0 {
            self.files.set_message(format!("{left} roots remaining"));
        }
    }

    fn on_scan_end(&self) {
        if self.quiet {
            return;
        }
        self.files.finish_with_message("Scan complete");
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.files.set_message(message.to_string());
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &Path, max_len: usize) -> String {
    let full = path.display().to_string();
    if full.chars().count() <= max_len {
        return full;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
