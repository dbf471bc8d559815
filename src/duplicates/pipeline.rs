//! Walker/worker pipeline.
//!
//! # Overview
//!
//! One walker thread per root produces [`FileTask`]s into a bounded
//! crossbeam channel; a fixed pool of worker threads consumes them. Each
//! task reads one file, computes its content address and registers it.
//!
//! ```text
//!  root A ── walker ──┐                  ┌── worker 0 ─┐
//!  root B ── walker ──┼── bounded(cap) ──┼── worker 1 ─┼── DedupRegistry
//!  root C ── walker ──┘        │         └── worker N ─┘
//!                              └─ full: walker runs the task itself
//! ```
//!
//! # Saturation
//!
//! Walkers never block on the queue. When `try_send` fails the walker runs
//! the task inline with its own [`Hasher`]. A capacity of 0 makes the
//! channel a rendezvous: a task is handed off only to an idle worker.
//!
//! # Completion
//!
//! Every task carries a clone of its root's [`WaitGroup`]. A walker drops
//! its own handle after the walk and waits, so its thread ends only when the
//! root's last task has finished. The pipeline joins all walkers, then closes
//! the channel and joins the workers.
//!
//! # Panics in tasks
//!
//! A panic while executing a task (for example in a progress callback) is
//! caught where the task runs. The first payload is kept, every later task is
//! skipped so queued tokens are still released, and [`Pipeline::run`]
//! re-raises the payload once both phases have finished.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Instant;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use crossbeam::sync::WaitGroup;

use super::registry::{ContentAddress, DedupRegistry};
use super::report::{RootOutcome, RootStatus};
use super::FinderConfig;
use crate::progress::ProgressCallback;
use crate::scanner::{FileContent, FileReader, Hasher, ScanError, Walker};

/// One file to read, hash and register.
#[derive(Debug)]
pub struct FileTask {
    /// Absolute file path
    pub path: PathBuf,
    /// Held until the task finishes; releases the producing root.
    _root_token: WaitGroup,
}

impl FileTask {
    fn new(path: PathBuf, root_token: &WaitGroup) -> Self {
        Self {
            path,
            _root_token: root_token.clone(),
        }
    }
}

/// A single scan's walkers and worker pool.
pub struct Pipeline<'a> {
    registry: &'a DedupRegistry,
    config: &'a FinderConfig,
    reader: FileReader,
    processed: AtomicUsize,
    panicked: AtomicBool,
    panic_payload: Mutex<Option<Box<dyn Any + Send>>>,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline feeding `registry`.
    #[must_use]
    pub fn new(registry: &'a DedupRegistry, config: &'a FinderConfig) -> Self {
        Self {
            registry,
            config,
            reader: FileReader::new(config.oversize_threshold),
            processed: AtomicUsize::new(0),
            panicked: AtomicBool::new(false),
            panic_payload: Mutex::new(None),
        }
    }

    /// Files processed so far.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    fn progress(&self) -> Option<&dyn ProgressCallback> {
        self.config.progress_callback.as_deref()
    }

    fn shutdown_flag(&self) -> Option<&Arc<AtomicBool>> {
        self.config.shutdown_flag.as_ref()
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk all `roots` concurrently and process every file found.
    ///
    /// Returns one outcome per root, in input order, once every walker and
    /// every task has finished.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a thread cannot be spawned. Threads already
    /// running are still joined before returning.
    ///
    /// # Panics
    ///
    /// Re-raises the first panic caught while executing a task, after every
    /// thread has been joined.
    pub fn run(&self, roots: &[PathBuf]) -> std::io::Result<Vec<RootOutcome>> {
        let worker_count = self.config.worker_count.max(1);
        let capacity = self.config.effective_queue_capacity();

        log::info!(
            "Starting pipeline: {} roots, {} workers, queue capacity {}",
            roots.len(),
            worker_count,
            capacity
        );

        thread::scope(|s| {
            let (tx, rx) = channel::bounded::<FileTask>(capacity);

            let mut workers = Vec::with_capacity(worker_count);
            for id in 0..worker_count {
                let rx = rx.clone();
                let handle = thread::Builder::new()
                    .name(format!("dupescan-worker-{id}"))
                    .spawn_scoped(s, move || self.worker_loop(&rx))?;
                workers.push(handle);
            }
            drop(rx);

            let mut walkers = Vec::with_capacity(roots.len());
            for (id, root) in roots.iter().enumerate() {
                let tx = tx.clone();
                let handle = thread::Builder::new()
                    .name(format!("dupescan-walker-{id}"))
                    .spawn_scoped(s, move || self.walk_root(root, tx))?;
                walkers.push(handle);
            }

            // Phase 1: every walker and every task it produced.
            let outcomes: Vec<RootOutcome> = walkers
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect();

            // Phase 2: close the queue and retire the pool.
            drop(tx);
            for h in workers {
                h.join().unwrap_or_else(|e| std::panic::resume_unwind(e));
            }

            if let Some(payload) = self.take_panic() {
                log::error!("Pipeline aborted by a panic in a task");
                panic::resume_unwind(payload);
            }

            log::info!(
                "Pipeline finished: {} files processed",
                self.processed()
            );
            Ok(outcomes)
        })
    }

    fn worker_loop(&self, rx: &Receiver<FileTask>) {
        let mut hasher = Hasher::new(self.config.algorithm);
        for task in rx {
            self.run_task(&task, &mut hasher);
        }
    }

    /// Execute `task`, keeping the first panic instead of unwinding.
    fn run_task(&self, task: &FileTask, hasher: &mut Hasher) {
        if self.panicked.load(Ordering::SeqCst) {
            return;
        }
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.execute(task, hasher))) {
            self.panicked.store(true, Ordering::SeqCst);
            let mut slot = self
                .panic_payload
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(payload);
            }
        }
    }

    fn take_panic(&self) -> Option<Box<dyn Any + Send>> {
        self.panic_payload
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn walk_root(&self, root: &Path, tx: Sender<FileTask>) -> RootOutcome {
        let started = Instant::now();
        if let Some(progress) = self.progress() {
            progress.on_root_start(root);
        }

        let root_done = WaitGroup::new();
        let mut hasher = Hasher::new(self.config.algorithm);
        let mut inline_tasks = 0usize;

        let mut walker = Walker::new(root, self.config.walker_config.clone());
        if let Some(flag) = self.shutdown_flag() {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let result = walker.walk(|path| {
            let task = FileTask::new(path, &root_done);
            match tx.try_send(task) {
                Ok(()) => {}
                Err(TrySendError::Full(task) | TrySendError::Disconnected(task)) => {
                    inline_tasks += 1;
                    self.run_task(&task, &mut hasher);
                }
            }
        });
        drop(tx);
        root_done.wait();

        let outcome = match result {
            Ok(stats) => RootOutcome {
                path: root.to_path_buf(),
                status: RootStatus::Completed,
                files: stats.files,
                inline_tasks,
                elapsed: started.elapsed(),
            },
            // The root changed between validation and walking.
            Err(e @ ScanError::NotFound(_)) => {
                log::warn!("{}", e);
                RootOutcome::missing(root)
            }
            Err(e @ ScanError::Io { .. }) => {
                log::warn!("Cannot walk root: {}", e);
                RootOutcome::unreadable(root)
            }
        };

        log::debug!(
            "Root {} done: {} files, {} inline, {:.3}s",
            root.display(),
            outcome.files,
            outcome.inline_tasks,
            outcome.elapsed.as_secs_f64()
        );
        if let Some(progress) = self.progress() {
            progress.on_root_end(&outcome);
        }
        outcome
    }

    /// Read, address and register one file.
    fn execute(&self, task: &FileTask, hasher: &mut Hasher) {
        if self.is_shutdown_requested() {
            return;
        }

        let path = task.path.as_path();
        match self.reader.read(path) {
            Ok(FileContent::Oversized { size }) => {
                self.registry.register(&ContentAddress::size(size), path);
            }
            Ok(FileContent::Bytes(bytes)) => {
                if self.is_shutdown_requested() {
                    return;
                }
                let hex = hasher.digest_hex(&bytes);
                self.registry.register(&ContentAddress::hash(hex), path);
            }
            Err(e) => {
                log::warn!("{}", e);
                self.registry.record_failure(path, e.to_string());
            }
        }

        let processed = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(progress) = self.progress() {
            progress.on_file_processed(processed, path);
        }
    }
}
