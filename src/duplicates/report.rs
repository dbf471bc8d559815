//! Scan report assembled after both completion phases.
//!
//! The report is a read-only snapshot of the registry plus per-root
//! outcomes. It is `Serialize` so the JSON output can embed it as is.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Serialize, Serializer};

use super::registry::{AddressSpace, DedupRegistry, FileFailure};

/// Duplicate groups of one space: content key to member paths.
pub type GroupMap = BTreeMap<String, BTreeSet<PathBuf>>;

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// How a root finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootStatus {
    /// Walker finished and all of its tasks completed.
    Completed,
    /// Root did not exist; nothing was scanned for it.
    PathNotFound,
    /// Root exists but could not be accessed; nothing was scanned for it.
    Unreadable,
}

/// Per-root result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootOutcome {
    /// Root as given by the caller
    pub path: PathBuf,
    /// Final status
    pub status: RootStatus,
    /// Regular files the walker discovered
    pub files: usize,
    /// Tasks the walker ran itself because the queue was full
    pub inline_tasks: usize,
    /// Time until the root's last task finished
    #[serde(serialize_with = "as_secs")]
    pub elapsed: Duration,
}

impl RootOutcome {
    /// Outcome for a root that does not exist.
    #[must_use]
    pub fn missing(path: &Path) -> Self {
        Self::skipped(path, RootStatus::PathNotFound)
    }

    /// Outcome for a root whose metadata could not be read.
    #[must_use]
    pub fn unreadable(path: &Path) -> Self {
        Self::skipped(path, RootStatus::Unreadable)
    }

    fn skipped(path: &Path, status: RootStatus) -> Self {
        Self {
            path: path.to_path_buf(),
            status,
            files: 0,
            inline_tasks: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Whether the root was scanned.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == RootStatus::Completed
    }
}

/// Aggregate result of a scan.
///
/// `total_count == unique_count + duplicate_count + failure_count` always
/// holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanReport {
    /// Distinct addresses across both spaces
    pub unique_count: usize,
    /// Files whose address was already held
    pub duplicate_count: usize,
    /// Files that could not be read
    pub failure_count: usize,
    /// Every file processed
    pub total_count: usize,
    /// Groups of byte-identical files, keyed by hex digest
    pub hash_duplicate_groups: GroupMap,
    /// Groups of oversized files with equal length, keyed by byte count
    pub size_duplicate_groups: GroupMap,
    /// Files that failed, ordered by path
    pub failures: Vec<FileFailure>,
    /// Per-root outcomes in input order
    pub roots: Vec<RootOutcome>,
    /// Wall time of the whole scan
    #[serde(serialize_with = "as_secs")]
    pub duration: Duration,
}

impl ScanReport {
    /// Snapshot a registry whose scan has fully completed.
    #[must_use]
    pub fn from_registry(
        registry: &DedupRegistry,
        roots: Vec<RootOutcome>,
        duration: Duration,
    ) -> Self {
        let unique_count = registry.unique_count();
        let duplicate_count = registry.duplicate_count();
        let failure_count = registry.failure_count();

        Self {
            unique_count,
            duplicate_count,
            failure_count,
            total_count: unique_count + duplicate_count + failure_count,
            hash_duplicate_groups: registry.groups(AddressSpace::Hash),
            size_duplicate_groups: registry.groups(AddressSpace::Size),
            failures: registry.failures(),
            roots,
            duration,
        }
    }

    /// Groups of one space.
    #[must_use]
    pub fn groups(&self, space: AddressSpace) -> &GroupMap {
        match space {
            AddressSpace::Hash => &self.hash_duplicate_groups,
            AddressSpace::Size => &self.size_duplicate_groups,
        }
    }

    /// Whether any duplicate was found in either space.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.duplicate_count > 0
    }

    /// Number of groups across both spaces.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.hash_duplicate_groups.len() + self.size_duplicate_groups.len()
    }

    /// Roots that were not found.
    pub fn missing_roots(&self) -> impl Iterator<Item = &Path> {
        self.roots
            .iter()
            .filter(|r| r.status == RootStatus::PathNotFound)
            .map(|r| r.path.as_path())
    }

    /// Roots that exist but could not be accessed.
    pub fn unreadable_roots(&self) -> impl Iterator<Item = &Path> {
        self.roots
            .iter()
            .filter(|r| r.status == RootStatus::Unreadable)
            .map(|r| r.path.as_path())
    }

    /// Whether some files failed or some roots were not scanned.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.failure_count > 0 || self.roots.iter().any(|r| !r.is_completed())
    }
}
