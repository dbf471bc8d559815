//! Concurrent dedup registry.
//!
//! # Overview
//!
//! The registry maps content addresses to the first path that produced them
//! and collects every later path with the same address into a duplicate
//! group. It is shared by reference between all walker and worker threads of
//! one scan and mutated without a global lock:
//!
//! - first-seen maps and groups are [`DashMap`]s, one pair per
//!   [`AddressSpace`], so a hash key and a size key with the same text never
//!   collide
//! - counters are atomics
//!
//! For any one address exactly one [`DedupRegistry::put`] call observes
//! `None`. Which racing task wins is not deterministic.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

/// Key space of a content address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressSpace {
    /// Key is the lowercase hex digest of the full content.
    Hash,
    /// Key is the decimal byte length of an oversized file.
    Size,
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hash => f.write_str("hash"),
            Self::Size => f.write_str("size"),
        }
    }
}

/// A content address: key plus the space it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentAddress {
    /// Which table the key belongs to
    pub space: AddressSpace,
    /// Hex digest or decimal length
    pub key: String,
}

impl ContentAddress {
    /// Hash-space address from a hex digest.
    #[must_use]
    pub fn hash(hex: impl Into<String>) -> Self {
        Self {
            space: AddressSpace::Hash,
            key: hex.into(),
        }
    }

    /// Size-space address from a byte length.
    #[must_use]
    pub fn size(len: u64) -> Self {
        Self {
            space: AddressSpace::Size,
            key: len.to_string(),
        }
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.space, self.key)
    }
}

/// Outcome of registering a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The path is the first holder of its address.
    First,
    /// The address was already held; `first` is the path holding it.
    Duplicate {
        /// Path that registered the address first
        first: PathBuf,
    },
}

impl Registration {
    /// Whether this registration was a collision.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// A file that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FileFailure {
    /// Path of the file
    pub path: PathBuf,
    /// Human-readable cause
    pub reason: String,
}

#[derive(Debug, Default)]
struct SpaceTable {
    first_seen: DashMap<String, PathBuf>,
    groups: DashMap<String, HashSet<PathBuf>>,
}

impl SpaceTable {
    fn snapshot_groups(&self) -> BTreeMap<String, BTreeSet<PathBuf>> {
        self.groups
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    entry.value().iter().cloned().collect(),
                )
            })
            .collect()
    }
}

/// Shared dedup state for one scan.
#[derive(Debug, Default)]
pub struct DedupRegistry {
    hash: SpaceTable,
    size: SpaceTable,
    duplicates: AtomicUsize,
    failures: AtomicUsize,
    failure_list: Mutex<Vec<FileFailure>>,
}

impl DedupRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, space: AddressSpace) -> &SpaceTable {
        match space {
            AddressSpace::Hash => &self.hash,
            AddressSpace::Size => &self.size,
        }
    }

    /// Claim `address` for `path` unless it is already held.
    ///
    /// Returns `None` if `path` became the first holder, or the current
    /// holder otherwise. The first holder is never replaced.
    pub fn put(&self, address: &ContentAddress, path: &Path) -> Option<PathBuf> {
        match self.table(address.space).first_seen.entry(address.key.clone()) {
            Entry::Occupied(held) => Some(held.get().clone()),
            Entry::Vacant(slot) => {
                slot.insert(path.to_path_buf());
                None
            }
        }
    }

    /// Record `path` under `address`: claim it, or count a duplicate and add
    /// both paths to the address's group.
    pub fn register(&self, address: &ContentAddress, path: &Path) -> Registration {
        let Some(first) = self.put(address, path) else {
            return Registration::First;
        };

        self.duplicates.fetch_add(1, Ordering::Relaxed);

        let mut group = self
            .table(address.space)
            .groups
            .entry(address.key.clone())
            .or_default();
        group.insert(first.clone());
        group.insert(path.to_path_buf());
        drop(group);

        log::trace!("Duplicate {}: {}", address, path.display());
        Registration::Duplicate { first }
    }

    /// Count a failed file and keep its reason for the report.
    pub fn record_failure(&self, path: &Path, reason: impl Into<String>) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.failure_list
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FileFailure {
                path: path.to_path_buf(),
                reason: reason.into(),
            });
    }

    /// Number of distinct addresses across both spaces.
    #[must_use]
    pub fn unique_count(&self) -> usize {
        self.hash.first_seen.len() + self.size.first_seen.len()
    }

    /// Number of collisions.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.load(Ordering::Relaxed)
    }

    /// Number of failed files.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    /// First path registered for `address`.
    #[must_use]
    pub fn first_path(&self, address: &ContentAddress) -> Option<PathBuf> {
        self.table(address.space)
            .first_seen
            .get(&address.key)
            .map(|p| p.value().clone())
    }

    /// Duplicate group for `address`, if any collision happened.
    #[must_use]
    pub fn group(&self, address: &ContentAddress) -> Option<BTreeSet<PathBuf>> {
        self.table(address.space)
            .groups
            .get(&address.key)
            .map(|g| g.value().iter().cloned().collect())
    }

    /// All duplicate groups of one space, ordered by key.
    #[must_use]
    pub fn groups(&self, space: AddressSpace) -> BTreeMap<String, BTreeSet<PathBuf>> {
        self.table(space).snapshot_groups()
    }

    /// Recorded failures, ordered by path.
    #[must_use]
    pub fn failures(&self) -> Vec<FileFailure> {
        let mut list = self
            .failure_list
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        list.sort();
        list
    }
}
