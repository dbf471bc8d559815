//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - The concurrent dedup registry (first-seen maps, groups, counters)
//! - The walker/worker pipeline with caller-runs saturation
//! - Scan coordination and the final report

pub mod finder;
pub mod pipeline;
pub mod registry;
pub mod report;

pub use finder::{default_worker_count, DuplicateFinder, FinderConfig, FinderError};
pub use pipeline::{FileTask, Pipeline};
pub use registry::{AddressSpace, ContentAddress, DedupRegistry, FileFailure, Registration};
pub use report::{GroupMap, RootOutcome, RootStatus, ScanReport};
