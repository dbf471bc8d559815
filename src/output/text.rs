//! Human-readable scan summary.

use std::io::Write;

use bytesize::ByteSize;

use crate::duplicates::{AddressSpace, RootStatus, ScanReport};
use crate::scanner::HashAlgorithm;

/// Plain-text formatter for a [`ScanReport`].
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    report: &'a ScanReport,
    algorithm: HashAlgorithm,
}

impl<'a> TextOutput<'a> {
    /// Create a text formatter.
    #[must_use]
    pub fn new(report: &'a ScanReport, algorithm: HashAlgorithm) -> Self {
        Self { report, algorithm }
    }

    /// Write the summary.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let r = self.report;

        writeln!(
            w,
            "Scanned {} files in {:.2}s: {} unique, {} duplicates, {} failures",
            r.total_count,
            r.duration.as_secs_f64(),
            r.unique_count,
            r.duplicate_count,
            r.failure_count
        )?;

        if !r.roots.is_empty() {
            writeln!(w)?;
            writeln!(w, "Roots:")?;
            for root in &r.roots {
                match root.status {
                    RootStatus::Completed => writeln!(
                        w,
                        "  {}  {} files ({} hashed by walker)  {:.2}s",
                        root.path.display(),
                        root.files,
                        root.inline_tasks,
                        root.elapsed.as_secs_f64()
                    )?,
                    RootStatus::PathNotFound => {
                        writeln!(w, "  {}  not found", root.path.display())?;
                    }
                    RootStatus::Unreadable => {
                        writeln!(w, "  {}  unreadable", root.path.display())?;
                    }
                }
            }
        }

        self.write_groups(w, AddressSpace::Hash)?;
        self.write_groups(w, AddressSpace::Size)?;

        if !r.failures.is_empty() {
            writeln!(w)?;
            writeln!(w, "Failures: {}", r.failures.len())?;
            for failure in &r.failures {
                writeln!(w, "  {}: {}", failure.path.display(), failure.reason)?;
            }
        }

        if !r.has_duplicates() {
            writeln!(w)?;
            writeln!(w, "No duplicates found.")?;
        }
        Ok(())
    }

    fn write_groups<W: Write>(&self, w: &mut W, space: AddressSpace) -> std::io::Result<()> {
        let groups = self.report.groups(space);
        if groups.is_empty() {
            return Ok(());
        }

        writeln!(w)?;
        match space {
            AddressSpace::Hash => writeln!(w, "Identical content ({}): {} groups", self.algorithm, groups.len())?,
            AddressSpace::Size => writeln!(
                w,
                "Oversized files with equal size (content not compared): {} groups",
                groups.len()
            )?,
        }

        for (i, (key, paths)) in groups.iter().enumerate() {
            let label = match (space, key.parse::<u64>()) {
                (AddressSpace::Size, Ok(bytes)) => ByteSize::b(bytes).to_string(),
                _ => key.clone(),
            };
            writeln!(w, "  [{}] {}  ({} files)", i + 1, label, paths.len())?;
            for path in paths {
                writeln!(w, "      {}", path.display())?;
            }
        }
        Ok(())
    }
}
