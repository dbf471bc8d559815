//! Link script generation for duplicate groups.
//!
//! For each address space that has groups, a script is written into
//! `DIR/hash/` or `DIR/size/`. Running it creates one symbolic link per group
//! member next to the script, named `<group>_<member>_<file name>`, so that
//! all copies of a group sort together in a file browser.
//!
//! Scripts only create links; they never touch the original files.
//!
//! POSIX scripts on unix carry paths as raw bytes, so names that are not
//! valid UTF-8 still link correctly. A path the script type cannot express
//! is left out, listed as a comment in the script and logged as not linked.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dupescan::duplicates::DuplicateFinder;
//! use dupescan::output::script::{write_link_scripts, ScriptType};
//! use std::path::Path;
//!
//! let report = DuplicateFinder::with_defaults().scan_path(Path::new(".")).unwrap();
//! let written = write_link_scripts(Path::new("links"), &report, ScriptType::detect()).unwrap();
//! for path in written {
//!     println!("wrote {}", path.display());
//! }
//! ```

use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::duplicates::{AddressSpace, GroupMap, ScanReport};

/// Type of script to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    /// POSIX-compliant shell script (sh/bash/zsh)
    Posix,
    /// Windows PowerShell script
    PowerShell,
}

impl ScriptType {
    /// Detect the appropriate script type for the current platform.
    #[must_use]
    pub fn detect() -> Self {
        if cfg!(windows) {
            Self::PowerShell
        } else {
            Self::Posix
        }
    }

    /// Script file name.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Posix => "make_links.sh",
            Self::PowerShell => "make_links.ps1",
        }
    }
}

/// Errors that can occur while writing link scripts.
#[derive(thiserror::Error, Debug)]
pub enum LinkScriptError {
    /// A directory or script file could not be written.
    #[error("Failed to write link script {path}: {source}")]
    Io {
        /// Path being written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Link script for the groups of one address space.
#[derive(Debug, Clone, Copy)]
pub struct LinkScript<'a> {
    /// Space the groups belong to
    pub space: AddressSpace,
    /// Groups to link
    pub groups: &'a GroupMap,
    /// The type of script to generate
    pub script_type: ScriptType,
}

impl<'a> LinkScript<'a> {
    /// Create a link script for `groups`.
    #[must_use]
    pub fn new(space: AddressSpace, groups: &'a GroupMap, script_type: ScriptType) -> Self {
        Self {
            space,
            groups,
            script_type,
        }
    }

    /// `(link name, target)` pairs, in group then member order.
    #[must_use]
    pub fn links(&self) -> Vec<(OsString, &'a Path)> {
        let mut links = Vec::new();
        for (g, paths) in self.groups.values().enumerate() {
            for (m, path) in paths.iter().enumerate() {
                let mut name = OsString::from(format!("{}_{}_", g + 1, m + 1));
                name.push(path.file_name().unwrap_or_else(|| OsStr::new("file")));
                links.push((name, path.as_path()));
            }
        }
        links
    }

    /// Targets this script type cannot express; they are not linked.
    #[must_use]
    pub fn unlinkable(&self) -> Vec<&'a Path> {
        self.links()
            .into_iter()
            .filter(|(name, target)| self.quote_pair(name, target).is_none())
            .map(|(_, target)| target)
            .collect()
    }

    fn quote(&self, s: &OsStr) -> Option<Vec<u8>> {
        match self.script_type {
            ScriptType::Posix => os_bytes(s).map(quote_posix),
            ScriptType::PowerShell => s.to_str().map(|s| escape_powershell(s).into_bytes()),
        }
    }

    fn quote_pair(&self, name: &OsStr, target: &Path) -> Option<(Vec<u8>, Vec<u8>)> {
        Some((self.quote(name)?, self.quote(target.as_os_str())?))
    }

    fn group_label(&self, key: &str) -> String {
        match self.space {
            AddressSpace::Hash => format!("content {key}"),
            AddressSpace::Size => match key.parse::<u64>() {
                Ok(bytes) => format!("size {} ({bytes} bytes)", bytesize::ByteSize::b(bytes)),
                Err(_) => format!("size {key}"),
            },
        }
    }

    /// Write the script to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match self.script_type {
            ScriptType::Posix => self.write_posix(writer),
            ScriptType::PowerShell => self.write_powershell(writer),
        }
    }

    fn write_header<W: Write>(&self, writer: &mut W, shebang: Option<&str>) -> std::io::Result<()> {
        if let Some(line) = shebang {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer, "# dupescan duplicate links ({} space)", self.space)?;
        writeln!(
            writer,
            "# Generated on: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(
            writer,
            "# Groups: {}, files: {}",
            self.groups.len(),
            self.groups.values().map(|g| g.len()).sum::<usize>()
        )?;
        writeln!(writer, "# Creates links next to this script. Originals are not modified.")?;
        writeln!(writer)
    }

    fn write_posix<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.write_header(writer, Some("#!/bin/sh"))?;
        writeln!(writer, "cd \"$(dirname \"$0\")\" || exit 1")?;
        writeln!(writer, "LINKED=0")?;
        writeln!(writer)?;

        self.write_links(writer, |w, name, target| {
            w.write_all(b"ln -sf ")?;
            w.write_all(target)?;
            w.write_all(b" ")?;
            w.write_all(name)?;
            w.write_all(b" && LINKED=$((LINKED + 1))\n")
        })?;

        writeln!(writer, "echo \"Created $LINKED links.\"")
    }

    fn write_powershell<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.write_header(writer, None)?;
        writeln!(writer, "Set-Location -LiteralPath $PSScriptRoot")?;
        writeln!(writer, "$Linked = 0")?;
        writeln!(writer)?;

        self.write_links(writer, |w, name, target| {
            w.write_all(b"New-Item -ItemType SymbolicLink -Path ")?;
            w.write_all(name)?;
            w.write_all(b" -Target ")?;
            w.write_all(target)?;
            w.write_all(b" -Force | Out-Null\n")?;
            writeln!(w, "if ($?) {{ $Linked++ }}")
        })?;

        writeln!(writer, "Write-Host \"Created $Linked links.\"")
    }

    /// Write every group, emitting one link command per expressible member.
    fn write_links<W, F>(&self, writer: &mut W, mut emit: F) -> std::io::Result<()>
    where
        W: Write,
        F: FnMut(&mut W, &[u8], &[u8]) -> std::io::Result<()>,
    {
        let links = self.links();
        let mut links = links.iter();
        for (key, paths) in self.groups {
            writeln!(writer, "# {}", self.group_label(key))?;
            for (name, target) in links.by_ref().take(paths.len()) {
                match self.quote_pair(name, target) {
                    Some((name, target)) => emit(writer, &name, &target)?,
                    None => writeln!(writer, "# not linked: {}", target.display())?,
                }
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

/// Write one script per non-empty space under `dir`.
///
/// Returns the paths of the scripts written.
///
/// # Errors
///
/// Returns [`LinkScriptError::Io`] if a directory or file cannot be written.
pub fn write_link_scripts(
    dir: &Path,
    report: &ScanReport,
    script_type: ScriptType,
) -> Result<Vec<PathBuf>, LinkScriptError> {
    let mut written = Vec::new();

    for space in [AddressSpace::Hash, AddressSpace::Size] {
        let groups = report.groups(space);
        if groups.is_empty() {
            continue;
        }

        let space_dir = dir.join(space.to_string());
        let script_path = space_dir.join(script_type.file_name());
        let io_err = |source| LinkScriptError::Io {
            path: script_path.clone(),
            source,
        };

        let script = LinkScript::new(space, groups, script_type);
        for path in script.unlinkable() {
            log::warn!(
                "Not linked, path cannot be written to a {:?} script: {}",
                script_type,
                path.display()
            );
        }

        fs::create_dir_all(&space_dir).map_err(io_err)?;
        let mut writer = BufWriter::new(File::create(&script_path).map_err(io_err)?);
        script
            .write_to(&mut writer)
            .and_then(|()| writer.flush())
            .map_err(io_err)?;
        drop(writer);

        #[cfg(unix)]
        if script_type == ScriptType::Posix {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&script_path, fs::Permissions::from_mode(0o755)).map_err(io_err)?;
        }

        log::info!("Wrote {} link script: {}", space, script_path.display());
        written.push(script_path);
    }

    Ok(written)
}

/// Raw bytes of an OS string; on unix any name is representable.
#[cfg(unix)]
fn os_bytes(s: &OsStr) -> Option<&[u8]> {
    use std::os::unix::ffi::OsStrExt;
    Some(s.as_bytes())
}

#[cfg(not(unix))]
fn os_bytes(s: &OsStr) -> Option<&[u8]> {
    s.to_str().map(str::as_bytes)
}

/// Quote for POSIX sh: single quotes, embedded `'` as `'\''`. Any other byte
/// is literal inside single quotes.
fn quote_posix(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.push(b'\'');
    for &b in bytes {
        if b == b'\'' {
            out.extend_from_slice(b"'\\''");
        } else {
            out.push(b);
        }
    }
    out.push(b'\'');
    out
}

/// Quote for PowerShell: single quotes, embedded `'` doubled.
fn escape_powershell(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
