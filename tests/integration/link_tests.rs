use dupescan::duplicates::{AddressSpace, DuplicateFinder, FinderConfig};
use dupescan::output::{write_link_scripts, LinkScript, ScriptType};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap().write_all(content).unwrap();
}

#[test]
fn test_scripts_written_per_space() {
    let data = tempdir().unwrap();
    write(&data.path().join("a/report.pdf"), b"pdf");
    write(&data.path().join("b/report.pdf"), b"pdf");
    write(&data.path().join("big1"), &[1u8; 100]);
    write(&data.path().join("big2"), &[2u8; 100]);

    let config = FinderConfig::default().with_oversize_threshold(50);
    let report = DuplicateFinder::new(config).scan_path(data.path()).unwrap();

    let out = tempdir().unwrap();
    let written = write_link_scripts(out.path(), &report, ScriptType::Posix).unwrap();

    assert_eq!(
        written,
        vec![
            out.path().join("hash").join("make_links.sh"),
            out.path().join("size").join("make_links.sh"),
        ]
    );

    let hash_script = fs::read_to_string(&written[0]).unwrap();
    assert!(hash_script.starts_with("#!/bin/sh"));
    assert!(hash_script.contains("'1_1_report.pdf'"));
    assert!(hash_script.contains("'1_2_report.pdf'"));

    let size_script = fs::read_to_string(&written[1]).unwrap();
    assert!(size_script.contains("(100 bytes)"));
    assert!(size_script.contains("'1_1_big1'"));
}

#[test]
fn test_no_scripts_without_duplicates() {
    let data = tempdir().unwrap();
    write(&data.path().join("only"), b"unique");

    let report = DuplicateFinder::with_defaults().scan_path(data.path()).unwrap();
    let out = tempdir().unwrap();
    let written = write_link_scripts(out.path(), &report, ScriptType::Posix).unwrap();

    assert!(written.is_empty());
    assert!(!out.path().join("hash").exists());
}

#[test]
fn test_powershell_script_names() {
    let data = tempdir().unwrap();
    write(&data.path().join("x.txt"), b"same");
    write(&data.path().join("y.txt"), b"same");

    let report = DuplicateFinder::with_defaults().scan_path(data.path()).unwrap();
    let out = tempdir().unwrap();
    let written = write_link_scripts(out.path(), &report, ScriptType::PowerShell).unwrap();

    assert_eq!(written, vec![out.path().join("hash").join("make_links.ps1")]);
    let script = fs::read_to_string(&written[0]).unwrap();
    assert!(script.contains("New-Item -ItemType SymbolicLink -Path '1_1_x.txt'"));
    assert!(script.contains("Write-Host"));
}

#[test]
fn test_links_follow_group_order() {
    let data = tempdir().unwrap();
    for name in ["p", "q", "r"] {
        write(&data.path().join(name), b"first group");
    }
    write(&data.path().join("s"), b"second");
    write(&data.path().join("t"), b"second");

    let report = DuplicateFinder::with_defaults().scan_path(data.path()).unwrap();
    let script = LinkScript::new(
        AddressSpace::Hash,
        report.groups(AddressSpace::Hash),
        ScriptType::Posix,
    );
    let links = script.links();

    assert_eq!(links.len(), 5);
    for (g, paths) in report.hash_duplicate_groups.values().enumerate() {
        let prefix = format!("{}_", g + 1);
        let members: Vec<&Path> = links
            .iter()
            .filter(|(name, _)| name.to_string_lossy().starts_with(&prefix))
            .map(|(_, target)| *target)
            .collect();
        assert_eq!(members, paths.iter().map(|p| p.as_path()).collect::<Vec<_>>());
    }
}

#[cfg(unix)]
#[test]
fn test_posix_script_creates_links() {
    use std::os::unix::fs::PermissionsExt;
    use std::process::Command;

    let data = tempdir().unwrap();
    write(&data.path().join("one/it's.txt"), b"quoted");
    write(&data.path().join("two/it's.txt"), b"quoted");

    let report = DuplicateFinder::with_defaults().scan_path(data.path()).unwrap();
    let out = tempdir().unwrap();
    let written = write_link_scripts(out.path(), &report, ScriptType::Posix).unwrap();

    let mode = fs::metadata(&written[0]).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);

    let status = Command::new("sh").arg(&written[0]).status().unwrap();
    assert!(status.success());

    let link = out.path().join("hash").join("1_1_it's.txt");
    assert_eq!(fs::read(&link).unwrap(), b"quoted");
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
}
