use clap::Parser;
use dupescan::cli::Cli;
use dupescan::duplicates::FinderError;
use dupescan::error::ExitCode;
use dupescan::run_app;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let argv = std::iter::once("dupescan").chain(args.iter().copied());
    run_app(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_exit_code_with_duplicates() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"same");
    write(&dir.path().join("b"), b"same");

    let code = run(&["-q", "scan", dir.path().to_str().unwrap()]).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_exit_code_without_duplicates() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"one");
    write(&dir.path().join("b"), b"two");

    let code = run(&["-q", "scan", dir.path().to_str().unwrap()]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_exit_code_partial_with_missing_root() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"one");
    let missing = dir.path().join("missing");

    let code = run(&[
        "-q",
        "scan",
        dir.path().to_str().unwrap(),
        missing.to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(code, ExitCode::PartialSuccess);
}

#[test]
fn test_all_roots_missing_is_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");

    let err = run(&["-q", "scan", missing.to_str().unwrap()]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<FinderError>(),
        Some(FinderError::PathNotFound(_))
    ));
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_unknown_algorithm_is_error() {
    let dir = tempdir().unwrap();

    let err = run(&["-q", "scan", "-a", "crc32", dir.path().to_str().unwrap()]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<FinderError>(),
        Some(FinderError::DigestUnavailable(name)) if name == "crc32"
    ));
}

#[test]
fn test_missing_config_file_is_error() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("nope.toml");

    let err = run(&[
        "-q",
        "--config",
        config.to_str().unwrap(),
        "scan",
        dir.path().to_str().unwrap(),
    ])
    .unwrap_err();
    assert!(format!("{err:#}").contains("Config file not found"));
}

#[test]
fn test_json_output_and_link_scripts() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"same");
    write(&dir.path().join("b"), b"same");
    let links = tempdir().unwrap();

    let code = run(&[
        "-q",
        "scan",
        "--output",
        "json",
        "--workers",
        "2",
        "--queue-capacity",
        "0",
        "--link-script",
        links.path().to_str().unwrap(),
        "--script-type",
        "posix",
        dir.path().to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    let script = links.path().join("hash").join("make_links.sh");
    assert!(fs::read_to_string(script).unwrap().contains("ln -sf"));
    assert!(!links.path().join("size").exists());
}
