//! dupescan - concurrent duplicate file scanner.
//!
//! Walks one or more roots, reads and hashes every regular file on a bounded
//! worker pool and reports groups of byte-identical files. Files too large to
//! buffer are grouped by size instead.
//!
//! The library entry point is [`duplicates::DuplicateFinder`]; the binary
//! wraps it with [`run_app`].

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;
use crate::output::{write_link_scripts, JsonOutput, TextOutput};
use crate::progress::Progress;

/// Run the CLI and return the process exit code.
///
/// # Errors
///
/// Returns an error for invalid configuration, a failed scan or failed
/// output. An interrupted scan surfaces as
/// [`FinderError::Interrupted`](duplicates::FinderError::Interrupted).
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Scan(ref args) => run_scan(args, cli.config.as_deref(), cli.quiet),
    }
}

fn run_scan(args: &ScanArgs, config_path: Option<&Path>, quiet: bool) -> Result<ExitCode> {
    let mut config = Config::load(config_path).context("Failed to load configuration")?;
    config.apply_scan_args(args);
    log::debug!("Effective configuration: {:?}", config);

    let handler = signal::install_handler()?;
    let mut finder_config = config
        .to_finder_config()?
        .with_shutdown_flag(handler.get_flag());

    if !quiet && args.output == OutputFormat::Text {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }
    let algorithm = finder_config.algorithm;

    let report = DuplicateFinder::new(finder_config).scan(&args.paths)?;
    let exit_code = ExitCode::for_report(&report);

    if let Some(ref dir) = args.link_script {
        let written = write_link_scripts(dir, &report, args.script_type.resolve())?;
        if written.is_empty() {
            log::info!("No duplicate groups, no link scripts written");
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text if quiet => {}
        OutputFormat::Text => TextOutput::new(&report, algorithm).write_to(&mut out)?,
        OutputFormat::Json => JsonOutput::new(&report, algorithm, exit_code).write_to(&mut out, true)?,
    }
    out.flush()?;

    Ok(exit_code)
}
