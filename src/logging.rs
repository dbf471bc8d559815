//! Logging setup for the `dupescan` binary.
//!
//! The library only emits through the `log` facade; this module wires the
//! `env_logger` backend. Level selection, highest priority first:
//!
//! 1. `RUST_LOG`
//! 2. `-q` (errors only)
//! 3. `-vv` (trace), `-v` (debug)
//! 4. info
//!
//! At debug level and above every line carries the emitting thread name, so
//! walker and worker activity can be told apart.

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Initialize logging from CLI verbosity flags.
///
/// Calling it again is harmless: the first logger stays installed.
///
/// # Example
///
/// ```rust,no_run
/// use dupescan::logging::init_logging;
///
/// init_logging(1, false);
/// log::debug!("visible with -v");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) {
    let from_env = env::var("RUST_LOG").is_ok();
    let mut builder = Builder::new();

    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return;
    }
    log::debug!(
        "Logging initialized at level {} ({})",
        current_level_name(),
        if from_env { "RUST_LOG" } else { "flags" }
    );
}

fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        let timestamp = buf.timestamp_millis();

        if verbose == 0 {
            return writeln!(buf, "{timestamp} {style}{level:<5}{style:#} {}", record.args());
        }

        let thread = std::thread::current();
        writeln!(
            buf,
            "{timestamp} {style}{level:<5}{style:#} [{}] ({}) {}",
            record.module_path().unwrap_or("unknown"),
            thread.name().unwrap_or("main"),
            record.args()
        )
    });

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let style = buf.default_level_style(level);
            writeln!(buf, "{style}{level:<5}{style:#} {}", record.args())
        });
    }
}

/// Name of the active maximum log level.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
