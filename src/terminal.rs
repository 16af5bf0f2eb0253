//! Terminal concerns: log routing and the record progress bar.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

/// Where log lines go and at what level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogTarget<'a> {
    /// Filter directive used when `RUST_LOG` does not apply.
    pub level: &'a str,
    /// Ignore `RUST_LOG` because the level came from a command line flag.
    pub force_cli_level: bool,
    /// Append to this file instead of stderr.
    pub path: Option<&'a Path>,
}

/// Picks the filter level: flags, then the config file, then `info`.
///
/// Returns the level and whether it came from a flag.
pub(crate) fn resolve_log_level<'a>(quiet: bool, verbose: u8, configured: Option<&'a str>) -> (&'a str, bool) {
    if quiet {
        return ("error", true);
    }
    match verbose {
        0 => (configured.unwrap_or("info"), false),
        1 => ("debug", true),
        _ => ("trace", true),
    }
}

pub(crate) fn init_tracing(target: &LogTarget<'_>) -> Result<()> {
    let filter = if target.force_cli_level {
        tracing_subscriber::EnvFilter::new(target.level)
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(target.level))
    };

    if let Some(path) = target.path {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        let _ = tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(filter)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .try_init();
    }
    Ok(())
}

pub(crate) fn should_show_progress(stderr_is_terminal: bool, quiet: bool) -> bool {
    stderr_is_terminal && !quiet
}

/// Progress bar over `total` records, or a hidden one.
pub(crate) fn record_progress(visible: bool, total: usize) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} records {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}
