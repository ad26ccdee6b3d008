//! Logging init: appends to a file under the XDG state dir. `main` falls back
//! to stderr when that fails.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::APP_PREFIX;

const DEFAULT_FILTER: &str = "info,htwrap_core=debug,htwrap_cli=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Shared append-mode writer for `path`.
fn log_writer(path: &Path) -> Result<BoxMakeWriter> {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file: {}", path.display()))?;
    Ok(BoxMakeWriter::new(Mutex::new(file)))
}

/// Initialize structured logging to `~/.local/state/httrack-wrapper/htwrap.log`.
/// Returns Err (e.g. log dir unwritable) so the caller can fall back to stderr.
pub fn init_logging() -> Result<()> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_PREFIX)?;
    let log_file_path = xdg_dirs.place_state_file("htwrap.log")?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_writer(&log_file_path)?)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {}", e))?;

    tracing::info!("htwrap logging initialized at {}", log_file_path.display());

    Ok(())
}

/// Initialize logging to stderr only (no file).
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}
