//! Logging initialisation via tracing-subscriber.
//!
//! The TUI owns the terminal, so interactive sessions log to a file. One-shot
//! commands log to stderr.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Initialise the global tracing subscriber. `RUST_LOG` wins over `level`.
pub fn init(level: &str, target: LogTarget) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| anyhow!("invalid log level '{level}': {e}"))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match target {
        LogTarget::Stderr => builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!("failed to set subscriber: {e}"))?,
        LogTarget::File(path) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(open_log_file(&path)?))
            .try_init()
            .map_err(|e| anyhow!("failed to set subscriber: {e}"))?,
    }

    Ok(())
}

/// Where interactive sessions write their log.
pub fn log_file_path() -> Result<PathBuf> {
    let dir = dirs::cache_dir()
        .or_else(dirs::config_dir)
        .ok_or_else(|| anyhow!("Could not determine a directory for the log file"))?;
    Ok(dir.join("juris").join("juris.log"))
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Parse a log level string, rejecting unknown values.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    if level.is_empty() {
        return Err(anyhow!("log level must not be empty"));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| anyhow!("unrecognised log level: '{level}'"))
}
