//! File logging. The terminal belongs to the UI, so nothing is written to
//! stdout or stderr while it runs.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use color_eyre::eyre::{WrapErr, eyre};
use tracing_subscriber::filter::LevelFilter;

use crate::cli::LogLevel;

pub fn default_log_path() -> Option<PathBuf> {
    backdrop_config::project_dirs().map(|dirs| dirs.data_dir().join("backdrop.log"))
}

/// Install the global subscriber, appending to `path`.
pub fn init(path: &Path, level: LogLevel) -> color_eyre::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).wrap_err_with(|| format!("creating {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_max_level(LevelFilter::from(level))
        .try_init()
        .map_err(|e| eyre!("installing log subscriber: {e}"))
}
