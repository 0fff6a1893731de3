//! TOML config file loading.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::options::OptionsPatch;

const CONFIG_FILE: &str = "config.toml";

/// Project directories for backdrop, if the platform provides a home.
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "backdrop")
}

/// Default config file location, e.g. `~/.config/backdrop/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Parse a patch from TOML text.
pub fn parse_patch(text: &str, path: &Path) -> Result<OptionsPatch, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a patch from `path`.
pub fn load_patch(path: &Path) -> Result<OptionsPatch, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let patch = parse_patch(&text, path)?;
    debug!(path = %path.display(), "loaded config file");
    Ok(patch)
}

/// Load the patch at `path`, or at the default location when `path` is
/// `None`. A missing file is not an error: it yields an empty patch.
pub fn load_or_default(path: Option<&Path>) -> Result<OptionsPatch, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => {
                warn!("no config directory available, using defaults");
                return Ok(OptionsPatch::default());
            }
        },
    };

    if !path.exists() {
        warn!(path = %path.display(), "config file not found, using defaults");
        return Ok(OptionsPatch::default());
    }
    load_patch(&path)
}
