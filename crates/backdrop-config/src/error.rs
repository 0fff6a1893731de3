use std::path::PathBuf;

use thiserror::Error;

/// Failure to load or interpret configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid effect options")]
    EffectKeys {
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot store effect key `{key}`")]
    EffectValue {
        key: String,
        #[source]
        source: toml::ser::Error,
    },
}
