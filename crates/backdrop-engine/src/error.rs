//! Error types for the lifecycle framework.

use thiserror::Error;

/// Failure reported by an effect hook.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EffectError {
    #[error("invalid option `{key}`: {reason}")]
    InvalidOption { key: &'static str, reason: String },

    #[error("invalid effect options: {0}")]
    Options(String),

    #[error("{what} needs {needed} slots but only {available} fit")]
    Capacity {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("{0}")]
    Other(String),
}

/// Why an instance never reached the running state.
///
/// Setup errors are logged and stored on the instance; they never escape
/// construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    #[error("instance needs an `el` bind target")]
    MissingBindTarget,

    #[error("cannot find element `{0}`")]
    BindTarget(String),

    #[error("init error: {0}")]
    Init(#[from] EffectError),
}

/// Registry lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no effect registered under `{0}`")]
    UnknownEffect(String),
}
