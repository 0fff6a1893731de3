//! Configuration for backdrop effects.
//!
//! Options resolve in three layers: framework defaults, effect defaults and
//! caller values (a config file, CLI flags or a `set_options` call).

mod error;
mod loader;
mod options;
mod resolver;

pub use error::ConfigError;
pub use loader::{default_config_path, load_or_default, load_patch, parse_patch, project_dirs};
pub use options::{BindTarget, EffectKeys, Options, OptionsPatch};
pub use resolver::ConfigResolver;
