//! Layered option resolution.

use crate::options::{Options, OptionsPatch};

/// Resolves the options of an effect instance from three layers:
/// framework defaults, then the effect's defaults, then caller values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigResolver;

impl ConfigResolver {
    pub fn resolve(effect_defaults: &OptionsPatch, user: &OptionsPatch) -> Options {
        let mut options = Options::default();
        options.merge(effect_defaults);
        options.merge(user);
        options
    }
}
