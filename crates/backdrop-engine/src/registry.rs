//! Named effect constructors.

use std::collections::BTreeMap;

use backdrop_config::OptionsPatch;
use tracing::{debug, warn};

use crate::effect::Effect;
use crate::error::RegistryError;
use crate::host::Host;
use crate::instance::EffectInstance;
use crate::render::Engine;

type Factory = Box<dyn Fn() -> Box<dyn Effect>>;

/// Maps effect names to constructors. Later registrations replace earlier
/// ones under the same name.
#[derive(Default)]
pub struct Registry {
    factories: BTreeMap<String, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`. Returns `true` if an earlier entry
    /// was replaced.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> bool
    where
        F: Fn() -> Box<dyn Effect> + 'static,
    {
        let name = name.into();
        let replaced = self.factories.insert(name.clone(), Box::new(factory)).is_some();
        if replaced {
            warn!(effect = %name, "replacing registered effect");
        } else {
            debug!(effect = %name, "registered effect");
        }
        replaced
    }

    /// A fresh, unmounted effect.
    pub fn effect(&self, name: &str) -> Result<Box<dyn Effect>, RegistryError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| RegistryError::UnknownEffect(name.to_string()))
    }

    /// Construct and mount the effect registered under `name`.
    ///
    /// Only an unknown name is an error; setup failures are reported through
    /// the returned instance.
    pub fn create<H, E>(
        &self,
        name: &str,
        patch: &OptionsPatch,
        host: H,
        engine: &mut E,
    ) -> Result<EffectInstance<H, E::Renderer>, RegistryError>
    where
        H: Host,
        E: Engine,
    {
        let effect = self.effect(name)?;
        Ok(EffectInstance::new(effect, patch, host, engine))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
