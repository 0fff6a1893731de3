//! Builtin backdrop effects.

pub mod globe;

use backdrop_engine::Registry;

pub use globe::GlobeEffect;

/// Register every builtin effect under its public names.
pub fn register_builtin(registry: &mut Registry) {
    registry.register("GLOBE", || Box::new(GlobeEffect::new()));
    registry.register("globe", || Box::new(GlobeEffect::new()));
}
