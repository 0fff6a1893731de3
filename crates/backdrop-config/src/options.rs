//! Option records: fully resolved [`Options`] and sparse [`OptionsPatch`].

use backdrop_core::{Color, ElementId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Where an effect mounts its rendering surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindTarget {
    /// A handle the host already resolved.
    Element(ElementId),
    /// A lookup key the host resolves, e.g. `"#hero"`.
    Selector(String),
}

impl From<&str> for BindTarget {
    fn from(selector: &str) -> Self {
        BindTarget::Selector(selector.to_string())
    }
}

impl From<ElementId> for BindTarget {
    fn from(id: ElementId) -> Self {
        BindTarget::Element(id)
    }
}

/// Keys owned by an effect variant rather than the framework, kept as
/// untyped TOML values until the effect reads them into its own struct.
pub type EffectKeys = toml::Table;

/// Resolved configuration of one effect instance.
///
/// Every framework key has a value. Effect keys hold whatever the effect's
/// defaults and the caller provided; [`Options::effect_options`] turns them
/// into the effect's typed options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub el: Option<BindTarget>,
    pub min_height: f32,
    pub min_width: f32,
    pub scale: f32,
    pub scale_mobile: f32,
    /// Clear color, and the static fallback when init fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
    pub background_alpha: f32,
    /// Simulation time multiplier.
    pub speed: f32,
    /// Ask the surface for nearest-neighbour sampling.
    pub pixelated: bool,
    #[serde(flatten)]
    pub effect: EffectKeys,
}

impl Default for Options {
    /// Framework-wide defaults.
    fn default() -> Self {
        Self {
            el: None,
            min_height: 200.0,
            min_width: 200.0,
            scale: 1.0,
            scale_mobile: 1.0,
            background_color: None,
            background_alpha: 1.0,
            speed: 1.0,
            pixelated: false,
            effect: EffectKeys::new(),
        }
    }
}

impl Options {
    /// Replace every value present in `patch`.
    pub fn merge(&mut self, patch: &OptionsPatch) {
        if let Some(el) = &patch.el {
            self.el = Some(el.clone());
        }
        set(&mut self.min_height, patch.min_height);
        set(&mut self.min_width, patch.min_width);
        set(&mut self.scale, patch.scale);
        set(&mut self.scale_mobile, patch.scale_mobile);
        if let Some(color) = patch.background_color {
            self.background_color = Some(color);
        }
        set(&mut self.background_alpha, patch.background_alpha);
        set(&mut self.speed, patch.speed);
        set(&mut self.pixelated, patch.pixelated);
        for (key, value) in &patch.effect {
            self.effect.insert(key.clone(), value.clone());
        }
        self.normalize();
    }

    /// Background alpha falls back to 1 when it is not a number.
    pub fn normalize(&mut self) {
        if self.background_alpha.is_nan() {
            self.background_alpha = 1.0;
        }
    }

    /// Speed multiplier, falling back to 1 when unset or not positive.
    pub fn effective_speed(&self) -> f32 {
        if self.speed > 0.0 { self.speed } else { 1.0 }
    }

    /// Read the effect keys into an effect's option struct. Keys the struct
    /// does not know are ignored.
    pub fn effect_options<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        toml::Value::Table(self.effect.clone())
            .try_into()
            .map_err(|source| ConfigError::EffectKeys { source })
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Caller-supplied or per-effect option values. Absent keys keep whatever the
/// layer below provides.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OptionsPatch {
    pub el: Option<BindTarget>,
    pub min_height: Option<f32>,
    pub min_width: Option<f32>,
    pub scale: Option<f32>,
    pub scale_mobile: Option<f32>,
    pub background_color: Option<Color>,
    pub background_alpha: Option<f32>,
    pub speed: Option<f32>,
    pub pixelated: Option<bool>,
    /// Keys the framework does not know; they belong to the effect.
    #[serde(flatten)]
    pub effect: EffectKeys,
}

impl OptionsPatch {
    /// Patch that only names a bind target.
    pub fn bound_to(target: impl Into<BindTarget>) -> Self {
        Self {
            el: Some(target.into()),
            ..Self::default()
        }
    }

    /// Set one effect key from any serializable value.
    pub fn set_effect_key<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), ConfigError> {
        let value = toml::Value::try_from(value).map_err(|source| ConfigError::EffectValue {
            key: key.to_string(),
            source,
        })?;
        self.effect.insert(key.to_string(), value);
        Ok(())
    }

    /// Combine two patches; values in `top` win.
    pub fn overlay(self, top: OptionsPatch) -> OptionsPatch {
        let mut effect = self.effect;
        effect.extend(top.effect);
        OptionsPatch {
            el: top.el.or(self.el),
            min_height: top.min_height.or(self.min_height),
            min_width: top.min_width.or(self.min_width),
            scale: top.scale.or(self.scale),
            scale_mobile: top.scale_mobile.or(self.scale_mobile),
            background_color: top.background_color.or(self.background_color),
            background_alpha: top.background_alpha.or(self.background_alpha),
            speed: top.speed.or(self.speed),
            pixelated: top.pixelated.or(self.pixelated),
            effect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_replaces_only_present_values() {
        let mut options = Options::default();
        options.effect.insert("spacing".into(), toml::Value::Float(15.0));
        let mut patch = OptionsPatch {
            min_width: Some(320.0),
            ..OptionsPatch::default()
        };
        patch.set_effect_key("points", 4_u32).unwrap();
        options.merge(&patch);
        assert_eq!(options.min_width, 320.0);
        assert_eq!(options.min_height, 200.0);
        assert_eq!(options.effect.get("points"), Some(&toml::Value::Integer(4)));
        assert_eq!(options.effect.get("spacing"), Some(&toml::Value::Float(15.0)));
    }

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(default)]
    struct Dots {
        count: u32,
        tint: Color,
    }

    impl Default for Dots {
        fn default() -> Self {
            Self {
                count: 3,
                tint: Color::WHITE,
            }
        }
    }

    #[test]
    fn effect_keys_read_into_typed_options() {
        let mut options = Options::default();
        let mut patch = OptionsPatch::default();
        patch.set_effect_key("tint", Color::from_hex(0xff3f81)).unwrap();
        patch.set_effect_key("unrelated", true).unwrap();
        options.merge(&patch);

        let dots: Dots = options.effect_options().unwrap();
        assert_eq!(
            dots,
            Dots {
                count: 3,
                tint: Color::from_hex(0xff3f81),
            }
        );
    }

    #[test]
    fn mistyped_effect_key_is_an_error() {
        let mut options = Options::default();
        options.effect.insert("count".into(), toml::Value::String("many".into()));
        assert!(matches!(
            options.effect_options::<Dots>(),
            Err(ConfigError::EffectKeys { .. })
        ));
    }

    #[test]
    fn nan_alpha_falls_back_to_opaque() {
        let mut options = Options::default();
        options.merge(&OptionsPatch {
            background_alpha: Some(f32::NAN),
            ..OptionsPatch::default()
        });
        assert_eq!(options.background_alpha, 1.0);
    }

    #[test]
    fn overlay_prefers_top_values() {
        let bottom = OptionsPatch {
            speed: Some(2.0),
            scale: Some(0.5),
            ..OptionsPatch::default()
        };
        let mut top = OptionsPatch {
            speed: Some(3.0),
            ..OptionsPatch::default()
        };
        top.set_effect_key("points", 2_u32).unwrap();
        let mut bottom = bottom;
        bottom.set_effect_key("points", 8_u32).unwrap();
        bottom.set_effect_key("spacing", 10.0_f32).unwrap();

        let combined = bottom.overlay(top);
        assert_eq!(combined.speed, Some(3.0));
        assert_eq!(combined.scale, Some(0.5));
        assert_eq!(combined.effect.get("points"), Some(&toml::Value::Integer(2)));
        assert_eq!(combined.effect.get("spacing"), Some(&toml::Value::Float(10.0)));
    }

    #[test]
    fn non_positive_speed_runs_at_normal_rate() {
        let options = Options {
            speed: 0.0,
            ..Options::default()
        };
        assert_eq!(options.effective_speed(), 1.0);
    }
}
