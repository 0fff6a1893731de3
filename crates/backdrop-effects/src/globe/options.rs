//! Keys of the globe effect.

use backdrop_config::{ConfigError, EffectKeys, Options};
use backdrop_core::Color;
use backdrop_engine::EffectError;
use serde::Deserialize;
use toml::Value;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlobeOptions {
    /// Primary color: points, sphere wireframe, line tint.
    pub color: Color,
    /// Secondary color for the rays and ornament.
    pub color2: Color,
    /// Sphere radius multiplier.
    pub size: f32,
    /// Grid cells per side; the lattice has `(points + 1)²` points.
    pub points: u32,
    /// Pairs closer than this are connected.
    pub max_distance: f32,
    pub spacing: f32,
    /// Draw a marker sphere at every point.
    pub show_dots: bool,
}

impl Default for GlobeOptions {
    fn default() -> Self {
        Self {
            color: Color::from_hex(0xff3f81),
            color2: Color::from_hex(0xffffff),
            size: 1.0,
            points: 10,
            max_distance: 20.0,
            spacing: 15.0,
            show_dots: true,
        }
    }
}

impl GlobeOptions {
    /// Typed keys from resolved options, checked for usable values.
    pub fn from_options(options: &Options) -> Result<Self, EffectError> {
        let globe: GlobeOptions = options.effect_options().map_err(|err| match err {
            ConfigError::EffectKeys { source } => EffectError::Options(source.message().to_string()),
            other => EffectError::Options(other.to_string()),
        })?;
        globe.validate()?;
        Ok(globe)
    }

    pub fn validate(&self) -> Result<(), EffectError> {
        for (key, value) in [
            ("spacing", self.spacing),
            ("max_distance", self.max_distance),
            ("size", self.size),
        ] {
            if !value.is_finite() {
                return Err(EffectError::InvalidOption {
                    key,
                    reason: format!("expected a finite number, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// The same values as effect keys, for layering under caller values.
    pub fn to_keys(&self) -> EffectKeys {
        EffectKeys::from_iter([
            ("color".to_string(), Value::String(self.color.to_string())),
            ("color2".to_string(), Value::String(self.color2.to_string())),
            ("size".to_string(), Value::Float(f64::from(self.size))),
            ("points".to_string(), Value::Integer(i64::from(self.points))),
            ("max_distance".to_string(), Value::Float(f64::from(self.max_distance))),
            ("spacing".to_string(), Value::Float(f64::from(self.spacing))),
            ("show_dots".to_string(), Value::Boolean(self.show_dots)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use backdrop_config::{ConfigResolver, OptionsPatch};

    use super::*;

    #[test]
    fn defaults_survive_a_trip_through_keys() {
        let options = Options {
            effect: GlobeOptions::default().to_keys(),
            ..Options::default()
        };
        assert_eq!(GlobeOptions::from_options(&options), Ok(GlobeOptions::default()));
    }

    #[test]
    fn caller_keys_override_defaults() {
        let defaults = OptionsPatch {
            effect: GlobeOptions::default().to_keys(),
            ..OptionsPatch::default()
        };
        let mut user = OptionsPatch::default();
        user.set_effect_key("points", 2_u32).unwrap();
        user.set_effect_key("color", "#00ff00").unwrap();

        let globe = GlobeOptions::from_options(&ConfigResolver::resolve(&defaults, &user)).unwrap();
        assert_eq!(globe.points, 2);
        assert_eq!(globe.color, Color::from_hex(0x00ff00));
        assert_eq!(globe.spacing, 15.0);
    }

    #[test]
    fn non_finite_spacing_is_rejected() {
        let globe = GlobeOptions {
            spacing: f32::INFINITY,
            ..GlobeOptions::default()
        };
        assert!(matches!(
            globe.validate(),
            Err(EffectError::InvalidOption { key: "spacing", .. })
        ));
    }

    #[test]
    fn mistyped_key_is_an_options_error() {
        let mut options = Options::default();
        options.effect.insert("points".into(), Value::String("lots".into()));
        assert!(matches!(
            GlobeOptions::from_options(&options),
            Err(EffectError::Options(_))
        ));
    }
}
