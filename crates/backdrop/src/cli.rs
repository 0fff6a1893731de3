//! Command line interface.

use std::path::PathBuf;

use backdrop_config::{BindTarget, ConfigError, OptionsPatch};
use backdrop_core::Color;
use clap::{Parser, ValueEnum};
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "backdrop", version, about = "Animated 3-D network backgrounds in the terminal")]
pub struct Cli {
    /// Registered effect name.
    #[arg(short, long, default_value = "GLOBE")]
    pub effect: String,

    /// Config file; defaults to the per-user config location.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Element to bind to.
    #[arg(long)]
    pub el: Option<String>,

    /// Grid cells per side.
    #[arg(long)]
    pub points: Option<u32>,

    #[arg(long)]
    pub spacing: Option<f32>,

    #[arg(long)]
    pub max_distance: Option<f32>,

    /// Primary color, e.g. `#ff3f81` or `0xff3f81`.
    #[arg(long, value_parser = parse_color)]
    pub color: Option<Color>,

    #[arg(long, value_parser = parse_color)]
    pub color2: Option<Color>,

    #[arg(long, value_parser = parse_color)]
    pub background_color: Option<Color>,

    #[arg(long)]
    pub speed: Option<f32>,

    #[arg(long)]
    pub scale: Option<f32>,

    /// Coarse block rendering.
    #[arg(long)]
    pub pixelated: bool,

    /// Draw the network without point markers.
    #[arg(long)]
    pub hide_dots: bool,

    /// Text shown above the animation.
    #[arg(long)]
    pub title: Option<String>,

    /// Log file; defaults to `backdrop.log` in the per-user data directory.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Print the resolved options as TOML and exit.
    #[arg(long)]
    pub print_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn parse_color(s: &str) -> Result<Color, String> {
    Color::parse(s).ok_or_else(|| format!("`{s}` is not a hex color"))
}

impl Cli {
    /// Option values given on the command line. Unset flags stay unset so
    /// the config file can supply them.
    pub fn patch(&self) -> Result<OptionsPatch, ConfigError> {
        let mut patch = OptionsPatch {
            el: self.el.as_deref().map(BindTarget::from),
            scale: self.scale,
            background_color: self.background_color,
            speed: self.speed,
            pixelated: self.pixelated.then_some(true),
            ..OptionsPatch::default()
        };
        if let Some(color) = self.color {
            patch.set_effect_key("color", color)?;
        }
        if let Some(color) = self.color2 {
            patch.set_effect_key("color2", color)?;
        }
        if let Some(points) = self.points {
            patch.set_effect_key("points", points)?;
        }
        if let Some(distance) = self.max_distance {
            patch.set_effect_key("max_distance", distance)?;
        }
        if let Some(spacing) = self.spacing {
            patch.set_effect_key("spacing", spacing)?;
        }
        if self.hide_dots {
            patch.set_effect_key("show_dots", false)?;
        }
        Ok(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_flags_leave_the_patch_empty() {
        let cli = Cli::parse_from(["backdrop"]);
        assert_eq!(cli.patch().unwrap(), OptionsPatch::default());
        assert_eq!(cli.effect, "GLOBE");
    }

    #[test]
    fn flags_map_to_option_keys() {
        let cli = Cli::parse_from([
            "backdrop",
            "--points",
            "4",
            "--max-distance",
            "30",
            "--color",
            "#00ff00",
            "--hide-dots",
            "--el",
            "#hero",
        ]);
        let patch = cli.patch().unwrap();
        assert_eq!(patch.effect.get("points"), Some(&toml::Value::Integer(4)));
        assert_eq!(patch.effect.get("max_distance"), Some(&toml::Value::Float(30.0)));
        assert_eq!(patch.effect.get("color"), Some(&toml::Value::String("#00ff00".into())));
        assert_eq!(patch.effect.get("show_dots"), Some(&toml::Value::Boolean(false)));
        assert_eq!(patch.el, Some(BindTarget::from("#hero")));
        assert_eq!(patch.pixelated, None);
    }

    #[test]
    fn bad_color_is_rejected() {
        assert!(Cli::try_parse_from(["backdrop", "--color", "pink"]).is_err());
    }
}
