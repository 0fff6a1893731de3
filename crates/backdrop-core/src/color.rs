//! Linear RGB colors with the small set of operations effects need.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An RGB color with components nominally in `0.0..=1.0`.
///
/// Components are not clamped: subtracting a brighter color yields negative
/// channels, which additive line blending relies on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a color from a packed `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// Pack the color into `0xRRGGBB`, clamping each channel.
    pub fn to_hex(self) -> u32 {
        let [r, g, b] = self.to_rgb8();
        (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }

    /// Parse `#rrggbb`, `0xrrggbb` or bare `rrggbb` (also the 3-digit `#rgb` form).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let digits = s
            .strip_prefix('#')
            .or_else(|| s.strip_prefix("0x"))
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        match digits.len() {
            6 => u32::from_str_radix(digits, 16).ok().map(Self::from_hex),
            3 => {
                let short = u32::from_str_radix(digits, 16).ok()?;
                let (r, g, b) = ((short >> 8) & 0xf, (short >> 4) & 0xf, short & 0xf);
                Some(Self::from_hex((r * 17) << 16 | (g * 17) << 8 | (b * 17)))
            }
            _ => None,
        }
    }

    /// Convert HSL (hue in degrees, saturation and lightness in `0..=1`) to RGB.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        if s == 0.0 {
            return Self::new(l, l, l);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        let h = h.rem_euclid(360.0) / 360.0;

        Self::new(
            hue_to_rgb(p, q, h + 1.0 / 3.0),
            hue_to_rgb(p, q, h),
            hue_to_rgb(p, q, h - 1.0 / 3.0),
        )
    }

    /// Perceived brightness using the Rec. 601 luma weights.
    pub fn brightness(self) -> f32 {
        0.299 * self.r + 0.587 * self.g + 0.114 * self.b
    }

    /// Linear interpolation toward `other`; `alpha = 1` yields `other`.
    pub fn lerp(self, other: Color, alpha: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * alpha,
            g: self.g + (other.g - self.g) * alpha,
            b: self.b + (other.b - self.b) * alpha,
        }
    }

    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let c = self.clamped();
        [
            (c.r * 255.0).round() as u8,
            (c.g * 255.0).round() as u8,
            (c.b * 255.0).round() as u8,
        ]
    }
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }

    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, rhs: Color) -> Color {
        Color::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl Sub for Color {
    type Output = Color;

    fn sub(self, rhs: Color) -> Color {
        Color::new(self.r - rhs.r, self.g - rhs.g, self.b - rhs.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.to_hex())
    }
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Self::from_hex(hex)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Packed(u32),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Packed(hex) => Ok(Color::from_hex(hex)),
            Repr::Text(text) => Color::parse(&text)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid color `{text}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip_keeps_channels() {
        let c = Color::from_hex(0xff3f81);
        assert_eq!(c.to_hex(), 0xff3f81);
        assert_eq!(c.to_string(), "#ff3f81");
    }

    #[test]
    fn parses_common_notations() {
        assert_eq!(Color::parse("#23153c"), Some(Color::from_hex(0x23153c)));
        assert_eq!(Color::parse("0x23153c"), Some(Color::from_hex(0x23153c)));
        assert_eq!(Color::parse("fff"), Some(Color::WHITE));
        assert_eq!(Color::parse("not a color"), None);
    }

    #[test]
    fn pink_is_brighter_than_dark_purple() {
        let pink = Color::from_hex(0xff3f81);
        let purple = Color::from_hex(0x23153c);
        assert!(pink.brightness() > purple.brightness());
    }

    #[test]
    fn subtraction_is_not_clamped() {
        let diff = Color::from_hex(0x000000) - Color::from_hex(0xffffff);
        assert_eq!(diff, Color::new(-1.0, -1.0, -1.0));
        assert_eq!(diff.to_rgb8(), [0, 0, 0]);
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(Color::from_hsl(0.0, 1.0, 0.5).to_hex(), 0xff0000);
        assert_eq!(Color::from_hsl(120.0, 1.0, 0.5).to_hex(), 0x00ff00);
        assert_eq!(Color::from_hsl(0.0, 0.0, 1.0), Color::WHITE);
    }
}
