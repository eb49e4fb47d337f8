//! 8-bit RGBA colors and CSS color parsing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// RGBA color with 8-bit components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse any supported CSS color form: hex, `rgb()`/`rgba()` or a named color.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.starts_with('#') {
            return Self::from_hex(input);
        }
        if let Some(args) = input
            .strip_prefix("rgba(")
            .or_else(|| input.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Self::from_functional(args);
        }
        Self::from_name(input)
    }

    fn from_functional(args: &str) -> Option<Self> {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let channel = |s: &str| -> Option<u8> {
            let v: f64 = s.parse().ok()?;
            Some(v.clamp(0.0, 255.0).round() as u8)
        };
        let r = channel(parts[0])?;
        let g = channel(parts[1])?;
        let b = channel(parts[2])?;
        let a = match parts.get(3) {
            Some(alpha) => {
                let a: f64 = alpha.parse().ok()?;
                (a.clamp(0.0, 1.0) * 255.0).round() as u8
            }
            None => 255,
        };
        Some(Self::rgba(r, g, b, a))
    }

    /// Hex notation with or without the leading `#`: `rgb`, `rgba`, `rrggbb`
    /// or `rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let (width, channels) = match digits.len() {
            3 | 4 => (1, digits.len()),
            6 | 8 => (2, digits.len() / 2),
            _ => return None,
        };
        let mut out = [255u8; 4];
        for (i, slot) in out.iter_mut().take(channels).enumerate() {
            let v = u8::from_str_radix(&digits[i * width..(i + 1) * width], 16).ok()?;
            // Short forms repeat the nibble: `f` reads as `ff`.
            *slot = if width == 1 { v * 17 } else { v };
        }
        let [r, g, b, a] = out;
        Some(Self::rgba(r, g, b, a))
    }

    /// Look up a named color, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        NAMED_COLORS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, c)| c)
    }

    /// Multiply the alpha channel by `factor` (0.0 - 1.0).
    #[inline]
    pub fn with_opacity(&self, factor: f64) -> Color {
        let a = (self.a as f64 * factor.clamp(0.0, 1.0)).round() as u8;
        Color::rgba(self.r, self.g, self.b, a)
    }

    /// CSS `rgba()` form, used by vector output.
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("rgba({},{},{},{:.3})", self.r, self.g, self.b, self.a as f64 / 255.0)
        }
    }

    /// Source-over compositing of `self` onto `below`.
    pub fn blend_over(&self, below: Color) -> Color {
        let top_a = self.a as f64 / 255.0;
        let below_a = below.a as f64 / 255.0 * (1.0 - top_a);
        let out_a = top_a + below_a;
        if out_a <= 0.0 {
            return Color::TRANSPARENT;
        }
        let mix = |t: u8, u: u8| ((t as f64 * top_a + u as f64 * below_a) / out_a).round() as u8;
        Color::rgba(
            mix(self.r, below.r),
            mix(self.g, below.g),
            mix(self.b, below.b),
            (out_a * 255.0).round() as u8,
        )
    }
}

const NAMED_COLORS: &[(&str, Color)] = &[
    ("transparent", Color::TRANSPARENT),
    ("black", Color::BLACK),
    ("white", Color::WHITE),
    ("red", Color::RED),
    ("green", Color::GREEN),
    ("blue", Color::BLUE),
    ("yellow", Color::rgb(255, 255, 0)),
    ("cyan", Color::rgb(0, 255, 255)),
    ("aqua", Color::rgb(0, 255, 255)),
    ("magenta", Color::rgb(255, 0, 255)),
    ("fuchsia", Color::rgb(255, 0, 255)),
    ("gray", Color::rgb(128, 128, 128)),
    ("grey", Color::rgb(128, 128, 128)),
    ("silver", Color::rgb(192, 192, 192)),
    ("maroon", Color::rgb(128, 0, 0)),
    ("olive", Color::rgb(128, 128, 0)),
    ("lime", Color::rgb(0, 255, 0)),
    ("teal", Color::rgb(0, 128, 128)),
    ("navy", Color::rgb(0, 0, 128)),
    ("purple", Color::rgb(128, 0, 128)),
    ("orange", Color::rgb(255, 165, 0)),
    ("pink", Color::rgb(255, 192, 203)),
    ("brown", Color::rgb(165, 42, 42)),
    ("gold", Color::rgb(255, 215, 0)),
    ("indigo", Color::rgb(75, 0, 130)),
    ("coral", Color::rgb(255, 127, 80)),
    ("crimson", Color::rgb(220, 20, 60)),
    ("salmon", Color::rgb(250, 128, 114)),
    ("violet", Color::rgb(238, 130, 238)),
    ("turquoise", Color::rgb(64, 224, 208)),
    ("rebeccapurple", Color::rgb(102, 51, 153)),
];

impl fmt::Display for Color {
    /// `#rrggbb`, with a trailing alpha byte when not opaque.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("#ff0000"), Some(Color::RED));
        assert_eq!(Color::from_hex("#f00"), Some(Color::RED));
        assert_eq!(Color::from_hex("00ff00"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(Color::from_hex("#ffffff80"), Some(Color::rgba(255, 255, 255, 128)));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Color::from_name("red"), Some(Color::RED));
        assert_eq!(Color::from_name("WHITE"), Some(Color::WHITE));
        assert_eq!(Color::from_name("transparent"), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_parse_functional() {
        assert_eq!(Color::parse("rgb(255, 0, 0)"), Some(Color::RED));
        assert_eq!(Color::parse("rgba(0,0,255,0.5)"), Some(Color::rgba(0, 0, 255, 128)));
        assert_eq!(Color::parse("  #00f "), Some(Color::BLUE));
        assert_eq!(Color::parse("rgb(1,2)"), None);
        assert_eq!(Color::parse("not-a-color"), None);
    }

    #[test]
    fn test_from_hex_rejects() {
        assert_eq!(Color::from_hex("#ff00"), Some(Color::rgba(255, 255, 0, 0)));
        assert_eq!(Color::from_hex("#ff000"), None);
        assert_eq!(Color::from_hex("#+f0"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
        assert_eq!(Color::rgba(1, 2, 3, 4).to_string(), "#01020304");
    }

    #[test]
    fn test_blend_over() {
        let half_red = Color::rgba(255, 0, 0, 128);
        let out = half_red.blend_over(Color::BLUE);
        assert_eq!(out.a, 255);
        assert!(out.r > 120 && out.b > 120);
        assert_eq!(Color::RED.blend_over(Color::TRANSPARENT), Color::RED);
        assert_eq!(Color::TRANSPARENT.blend_over(Color::TRANSPARENT), Color::TRANSPARENT);
    }
}
