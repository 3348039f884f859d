//! RGBA colors

use thiserror::Error;

/// Errors produced when parsing color literals
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("color literal must start with '#': {0}")]
    MissingHash(String),
    #[error("color literal must have 6 or 8 hex digits: {0}")]
    BadLength(String),
    #[error("invalid hex digits in color literal: {0}")]
    BadDigits(String),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }

    /// Parse `#rrggbb` or `#rrggbbaa`
    pub fn parse(literal: &str) -> Result<Self, ColorError> {
        let digits = literal
            .strip_prefix('#')
            .ok_or_else(|| ColorError::MissingHash(literal.to_string()))?;
        if digits.len() != 6 && digits.len() != 8 {
            return Err(ColorError::BadLength(literal.to_string()));
        }
        let value =
            u32::from_str_radix(digits, 16).map_err(|_| ColorError::BadDigits(literal.to_string()))?;

        if digits.len() == 6 {
            Ok(Self::from_hex(value))
        } else {
            Ok(Self::from_hex(value >> 8).with_alpha((value & 0xFF) as f32 / 255.0))
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }

    /// Linear interpolation between two colors, `t` clamped to 0..=1
    pub fn lerp(&self, other: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// CSS representation: `#rrggbb` when opaque, `rgba(...)` otherwise
    pub fn to_css(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        if self.a < 1.0 {
            format!(
                "rgba({},{},{},{})",
                channel(self.r),
                channel(self.g),
                channel(self.b),
                self.a
            )
        } else {
            format!(
                "#{:02x}{:02x}{:02x}",
                channel(self.r),
                channel(self.g),
                channel(self.b)
            )
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_css() {
        let color = Color::parse("#0f172a").unwrap();
        assert_eq!(color.to_css(), "#0f172a");
        assert_eq!(color, Color::from_hex(0x0F172A));
    }

    #[test]
    fn test_parse_with_alpha() {
        let color = Color::parse("#ffffff80").unwrap();
        assert!((color.a - 128.0 / 255.0).abs() < 1e-6);
        assert!(color.to_css().starts_with("rgba(255,255,255,"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Color::parse("0f172a"),
            Err(ColorError::MissingHash("0f172a".into()))
        );
        assert_eq!(Color::parse("#abc"), Err(ColorError::BadLength("#abc".into())));
        assert_eq!(
            Color::parse("#zzzzzz"),
            Err(ColorError::BadDigits("#zzzzzz".into()))
        );
    }

    #[test]
    fn test_lerp_clamps() {
        let mid = Color::BLACK.lerp(&Color::WHITE, 0.5);
        assert!((mid.r - 0.5).abs() < 1e-6);
        assert_eq!(Color::BLACK.lerp(&Color::WHITE, 2.0), Color::WHITE);
    }
}
