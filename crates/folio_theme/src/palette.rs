//! Light and dark palettes

use crate::scheme::ColorScheme;
use folio_core::Color;

/// Page-level colors for one scheme
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub surface: Color,
    pub text: Color,
    pub text_muted: Color,
    pub accent: Color,
    pub border: Color,
}

impl Palette {
    pub fn light() -> Self {
        Self {
            background: Color::from_hex(0xF9FAFB),
            surface: Color::from_hex(0xFFFFFF),
            text: Color::from_hex(0x111827),
            text_muted: Color::from_hex(0x4B5563),
            accent: Color::from_hex(0x2563EB),
            border: Color::from_hex(0xE5E7EB),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::from_hex(0x0F172A),
            surface: Color::from_hex(0x1E293B),
            text: Color::from_hex(0xF1F5F9),
            text_muted: Color::from_hex(0x94A3B8),
            accent: Color::from_hex(0x60A5FA),
            border: Color::from_hex(0x334155),
        }
    }

    pub fn for_scheme(scheme: ColorScheme) -> Self {
        match scheme {
            ColorScheme::Light => Self::light(),
            ColorScheme::Dark => Self::dark(),
        }
    }

    /// Blend every color toward `other`
    pub fn lerp(&self, other: &Palette, t: f32) -> Palette {
        Palette {
            background: self.background.lerp(&other.background, t),
            surface: self.surface.lerp(&other.surface, t),
            text: self.text.lerp(&other.text, t),
            text_muted: self.text_muted.lerp(&other.text_muted, t),
            accent: self.accent.lerp(&other.accent, t),
            border: self.border.lerp(&other.border, t),
        }
    }
}
