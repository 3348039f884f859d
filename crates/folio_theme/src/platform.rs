//! Ambient OS color-scheme preference
//!
//! The preference store consults an [`AmbientPreference`] only when nothing
//! valid was persisted. [`SystemAmbient`] reads the desktop setting from the
//! environment; [`FixedAmbient`] pins an answer for tests and configuration.

use crate::scheme::ColorScheme;

/// Variable that overrides the detected desktop scheme (`light` or `dark`)
pub const SCHEME_OVERRIDE_VAR: &str = "FOLIO_COLOR_SCHEME";

/// Read-only "does the OS prefer dark mode" query
pub trait AmbientPreference {
    /// `None` when the host cannot answer
    fn prefers_dark(&self) -> Option<bool>;

    fn scheme(&self) -> Option<ColorScheme> {
        self.prefers_dark().map(ColorScheme::from_dark)
    }
}

/// An ambient preference fixed at construction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedAmbient(pub Option<bool>);

impl FixedAmbient {
    pub const fn dark() -> Self {
        Self(Some(true))
    }

    pub const fn light() -> Self {
        Self(Some(false))
    }

    pub const fn unknown() -> Self {
        Self(None)
    }
}

impl From<Option<ColorScheme>> for FixedAmbient {
    fn from(scheme: Option<ColorScheme>) -> Self {
        Self(scheme.map(|s| s.is_dark()))
    }
}

impl AmbientPreference for FixedAmbient {
    fn prefers_dark(&self) -> Option<bool> {
        self.0
    }
}

/// Desktop color-scheme detection from the process environment
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemAmbient;

impl SystemAmbient {
    pub fn new() -> Self {
        Self
    }

    /// Interpret the override variable and `GTK_THEME`, override first
    pub fn detect(override_value: Option<&str>, gtk_theme: Option<&str>) -> Option<bool> {
        if let Some(value) = override_value {
            match value.trim().to_ascii_lowercase().as_str() {
                "dark" => return Some(true),
                "light" => return Some(false),
                other => tracing::debug!(value = other, "ignoring unrecognized scheme override"),
            }
        }

        // GTK encodes the variant as a suffix, e.g. `Adwaita:dark`
        let theme = gtk_theme?.trim();
        if theme.is_empty() {
            return None;
        }
        Some(theme.to_ascii_lowercase().ends_with(":dark"))
    }
}

impl AmbientPreference for SystemAmbient {
    fn prefers_dark(&self) -> Option<bool> {
        let override_value = std::env::var(SCHEME_OVERRIDE_VAR).ok();
        let gtk_theme = std::env::var("GTK_THEME").ok();
        Self::detect(override_value.as_deref(), gtk_theme.as_deref())
    }
}
