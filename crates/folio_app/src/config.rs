//! Folio configuration file handling (folio.toml)

use crate::contact::ContactConfig;
use crate::cursor::CursorConfig;
use crate::loading::LoadingConfig;
use crate::readiness::{DEFAULT_CEILING_MS, DEFAULT_POLL_MS};
use crate::stage::{LoadingStage, DEFAULT_STAGE_STEP_MS};
use anyhow::{Context, Result};
use folio_animation::{RevealConfig, RevealDirection, TypewriterConfig};
use folio_core::scheduler::DEFAULT_FRAME_MS;
use folio_layout::SectionId;
use folio_theme::{
    AmbientPreference, ColorScheme, FixedAmbient, JsonFileBackend, MemoryBackend,
    PreferenceStore, SystemAmbient, TransitionTimings,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name
pub const CONFIG_FILE: &str = "folio.toml";

/// Values that parse but cannot drive a page
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("viewport dimensions must be non-zero")]
    EmptyViewport,
    #[error("frame interval must be > 0")]
    ZeroFrameInterval,
    #[error("readiness ceiling {0}ms is outside 2000..=3000ms")]
    ReadinessCeiling(u64),
    #[error("reveal threshold {0} is outside 0..=1")]
    Threshold(f32),
    #[error("section `{0}` appears more than once in the layout")]
    DuplicateSection(SectionId),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FolioConfig {
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub stages: StagesConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub loading: LoadingConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default)]
    pub hero: HeroConfig,
    #[serde(default)]
    pub cursor: CursorConfig,
    #[serde(default)]
    pub contact: ContactConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ViewportConfig {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    /// Height of each section, in page order
    #[serde(default = "default_sections")]
    pub sections: Vec<SectionHeight>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SectionHeight {
    pub id: SectionId,
    pub height: f32,
}

fn default_width() -> f32 {
    1280.0
}

fn default_height() -> f32 {
    720.0
}

fn default_sections() -> Vec<SectionHeight> {
    [
        (SectionId::Hero, 720.0),
        (SectionId::About, 800.0),
        (SectionId::Experience, 1200.0),
        (SectionId::Skills, 900.0),
        (SectionId::Projects, 1400.0),
        (SectionId::Contact, 700.0),
    ]
    .into_iter()
    .map(|(id, height)| SectionHeight { id, height })
    .collect()
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            sections: default_sections(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RuntimeConfig {
    /// Milliseconds between presented frames
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
}

fn default_frame_ms() -> u64 {
    DEFAULT_FRAME_MS
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            frame_ms: default_frame_ms(),
        }
    }
}

/// Where the OS-level preference comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbientSource {
    /// Detect from the desktop environment
    #[default]
    System,
    Dark,
    Light,
    /// Behave as if the host cannot answer
    None,
}

impl AmbientSource {
    pub fn resolve(&self) -> Box<dyn AmbientPreference> {
        match self {
            AmbientSource::System => Box::new(SystemAmbient::new()),
            AmbientSource::Dark => Box::new(FixedAmbient::dark()),
            AmbientSource::Light => Box::new(FixedAmbient::light()),
            AmbientSource::None => Box::new(FixedAmbient::unknown()),
        }
    }
}

impl From<ColorScheme> for AmbientSource {
    fn from(scheme: ColorScheme) -> Self {
        match scheme {
            ColorScheme::Dark => AmbientSource::Dark,
            ColorScheme::Light => AmbientSource::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ThemeConfig {
    /// JSON preference file; in-memory storage when unset
    #[serde(default)]
    pub storage: Option<PathBuf>,
    #[serde(default = "default_storage_key")]
    pub key: String,
    #[serde(default)]
    pub ambient: AmbientSource,
    #[serde(default)]
    pub timings: TransitionTimings,
}

fn default_storage_key() -> String {
    folio_theme::store::DEFAULT_KEY.to_string()
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            storage: None,
            key: default_storage_key(),
            ambient: AmbientSource::default(),
            timings: TransitionTimings::default(),
        }
    }
}

impl ThemeConfig {
    /// Preference store over the configured backend
    pub fn open_store(&self) -> PreferenceStore {
        let store = match &self.storage {
            Some(path) => PreferenceStore::new(JsonFileBackend::new(path)),
            None => PreferenceStore::new(MemoryBackend::new()),
        };
        store.with_key(self.key.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StagesConfig {
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
    /// Stage each section needs before it mounts
    #[serde(default = "default_gates")]
    pub gates: Vec<StageGate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct StageGate {
    pub section: SectionId,
    pub stage: LoadingStage,
}

fn default_step_ms() -> u64 {
    DEFAULT_STAGE_STEP_MS
}

fn default_gates() -> Vec<StageGate> {
    [
        (SectionId::Hero, LoadingStage::Critical),
        (SectionId::About, LoadingStage::High),
        (SectionId::Experience, LoadingStage::Medium),
        (SectionId::Skills, LoadingStage::Medium),
        (SectionId::Projects, LoadingStage::Low),
        (SectionId::Contact, LoadingStage::Low),
    ]
    .into_iter()
    .map(|(section, stage)| StageGate { section, stage })
    .collect()
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            step_ms: default_step_ms(),
            gates: default_gates(),
        }
    }
}

impl StagesConfig {
    /// Required stage for `section`; ungated sections wait for Low
    pub fn gate(&self, section: SectionId) -> LoadingStage {
        self.gates
            .iter()
            .find(|g| g.section == section)
            .map(|g| g.stage)
            .unwrap_or(LoadingStage::Low)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
    #[serde(default = "default_ceiling_ms")]
    pub ceiling_ms: u64,
}

fn default_poll_ms() -> u64 {
    DEFAULT_POLL_MS
}

fn default_ceiling_ms() -> u64 {
    DEFAULT_CEILING_MS
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_ms: default_poll_ms(),
            ceiling_ms: default_ceiling_ms(),
        }
    }
}

/// Hero headline typed out on mount
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HeroConfig {
    #[serde(default = "default_headline")]
    pub headline: String,
    #[serde(default)]
    pub typewriter: TypewriterConfig,
}

fn default_headline() -> String {
    "Full-stack developer crafting thoughtful interfaces".to_string()
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            headline: default_headline(),
            typewriter: TypewriterConfig::default(),
        }
    }
}

impl FolioConfig {
    /// Load configuration from a file or a directory containing folio.toml
    pub fn load(path: &Path) -> Result<Self> {
        let config_path = if path.is_dir() {
            path.join(CONFIG_FILE)
        } else {
            path.to_path_buf()
        };

        if !config_path.exists() {
            anyhow::bail!(
                "No {} found at {}. Run `folio init` to create one.",
                CONFIG_FILE,
                path.display()
            );
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: FolioConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return Err(ConfigError::EmptyViewport);
        }
        if self.runtime.frame_ms == 0 {
            return Err(ConfigError::ZeroFrameInterval);
        }
        if !(2000..=3000).contains(&self.readiness.ceiling_ms) {
            return Err(ConfigError::ReadinessCeiling(self.readiness.ceiling_ms));
        }
        if !(0.0..=1.0).contains(&self.reveal.threshold) {
            return Err(ConfigError::Threshold(self.reveal.threshold));
        }
        for (i, entry) in self.viewport.sections.iter().enumerate() {
            if self.viewport.sections[..i].iter().any(|s| s.id == entry.id) {
                return Err(ConfigError::DuplicateSection(entry.id));
            }
        }
        Ok(())
    }

    /// Reveal configuration for a section; directions alternate per section
    pub fn reveal_for(&self, section: SectionId) -> RevealConfig {
        let direction = match section {
            SectionId::Hero | SectionId::About | SectionId::Contact => self.reveal.direction,
            SectionId::Experience | SectionId::Projects => RevealDirection::Left,
            SectionId::Skills => RevealDirection::Right,
        };
        self.reveal.direction(direction)
    }
}
