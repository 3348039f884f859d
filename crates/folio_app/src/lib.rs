//! Folio App
//!
//! The portfolio page runtime. A [`Page`] composes:
//!
//! - [`StageScheduler`]: progressive mount gates (critical, high, medium, low)
//! - section reveal animators fed by the page's visibility observer
//! - the theme transition sequencer from `folio_theme`
//! - a [`LoadingScreen`] and a bounded [`ReadinessWait`]
//! - a [`CustomCursor`] and the [`ContactForm`]
//!
//! Everything runs on a single deterministic event loop, so a page can be
//! driven headlessly by a [`HeadlessScenario`] and checked with assertions.
//!
//! # Example
//!
//! ```rust
//! use folio_app::{FolioConfig, LoadingStage, Page};
//! use folio_layout::SectionId;
//!
//! let page = Page::from_config(FolioConfig::default());
//! assert!(page.is_mounted(SectionId::Hero));
//! assert!(!page.is_mounted(SectionId::Contact));
//!
//! page.advance(1000);
//! assert_eq!(page.stage(), LoadingStage::Low);
//! assert!(page.is_mounted(SectionId::Contact));
//! ```

pub mod config;
pub mod contact;
pub mod cursor;
pub mod headless_assert;
pub mod headless_report;
pub mod headless_runner;
pub mod headless_runtime;
pub mod headless_scenario;
pub mod loading;
pub mod page;
pub mod readiness;
pub mod stage;

pub use config::{
    AmbientSource, ConfigError, FolioConfig, HeroConfig, ReadinessConfig, RuntimeConfig,
    SectionHeight, StageGate, StagesConfig, ThemeConfig, ViewportConfig, CONFIG_FILE,
};
pub use contact::{ContactConfig, ContactError, ContactFields, ContactForm, FormState};
pub use cursor::{CursorConfig, CursorMode, CursorState, CustomCursor};
pub use headless_assert::{AssertionResult, DiagnosticsSnapshot, SectionSnapshot};
pub use headless_report::{HeadlessReport, PageSummary, ReportStatus};
pub use headless_runner::{run_loaded_scenario, run_scenario, RunOutcome, ScenarioDriver};
pub use headless_runtime::{HeadlessRunConfig, HeadlessRuntime};
pub use headless_scenario::{HeadlessScenario, ScenarioStep};
pub use loading::{LoadingConfig, LoadingPhase, LoadingScreen, ReadySignal};
pub use page::{
    nav_link_target, Page, LOADING_CLASS, NAVBAR_SCROLL_THRESHOLD, NAV_LINK_TARGET_BASE,
    SUBMIT_BUTTON_TARGET,
};
pub use readiness::{ReadinessOutcome, ReadinessWait};
pub use stage::{LoadingStage, StageScheduler, UnknownStage, DEFAULT_STAGE_STEP_MS};
