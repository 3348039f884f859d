//! Folio Theme
//!
//! Light/dark theming for the portfolio page:
//!
//! - [`ColorScheme`]: the persisted `"light"`/`"dark"` preference
//! - [`PreferenceStore`]: reads the startup scheme (persisted value, then the
//!   ambient OS preference, then dark) and writes it back through a
//!   [`PreferenceBackend`]
//! - [`Palette`]: page colors per scheme
//! - [`ThemeTransitionSequencer`]: the animated cover/commit/reveal cycle
//!   that applies a toggle
//!
//! # Example
//!
//! ```rust
//! use folio_core::{EventLoop, UiEnvironment};
//! use folio_theme::{
//!     ColorScheme, FixedAmbient, MemoryBackend, PreferenceStore, ThemeTransitionSequencer,
//!     TransitionTimings,
//! };
//!
//! let event_loop = EventLoop::new();
//! let environment = UiEnvironment::shared();
//! let sequencer = ThemeTransitionSequencer::new(
//!     &event_loop,
//!     PreferenceStore::new(MemoryBackend::new()),
//!     &FixedAmbient::unknown(),
//!     environment.clone(),
//!     TransitionTimings::default(),
//! );
//!
//! assert_eq!(sequencer.scheme(), ColorScheme::Dark);
//! assert!(sequencer.toggle().is_accepted());
//! event_loop.advance(2000);
//! assert_eq!(sequencer.scheme(), ColorScheme::Light);
//! assert!(!environment.borrow().has_root_class("dark"));
//! ```

pub mod palette;
pub mod platform;
pub mod scheme;
pub mod store;
pub mod transition;

pub use palette::Palette;
pub use platform::{AmbientPreference, FixedAmbient, SystemAmbient};
pub use scheme::{ColorScheme, InvalidScheme};
pub use store::{
    JsonFileBackend, MemoryBackend, PreferenceBackend, PreferenceStore, StoreError,
    UnavailableBackend,
};
pub use transition::{
    PhaseChange, ThemeTransitionSequencer, ToggleOutcome, TransitionPhase, TransitionTimings,
    DARK_CLASS,
};
