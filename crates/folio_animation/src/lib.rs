//! Folio Animation System
//!
//! Easing curves, tweens, scroll-triggered reveals, and text effects.
//!
//! # Features
//!
//! - **Easing**: CSS timing functions evaluated on the CPU
//! - **Tweens and Timelines**: Delayed, eased value transitions with offsets
//! - **Reveal**: Hidden-to-resting pose for sections entering the viewport
//! - **Typewriter**: Character-by-character text reveal on the event loop

pub mod easing;
pub mod reveal;
pub mod timeline;
pub mod typewriter;

pub use easing::Easing;
pub use reveal::{Offset, RevealAnimator, RevealConfig, RevealDirection, RevealStyle};
pub use timeline::{Timeline, TimelineEntryId, Tween};
pub use typewriter::{Typewriter, TypewriterConfig};
