//! Folio Layout
//!
//! Geometry for a vertically scrolling page:
//!
//! - [`Viewport`] and [`Rect`]: the visible window and element bounds
//! - [`GeometryObserver`]: threshold-crossing visibility notifications
//! - [`SectionId`] and [`SectionLayout`]: addressable content blocks and
//!   in-page anchor navigation

pub mod geometry;
pub mod observer;
pub mod section;

pub use geometry::{Rect, Viewport};
pub use observer::{ElementId, GeometryObserver, ObservationId, Unobserve, VisibilityObserver};
pub use section::{SectionId, SectionLayout, UnknownSection};
