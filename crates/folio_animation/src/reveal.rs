//! Scroll-triggered reveal animations
//!
//! A [`RevealAnimator`] turns a visibility signal into a paired
//! (opacity, transform) pose. Hidden elements sit offset along the configured
//! direction with zero opacity; visible elements rest at the identity
//! transform with full opacity. The CSS transition carries the motion between
//! the two poses.
//!
//! The direction names describe the motion the source page shipped with:
//! `Up` starts the element *below* its resting place (positive Y) and
//! `Left` starts it to the *right* (positive X).

use crate::easing::Easing;
use crate::timeline::Tween;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction an element travels while being revealed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevealDirection {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

/// Per-element reveal configuration, immutable once bound
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub direction: RevealDirection,
    /// Transition delay in seconds
    pub delay_s: f32,
    /// Transition duration in seconds
    pub duration_s: f32,
    /// Travel distance in pixels
    pub distance_px: f32,
    /// Intersection ratio (0..=1) at which the element counts as visible
    pub threshold: f32,
    /// Once revealed, stay revealed even after leaving the viewport
    pub once: bool,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            direction: RevealDirection::Up,
            delay_s: 0.0,
            duration_s: 0.7,
            distance_px: 50.0,
            threshold: 0.1,
            once: true,
        }
    }
}

impl RevealConfig {
    pub fn direction(mut self, direction: RevealDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn delay(mut self, delay_s: f32) -> Self {
        self.delay_s = delay_s;
        self
    }

    pub fn duration(mut self, duration_s: f32) -> Self {
        self.duration_s = duration_s;
        self
    }

    pub fn distance(mut self, distance_px: f32) -> Self {
        self.distance_px = distance_px;
        self
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    /// Offset applied while the element is hidden
    ///
    /// `Up` starts below the resting position and rises into place, so its
    /// hidden offset is a positive Y translation. `Left` likewise starts to
    /// the right.
    pub fn hidden_offset(&self) -> Offset {
        let d = self.distance_px;
        match self.direction {
            RevealDirection::Up => Offset::new(0.0, d),
            RevealDirection::Down => Offset::new(0.0, -d),
            RevealDirection::Left => Offset::new(d, 0.0),
            RevealDirection::Right => Offset::new(-d, 0.0),
        }
    }

    fn delay_ms(&self) -> u64 {
        (self.delay_s.max(0.0) * 1000.0).round() as u64
    }

    fn duration_ms(&self) -> u64 {
        (self.duration_s.max(0.0) * 1000.0).round() as u64
    }
}

/// 2D translation in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

impl Offset {
    pub const ZERO: Offset = Offset { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn scale(&self, factor: f32) -> Offset {
        Offset::new(self.x * factor, self.y * factor)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            write!(f, "translate3d(0, 0, 0)")
        } else if self.x == 0.0 {
            write!(f, "translateY({}px)", self.y)
        } else if self.y == 0.0 {
            write!(f, "translateX({}px)", self.x)
        } else {
            write!(f, "translate({}px, {}px)", self.x, self.y)
        }
    }
}

/// The complete style of a revealable element
///
/// Opacity and transform only ever change together.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealStyle {
    pub opacity: f32,
    pub transform: Offset,
    pub duration_s: f32,
    pub delay_s: f32,
    pub easing: Easing,
}

impl RevealStyle {
    /// Inline CSS declarations for the element
    pub fn css(&self) -> String {
        let easing = self.easing.css();
        format!(
            "opacity: {}; transform: {}; transition: opacity {d}s {e}, transform {d}s {e}; transition-delay: {}s",
            self.opacity,
            self.transform,
            self.delay_s,
            d = self.duration_s,
            e = easing,
        )
    }
}

/// Drives one element between its hidden and resting poses
#[derive(Clone, Debug)]
pub struct RevealAnimator {
    config: RevealConfig,
    visible: bool,
    /// Set the first time the element becomes visible when `once` is on
    latched: bool,
    /// Eased progress toward the resting pose, anchored at the last flip
    progress: Tween,
}

impl RevealAnimator {
    pub fn new(config: RevealConfig) -> Self {
        Self {
            config,
            visible: false,
            latched: false,
            progress: Tween::settled(0.0, 0),
        }
    }

    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    /// Feed the latest visibility signal. Returns true if the pose changed.
    pub fn set_visible(&mut self, visible: bool, now_ms: u64) -> bool {
        if self.latched && !visible {
            return false;
        }
        if self.visible == visible {
            return false;
        }

        self.visible = visible;
        if visible && self.config.once {
            self.latched = true;
        }

        let target = if visible { 1.0 } else { 0.0 };
        self.progress = self
            .progress
            .retarget(target, now_ms, self.config.duration_ms())
            .with_delay(self.config.delay_ms())
            .with_easing(Easing::EaseOut);

        tracing::trace!(visible, now_ms, latched = self.latched, "reveal pose changed");
        true
    }

    /// Whether the resting pose is the current target
    pub fn is_revealed(&self) -> bool {
        self.visible
    }

    /// Target style for the current visibility
    pub fn style(&self) -> RevealStyle {
        let (opacity, transform) = if self.visible {
            (1.0, Offset::ZERO)
        } else {
            (0.0, self.config.hidden_offset())
        };
        RevealStyle {
            opacity,
            transform,
            duration_s: self.config.duration_s,
            delay_s: self.config.delay_s,
            easing: Easing::EaseOut,
        }
    }

    /// Interpolated (opacity, transform) at `now_ms`, as the transition would render it
    pub fn sample(&self, now_ms: u64) -> (f32, Offset) {
        let p = self.progress.value_at(now_ms).clamp(0.0, 1.0);
        (p, self.config.hidden_offset().scale(1.0 - p))
    }

    /// Whether the transition toward the current target has finished
    pub fn is_settled(&self, now_ms: u64) -> bool {
        self.progress.is_complete(now_ms)
    }
}
