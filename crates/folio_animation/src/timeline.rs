//! Tweens and timeline orchestration
//!
//! A [`Tween`] is a single delayed, eased transition between two values,
//! anchored to the event loop time at which it started. A [`Timeline`]
//! groups tweens by offset so a staggered cascade can be sampled at any
//! local time.

use crate::easing::Easing;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct TimelineEntryId;
}

/// A value transition anchored at `start_ms`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub start_ms: u64,
    pub delay_ms: u64,
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: f32, to: f32, start_ms: u64, duration_ms: u64) -> Self {
        Self {
            from,
            to,
            start_ms,
            delay_ms: 0,
            duration_ms,
            easing: Easing::default(),
        }
    }

    /// A tween that already sits at `value`
    pub fn settled(value: f32, at_ms: u64) -> Self {
        Self::new(value, value, at_ms, 0)
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Absolute time at which the target value is reached
    pub fn end_ms(&self) -> u64 {
        self.start_ms + self.delay_ms + self.duration_ms
    }

    pub fn is_complete(&self, now_ms: u64) -> bool {
        now_ms >= self.end_ms()
    }

    /// Linear progress in 0..=1 at `now_ms`, before easing
    pub fn progress(&self, now_ms: u64) -> f32 {
        let begin = self.start_ms + self.delay_ms;
        if now_ms <= begin {
            return if self.duration_ms == 0 && now_ms >= begin {
                1.0
            } else {
                0.0
            };
        }
        if self.duration_ms == 0 || now_ms >= self.end_ms() {
            return 1.0;
        }
        (now_ms - begin) as f32 / self.duration_ms as f32
    }

    /// Eased value at `now_ms`
    pub fn value_at(&self, now_ms: u64) -> f32 {
        let p = self.progress(now_ms);
        if p >= 1.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * self.easing.apply(p)
    }

    /// Start a new tween from wherever this one is at `now_ms`
    pub fn retarget(&self, to: f32, now_ms: u64, duration_ms: u64) -> Tween {
        Tween {
            from: self.value_at(now_ms),
            to,
            start_ms: now_ms,
            delay_ms: 0,
            duration_ms,
            easing: self.easing,
        }
    }
}

/// An entry in a timeline
#[derive(Clone, Copy, Debug)]
struct TimelineEntry {
    /// Offset in milliseconds from timeline start
    offset_ms: u64,
    duration_ms: u64,
    start_value: f32,
    end_value: f32,
    easing: Easing,
}

/// A timeline that orchestrates multiple tweens by offset
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    entries: SlotMap<TimelineEntryId, TimelineEntry>,
    order: Vec<TimelineEntryId>,
    duration_ms: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cascade of `count` identical tweens, entry `i` offset by
    /// `base_ms + i * step_ms`
    pub fn stagger(
        count: usize,
        base_ms: u64,
        step_ms: u64,
        duration_ms: u64,
        start_value: f32,
        end_value: f32,
        easing: Easing,
    ) -> Self {
        let mut timeline = Self::new();
        for i in 0..count {
            timeline.add_eased(
                base_ms + step_ms * i as u64,
                duration_ms,
                start_value,
                end_value,
                easing,
            );
        }
        timeline
    }

    /// Add a linear tween at a given offset
    pub fn add(
        &mut self,
        offset_ms: u64,
        duration_ms: u64,
        start_value: f32,
        end_value: f32,
    ) -> TimelineEntryId {
        self.add_eased(offset_ms, duration_ms, start_value, end_value, Easing::Linear)
    }

    pub fn add_eased(
        &mut self,
        offset_ms: u64,
        duration_ms: u64,
        start_value: f32,
        end_value: f32,
        easing: Easing,
    ) -> TimelineEntryId {
        let id = self.entries.insert(TimelineEntry {
            offset_ms,
            duration_ms,
            start_value,
            end_value,
            easing,
        });
        self.order.push(id);
        self.duration_ms = self.duration_ms.max(offset_ms + duration_ms);
        id
    }

    /// Entry ids in insertion order
    pub fn entries(&self) -> &[TimelineEntryId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Local time at which every entry has finished
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn is_complete(&self, local_ms: u64) -> bool {
        local_ms >= self.duration_ms
    }

    /// Value of an entry at a local time since the timeline started
    pub fn value_at(&self, id: TimelineEntryId, local_ms: u64) -> Option<f32> {
        let entry = self.entries.get(id)?;

        if local_ms < entry.offset_ms {
            return Some(entry.start_value);
        }

        let local = local_ms - entry.offset_ms;
        if local >= entry.duration_ms {
            return Some(entry.end_value);
        }

        let progress = entry.easing.apply(local as f32 / entry.duration_ms as f32);
        Some(entry.start_value + (entry.end_value - entry.start_value) * progress)
    }

    /// Value of the `index`-th entry in insertion order
    pub fn value_at_index(&self, index: usize, local_ms: u64) -> Option<f32> {
        self.order
            .get(index)
            .and_then(|&id| self.value_at(id, local_ms))
    }

    /// Offset of an entry from the timeline start
    pub fn offset_of(&self, id: TimelineEntryId) -> Option<u64> {
        self.entries.get(id).map(|e| e.offset_ms)
    }
}
