//! Staged content mounting
//!
//! [`StageScheduler`] walks the ordered [`LoadingStage`]s once per page
//! load. The first advance (Critical to High) happens on the first
//! animation frame after mount. Each later advance is a timer of
//! `current_index × step_ms`, so with the default 150 ms step High lasts
//! 150 ms and Medium 300 ms. Low is terminal.
//!
//! Consumers gate content with [`StageScheduler::is_open`] and can subscribe
//! with [`StageScheduler::on_advance`]; every stage is announced exactly
//! once, in order.

use folio_core::scheduler::{EventLoop, TaskId, TaskScope};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;
use thiserror::Error;

/// Default per-index delay between timed advances
pub const DEFAULT_STAGE_STEP_MS: u64 = 150;

/// Coarse mount gate, strictly ordered
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LoadingStage {
    #[default]
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown loading stage `{0}`")]
pub struct UnknownStage(pub String);

impl LoadingStage {
    pub const ALL: [LoadingStage; 4] = [
        LoadingStage::Critical,
        LoadingStage::High,
        LoadingStage::Medium,
        LoadingStage::Low,
    ];

    pub fn index(&self) -> u64 {
        *self as u64
    }

    /// The following stage, `None` at Low
    pub fn next(&self) -> Option<LoadingStage> {
        match self {
            LoadingStage::Critical => Some(LoadingStage::High),
            LoadingStage::High => Some(LoadingStage::Medium),
            LoadingStage::Medium => Some(LoadingStage::Low),
            LoadingStage::Low => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadingStage::Critical => "critical",
            LoadingStage::High => "high",
            LoadingStage::Medium => "medium",
            LoadingStage::Low => "low",
        }
    }
}

impl fmt::Display for LoadingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadingStage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStage(s.to_string()))
    }
}

type StageListener = Box<dyn FnMut(LoadingStage)>;

struct SchedulerState {
    stage: LoadingStage,
    step_ms: u64,
    pending: Option<TaskId>,
    listeners: Vec<StageListener>,
    /// (stage, time entered)
    history: Vec<(LoadingStage, u64)>,
    torn_down: bool,
    scope: TaskScope,
}

/// Advances the loading stages for one page load
pub struct StageScheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl StageScheduler {
    /// Start at Critical and request the frame that opens High
    pub fn mount(event_loop: &EventLoop) -> Self {
        Self::mount_with_step(event_loop, DEFAULT_STAGE_STEP_MS)
    }

    pub fn mount_with_step(event_loop: &EventLoop, step_ms: u64) -> Self {
        let state = Rc::new(RefCell::new(SchedulerState {
            stage: LoadingStage::Critical,
            step_ms,
            pending: None,
            listeners: Vec::new(),
            history: vec![(LoadingStage::Critical, event_loop.now_ms())],
            torn_down: false,
            scope: TaskScope::new(event_loop),
        }));

        {
            let weak = Rc::downgrade(&state);
            let mut s = state.borrow_mut();
            let id = s.scope.request_frame(move || {
                advance(&weak);
            });
            s.pending = Some(id);
        }

        Self { state }
    }

    pub fn current(&self) -> LoadingStage {
        self.state.borrow().stage
    }

    /// Mount gate: `current >= required`
    pub fn is_open(&self, required: LoadingStage) -> bool {
        self.current() >= required
    }

    pub fn is_complete(&self) -> bool {
        self.current() == LoadingStage::Low
    }

    /// Called with each stage as it is entered
    pub fn on_advance<F: FnMut(LoadingStage) + 'static>(&self, listener: F) {
        self.state.borrow_mut().listeners.push(Box::new(listener));
    }

    /// Advance one stage now, replacing any pending scheduled advance.
    /// Returns the stage entered; `None` at Low or after teardown.
    pub fn tick(&self) -> Option<LoadingStage> {
        {
            let mut state = self.state.borrow_mut();
            if state.torn_down {
                return None;
            }
            if let Some(id) = state.pending.take() {
                state.scope.cancel(id);
            }
        }
        advance(&Rc::downgrade(&self.state))
    }

    /// Stages entered so far with the loop time they were entered at
    pub fn history(&self) -> Vec<(LoadingStage, u64)> {
        self.state.borrow().history.clone()
    }

    /// Whether a timed or frame advance is still queued
    pub fn has_pending(&self) -> bool {
        self.state.borrow().scope.outstanding() > 0
    }

    /// Cancel pending advances and drop listeners; the stage freezes
    pub fn teardown(&self) {
        let listeners = {
            let mut state = self.state.borrow_mut();
            state.torn_down = true;
            state.pending = None;
            let cancelled = state.scope.cancel_all();
            if cancelled > 0 {
                tracing::debug!(stage = %state.stage, cancelled, "stage scheduler torn down");
            }
            std::mem::take(&mut state.listeners)
        };
        drop(listeners);
    }
}

impl Drop for StageScheduler {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for StageScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageScheduler")
            .field("stage", &self.current())
            .finish()
    }
}

fn advance(weak: &Weak<RefCell<SchedulerState>>) -> Option<LoadingStage> {
    let rc = weak.upgrade()?;

    let (stage, mut listeners) = {
        let mut state = rc.borrow_mut();
        if state.torn_down {
            return None;
        }
        state.pending = None;
        let stage = state.stage.next()?;

        let now = state.scope.event_loop().now_ms();
        state.stage = stage;
        state.history.push((stage, now));
        tracing::debug!(%stage, at_ms = now, "loading stage advanced");

        if stage.next().is_some() {
            let delay = stage.index() * state.step_ms;
            let next = weak.clone();
            let id = state.scope.set_timeout(delay, move || {
                advance(&next);
            });
            state.pending = Some(id);
        }

        (stage, std::mem::take(&mut state.listeners))
    };

    for listener in listeners.iter_mut() {
        listener(stage);
    }

    // Keep listeners registered while notifying, after the originals
    let mut state = rc.borrow_mut();
    if !state.torn_down {
        listeners.append(&mut state.listeners);
        state.listeners = listeners;
    }

    Some(stage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_first_advance_is_frame_based() {
        let event_loop = EventLoop::with_frame_interval(16);
        let stages = StageScheduler::mount(&event_loop);
        assert_eq!(stages.current(), LoadingStage::Critical);

        event_loop.tick(1);
        assert_eq!(stages.current(), LoadingStage::High);
    }

    #[test]
    fn test_timed_advances_back_load() {
        let event_loop = EventLoop::with_frame_interval(10);
        let stages = StageScheduler::mount(&event_loop);

        event_loop.tick(10);
        assert_eq!(stages.current(), LoadingStage::High);

        event_loop.advance(140);
        assert_eq!(stages.current(), LoadingStage::High);
        event_loop.advance(10);
        assert_eq!(stages.current(), LoadingStage::Medium);

        event_loop.advance(290);
        assert_eq!(stages.current(), LoadingStage::Medium);
        event_loop.advance(10);
        assert_eq!(stages.current(), LoadingStage::Low);
        assert!(!stages.has_pending());

        let times: Vec<u64> = stages.history().iter().map(|(_, at)| *at).collect();
        assert_eq!(times, vec![0, 10, 160, 460]);
    }

    #[test]
    fn test_listeners_see_every_stage_in_order() {
        let event_loop = EventLoop::with_frame_interval(10);
        let stages = StageScheduler::mount(&event_loop);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        stages.on_advance(move |stage| sink.borrow_mut().push(stage));

        event_loop.advance(1000);
        assert_eq!(
            *seen.borrow(),
            vec![LoadingStage::High, LoadingStage::Medium, LoadingStage::Low]
        );
    }

    #[test]
    fn test_manual_tick_never_skips() {
        let event_loop = EventLoop::new();
        let stages = StageScheduler::mount(&event_loop);
        let mut observed = vec![stages.current()];
        while let Some(stage) = stages.tick() {
            observed.push(stage);
        }
        assert_eq!(observed, LoadingStage::ALL.to_vec());

        // Nothing left to fire
        event_loop.advance(1000);
        assert_eq!(stages.history().len(), 4);
    }

    #[test]
    fn test_teardown_freezes_stage() {
        let event_loop = EventLoop::with_frame_interval(10);
        let stages = StageScheduler::mount(&event_loop);
        let calls = Rc::new(RefCell::new(0));
        let sink = calls.clone();
        stages.on_advance(move |_| *sink.borrow_mut() += 1);

        event_loop.tick(10);
        stages.teardown();
        assert_eq!(event_loop.pending(), 0);

        event_loop.advance(1000);
        assert_eq!(stages.current(), LoadingStage::High);
        assert_eq!(stages.tick(), None);
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_drop_cancels_pending_frame() {
        let event_loop = EventLoop::new();
        let stages = StageScheduler::mount(&event_loop);
        assert_eq!(event_loop.pending(), 1);
        drop(stages);
        assert_eq!(event_loop.pending(), 0);
    }

    #[test]
    fn test_stage_parsing_and_order() {
        assert_eq!("medium".parse(), Ok(LoadingStage::Medium));
        assert!("urgent".parse::<LoadingStage>().is_err());
        assert!(LoadingStage::Critical < LoadingStage::High);
        assert_eq!(LoadingStage::Low.next(), None);
    }
}
