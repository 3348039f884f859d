//! Loading screen
//!
//! Shows a progress counter that climbs by a random step every
//! `tick_ms`, capped at 100. After `min_display_ms` the screen fades out
//! over `exit_ms` and then reports completion exactly once.
//!
//! A screen held with [`LoadingScreen::hold_until_ready`] also waits for its
//! [`ReadySignal`]; the exit starts once both the minimum display time has
//! passed and the signal has resolved, whichever comes second.

use folio_animation::{Easing, Tween};
use folio_core::scheduler::{EventLoop, TaskScope};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingConfig {
    pub enabled: bool,
    /// Interval between progress steps
    pub tick_ms: u64,
    /// Largest single progress step
    pub max_step: f32,
    /// Minimum time the screen stays up
    pub min_display_ms: u64,
    /// Exit fade length
    pub exit_ms: u64,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_ms: 150,
            max_step: 10.0,
            min_display_ms: 2500,
            exit_ms: 500,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingPhase {
    Showing,
    Exiting,
    Finished,
}

/// Source of progress steps in `0.0..1.0`
pub type StepSource = Box<dyn FnMut() -> f32>;

struct LoadingState {
    config: LoadingConfig,
    progress: f32,
    phase: LoadingPhase,
    opacity: Tween,
    step_source: StepSource,
    on_finish: Option<Box<dyn FnOnce()>>,
    min_elapsed: bool,
    ready: bool,
    scope: TaskScope,
}

/// Releases a loading screen held by [`LoadingScreen::hold_until_ready`]
#[derive(Clone)]
pub struct ReadySignal {
    state: Weak<RefCell<LoadingState>>,
}

impl ReadySignal {
    pub fn resolve(&self) {
        let Some(rc) = self.state.upgrade() else {
            return;
        };
        let exit_now = {
            let mut state = rc.borrow_mut();
            state.ready = true;
            state.min_elapsed && state.phase == LoadingPhase::Showing
        };
        if exit_now {
            begin_exit(&self.state);
        }
    }
}

/// Handle to a visible loading screen
pub struct LoadingScreen {
    state: Rc<RefCell<LoadingState>>,
}

impl LoadingScreen {
    pub fn start<F: FnOnce() + 'static>(
        event_loop: &EventLoop,
        config: LoadingConfig,
        on_finish: F,
    ) -> Self {
        Self::start_with_steps(
            event_loop,
            config,
            Box::new(rand::random::<f32>),
            on_finish,
        )
    }

    /// Start with a custom step source instead of the thread RNG
    pub fn start_with_steps<F: FnOnce() + 'static>(
        event_loop: &EventLoop,
        config: LoadingConfig,
        step_source: StepSource,
        on_finish: F,
    ) -> Self {
        let now = event_loop.now_ms();
        let state = Rc::new(RefCell::new(LoadingState {
            config,
            progress: 0.0,
            phase: LoadingPhase::Showing,
            opacity: Tween::settled(1.0, now),
            step_source,
            on_finish: Some(Box::new(on_finish)),
            min_elapsed: false,
            ready: true,
            scope: TaskScope::new(event_loop),
        }));

        {
            let mut s = state.borrow_mut();
            let weak = Rc::downgrade(&state);
            s.scope.set_timeout(config.tick_ms, move || step_progress(&weak));
            let weak = Rc::downgrade(&state);
            s.scope
                .set_timeout(config.min_display_ms, move || min_display_elapsed(&weak));
        }

        Self { state }
    }

    /// Keep the screen up until the returned signal resolves
    ///
    /// Has no effect once the exit has started.
    pub fn hold_until_ready(&self) -> ReadySignal {
        let mut state = self.state.borrow_mut();
        if state.phase == LoadingPhase::Showing {
            state.ready = false;
        }
        ReadySignal {
            state: Rc::downgrade(&self.state),
        }
    }

    /// Progress in percent, 0..=100
    pub fn progress(&self) -> f32 {
        self.state.borrow().progress
    }

    /// Progress as displayed (rounded)
    pub fn percent(&self) -> u32 {
        self.progress().round() as u32
    }

    pub fn phase(&self) -> LoadingPhase {
        self.state.borrow().phase
    }

    pub fn finished(&self) -> bool {
        self.phase() == LoadingPhase::Finished
    }

    /// Screen opacity now
    pub fn opacity(&self) -> f32 {
        let state = self.state.borrow();
        let now = state.scope.event_loop().now_ms();
        state.opacity.value_at(now)
    }

    /// Remove the screen without finishing
    pub fn cancel(&self) {
        let callback = {
            let mut state = self.state.borrow_mut();
            state.scope.cancel_all();
            state.on_finish.take()
        };
        drop(callback);
    }
}

fn step_progress(weak: &Weak<RefCell<LoadingState>>) {
    let Some(rc) = weak.upgrade() else {
        return;
    };
    let mut state = rc.borrow_mut();
    if state.phase == LoadingPhase::Finished {
        return;
    }

    let step = (state.step_source)().clamp(0.0, 1.0) * state.config.max_step;
    state.progress = (state.progress + step).min(100.0);
    tracing::trace!(progress = state.progress, "loading progress");

    let interval = state.config.tick_ms;
    let next = weak.clone();
    state.scope.set_timeout(interval, move || step_progress(&next));
}

fn min_display_elapsed(weak: &Weak<RefCell<LoadingState>>) {
    let Some(rc) = weak.upgrade() else {
        return;
    };
    let exit_now = {
        let mut state = rc.borrow_mut();
        state.min_elapsed = true;
        if !state.ready {
            tracing::debug!("minimum display elapsed, waiting for content");
        }
        state.ready
    };
    if exit_now {
        begin_exit(weak);
    }
}

fn begin_exit(weak: &Weak<RefCell<LoadingState>>) {
    let Some(rc) = weak.upgrade() else {
        return;
    };
    let mut state = rc.borrow_mut();
    let now = state.scope.event_loop().now_ms();
    let exit_ms = state.config.exit_ms;

    state.phase = LoadingPhase::Exiting;
    state.opacity = Tween::new(1.0, 0.0, now, exit_ms).with_easing(Easing::EaseInOut);
    tracing::debug!(progress = state.progress, "loading screen exiting");

    let next = weak.clone();
    state.scope.set_timeout(exit_ms, move || finish(&next));
}

fn finish(weak: &Weak<RefCell<LoadingState>>) {
    let Some(rc) = weak.upgrade() else {
        return;
    };
    let callback = {
        let mut state = rc.borrow_mut();
        state.phase = LoadingPhase::Finished;
        state.scope.cancel_all();
        state.on_finish.take()
    };
    if let Some(callback) = callback {
        callback();
    }
}
