//! Typewriter text effect
//!
//! Reveals a string one character at a time on the event loop. With
//! `looping` enabled the text is cleared after a pause and typed again.
//! All pending steps belong to the effect's [`TaskScope`], so dropping the
//! [`Typewriter`] stops it.

use folio_core::scheduler::{EventLoop, TaskScope};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypewriterConfig {
    /// Milliseconds between characters
    pub speed_ms: u64,
    /// Milliseconds before the first character
    pub delay_ms: u64,
    /// Restart after finishing
    pub looping: bool,
    /// Pause with the full text shown before a loop restarts
    pub loop_pause_ms: u64,
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            speed_ms: 30,
            delay_ms: 0,
            looping: false,
            loop_pause_ms: 2000,
        }
    }
}

struct TypewriterState {
    chars: Vec<char>,
    shown: usize,
    cycles: u32,
    config: TypewriterConfig,
    scope: TaskScope,
}

/// Handle to a running typewriter effect
pub struct Typewriter {
    state: Rc<RefCell<TypewriterState>>,
}

impl Typewriter {
    /// Start typing `text` on `event_loop`
    pub fn start(event_loop: &EventLoop, text: &str, config: TypewriterConfig) -> Self {
        let state = Rc::new(RefCell::new(TypewriterState {
            chars: text.chars().collect(),
            shown: 0,
            cycles: 0,
            config,
            scope: TaskScope::new(event_loop),
        }));

        {
            let mut s = state.borrow_mut();
            if !s.chars.is_empty() {
                let first = config.delay_ms + config.speed_ms;
                schedule(&mut s, Rc::downgrade(&state), first);
            }
        }

        Self { state }
    }

    /// Text typed so far
    pub fn displayed(&self) -> String {
        let state = self.state.borrow();
        state.chars[..state.shown].iter().collect()
    }

    /// Whether the full text is currently shown
    pub fn is_complete(&self) -> bool {
        let state = self.state.borrow();
        state.shown == state.chars.len()
    }

    /// Number of times the text restarted after completing
    pub fn cycles(&self) -> u32 {
        self.state.borrow().cycles
    }

    /// Stop typing; the displayed text stays as it is
    pub fn stop(&self) {
        self.state.borrow_mut().scope.cancel_all();
    }
}

fn schedule(state: &mut TypewriterState, weak: Weak<RefCell<TypewriterState>>, delay_ms: u64) {
    state.scope.set_timeout(delay_ms, move || step(&weak));
}

fn step(weak: &Weak<RefCell<TypewriterState>>) {
    let Some(rc) = weak.upgrade() else {
        return;
    };
    let mut state = rc.borrow_mut();
    let config = state.config;
    let total = state.chars.len();

    if state.shown < total {
        state.shown += 1;
        if state.shown < total {
            schedule(&mut state, weak.clone(), config.speed_ms);
        } else if config.looping {
            schedule(&mut state, weak.clone(), config.loop_pause_ms);
        } else {
            tracing::trace!(chars = total, "typewriter finished");
        }
    } else {
        // Loop restart: clear, then type again
        state.shown = 0;
        state.cycles += 1;
        schedule(&mut state, weak.clone(), config.speed_ms);
    }
}
