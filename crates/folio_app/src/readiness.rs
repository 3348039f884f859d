//! Bounded readiness wait
//!
//! Polls a readiness predicate on the event loop and resolves as soon as it
//! holds, or when the ceiling elapses. The page never waits on content
//! indefinitely: hitting the ceiling is a normal outcome, not an error.

use folio_core::scheduler::{EventLoop, TaskScope};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub const DEFAULT_POLL_MS: u64 = 100;
pub const DEFAULT_CEILING_MS: u64 = 2500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReadinessOutcome {
    /// The predicate held after `waited_ms`
    Ready { waited_ms: u64 },
    /// The ceiling elapsed first; the page proceeds anyway
    CeilingReached { waited_ms: u64 },
}

impl ReadinessOutcome {
    pub fn waited_ms(&self) -> u64 {
        match self {
            ReadinessOutcome::Ready { waited_ms } | ReadinessOutcome::CeilingReached { waited_ms } => {
                *waited_ms
            }
        }
    }
}

type Predicate = Box<dyn Fn() -> bool>;
type Completion = Box<dyn FnOnce(ReadinessOutcome)>;

struct WaitState {
    started_ms: u64,
    poll_ms: u64,
    ceiling_ms: u64,
    predicate: Predicate,
    on_done: Option<Completion>,
    outcome: Option<ReadinessOutcome>,
    scope: TaskScope,
}

/// A running readiness wait
pub struct ReadinessWait {
    state: Rc<RefCell<WaitState>>,
}

impl ReadinessWait {
    pub fn start<P, F>(
        event_loop: &EventLoop,
        poll_ms: u64,
        ceiling_ms: u64,
        predicate: P,
        on_done: F,
    ) -> Self
    where
        P: Fn() -> bool + 'static,
        F: FnOnce(ReadinessOutcome) + 'static,
    {
        let state = Rc::new(RefCell::new(WaitState {
            started_ms: event_loop.now_ms(),
            poll_ms: poll_ms.max(1),
            ceiling_ms,
            predicate: Box::new(predicate),
            on_done: Some(Box::new(on_done)),
            outcome: None,
            scope: TaskScope::new(event_loop),
        }));

        {
            let mut s = state.borrow_mut();
            let delay = s.poll_ms.min(ceiling_ms);
            let weak = Rc::downgrade(&state);
            s.scope.set_timeout(delay, move || poll(&weak));
        }

        Self { state }
    }

    /// Resolved outcome, `None` while still waiting
    pub fn outcome(&self) -> Option<ReadinessOutcome> {
        self.state.borrow().outcome
    }

    pub fn is_pending(&self) -> bool {
        self.outcome().is_none()
    }

    /// Stop waiting without resolving
    pub fn cancel(&self) {
        let completion = {
            let mut state = self.state.borrow_mut();
            state.scope.cancel_all();
            state.on_done.take()
        };
        drop(completion);
    }
}

fn poll(weak: &Weak<RefCell<WaitState>>) {
    let Some(rc) = weak.upgrade() else {
        return;
    };

    let resolved = {
        let mut state = rc.borrow_mut();
        let waited = state.scope.event_loop().now_ms() - state.started_ms;

        let outcome = if (state.predicate)() {
            Some(ReadinessOutcome::Ready { waited_ms: waited })
        } else if waited >= state.ceiling_ms {
            Some(ReadinessOutcome::CeilingReached { waited_ms: waited })
        } else {
            None
        };

        match outcome {
            Some(outcome) => {
                state.outcome = Some(outcome);
                match outcome {
                    ReadinessOutcome::Ready { .. } => {
                        tracing::debug!(waited_ms = waited, "content ready")
                    }
                    ReadinessOutcome::CeilingReached { .. } => {
                        tracing::info!(waited_ms = waited, "readiness ceiling reached, proceeding")
                    }
                }
                state.on_done.take().map(|done| (done, outcome))
            }
            None => {
                let delay = state.poll_ms.min(state.ceiling_ms - waited);
                let next = weak.clone();
                state.scope.set_timeout(delay, move || poll(&next));
                None
            }
        }
    };

    if let Some((done, outcome)) = resolved {
        done(outcome);
    }
}
