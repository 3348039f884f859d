//! Event loop
//!
//! A deterministic, single-threaded stand-in for the host's timer and
//! animation-frame queues. Every registration returns a [`TaskHandle`] that
//! can cancel the pending callback, and [`TaskScope`] owns the handles of one
//! component so its teardown cancels everything it scheduled.
//!
//! Present hooks registered with [`EventLoop::on_present`] run after every
//! frame's callbacks; they are not tasks and never count as pending work.
//!
//! Time only moves when the owner calls [`EventLoop::tick`] or
//! [`EventLoop::advance`], which makes choreography fully reproducible in
//! tests and headless runs.

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

new_key_type! {
    /// Unique identifier for a scheduled timer or frame callback
    pub struct TaskId;

    /// Identifier of a registered present hook
    pub struct HookId;
}

/// Default logical frame interval (~60fps)
pub const DEFAULT_FRAME_MS: u64 = 16;

type Callback = Box<dyn FnOnce()>;
type PresentFn = Rc<RefCell<dyn FnMut(u64)>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TaskKind {
    /// Fires once the clock reaches `due_ms`
    Timeout { due_ms: u64 },
    /// Fires on the first frame boundary after `requested_frame`
    Frame { requested_frame: u64 },
}

struct Task {
    kind: TaskKind,
    seq: u64,
    callback: Callback,
}

struct LoopState {
    now_ms: u64,
    frame_index: u64,
    frame_ms: u64,
    next_seq: u64,
    tasks: SlotMap<TaskId, Task>,
    present_hooks: SlotMap<HookId, PresentFn>,
}

impl LoopState {
    fn insert(&mut self, kind: TaskKind, callback: Callback) -> TaskId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.insert(Task {
            kind,
            seq,
            callback,
        })
    }

    /// Earliest timer due at or before `limit_ms`, ties broken by registration order
    fn next_due(&self, limit_ms: u64) -> Option<(TaskId, u64)> {
        self.tasks
            .iter()
            .filter_map(|(id, task)| match task.kind {
                TaskKind::Timeout { due_ms } if due_ms <= limit_ms => Some((id, due_ms, task.seq)),
                _ => None,
            })
            .min_by_key(|&(_, due_ms, seq)| (due_ms, seq))
            .map(|(id, due_ms, _)| (id, due_ms))
    }

    /// Frame callbacks requested before `frame_index` began, in request order
    fn frames_before(&self, frame_index: u64) -> Vec<TaskId> {
        let mut ready: Vec<(TaskId, u64)> = self
            .tasks
            .iter()
            .filter_map(|(id, task)| match task.kind {
                TaskKind::Frame { requested_frame } if requested_frame < frame_index => {
                    Some((id, task.seq))
                }
                _ => None,
            })
            .collect();
        ready.sort_by_key(|&(_, seq)| seq);
        ready.into_iter().map(|(id, _)| id).collect()
    }
}

/// Handle to the shared event loop
///
/// Cloning is cheap; all clones drive the same clock and queue.
#[derive(Clone)]
pub struct EventLoop {
    state: Rc<RefCell<LoopState>>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::with_frame_interval(DEFAULT_FRAME_MS)
    }

    /// Create a loop whose `advance` steps in frames of `frame_ms`
    pub fn with_frame_interval(frame_ms: u64) -> Self {
        Self {
            state: Rc::new(RefCell::new(LoopState {
                now_ms: 0,
                frame_index: 0,
                frame_ms: frame_ms.max(1),
                next_seq: 0,
                tasks: SlotMap::with_key(),
                present_hooks: SlotMap::with_key(),
            })),
        }
    }

    /// Current logical time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.state.borrow().now_ms
    }

    /// Number of frames presented so far
    pub fn frame_index(&self) -> u64 {
        self.state.borrow().frame_index
    }

    pub fn frame_interval(&self) -> u64 {
        self.state.borrow().frame_ms
    }

    /// Schedule `callback` to run `delay_ms` from now
    pub fn set_timeout<F: FnOnce() + 'static>(&self, delay_ms: u64, callback: F) -> TaskHandle {
        let mut state = self.state.borrow_mut();
        let due_ms = state.now_ms.saturating_add(delay_ms);
        let id = state.insert(TaskKind::Timeout { due_ms }, Box::new(callback));
        tracing::trace!(?id, due_ms, "timeout scheduled");
        TaskHandle {
            id,
            state: Rc::downgrade(&self.state),
        }
    }

    /// Schedule `callback` for the next frame boundary
    pub fn request_frame<F: FnOnce() + 'static>(&self, callback: F) -> TaskHandle {
        let mut state = self.state.borrow_mut();
        let requested_frame = state.frame_index;
        let id = state.insert(TaskKind::Frame { requested_frame }, Box::new(callback));
        tracing::trace!(?id, requested_frame, "frame requested");
        TaskHandle {
            id,
            state: Rc::downgrade(&self.state),
        }
    }

    /// Cancel a pending task. Returns false if it already ran or was cancelled.
    pub fn cancel(&self, id: TaskId) -> bool {
        self.state.borrow_mut().tasks.remove(id).is_some()
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.state.borrow().tasks.contains_key(id)
    }

    /// Number of timers and frame callbacks still queued
    pub fn pending(&self) -> usize {
        self.state.borrow().tasks.len()
    }

    /// Advance the clock by `dt_ms` and present one frame
    ///
    /// Timers due inside the step fire first, in due-time order, with the
    /// clock set to their due time so nested registrations stay relative to
    /// it. Frame callbacks requested before the frame began fire afterwards.
    /// Returns the number of callbacks that ran.
    pub fn tick(&self, dt_ms: u64) -> usize {
        let target_ms = self.state.borrow().now_ms.saturating_add(dt_ms);
        let mut ran = 0;

        loop {
            let task = {
                let mut state = self.state.borrow_mut();
                let Some((id, due_ms)) = state.next_due(target_ms) else {
                    break;
                };
                state.now_ms = state.now_ms.max(due_ms);
                state.tasks.remove(id)
            };
            if let Some(task) = task {
                (task.callback)();
                ran += 1;
            }
        }

        let (frame_index, frame_ids) = {
            let mut state = self.state.borrow_mut();
            state.now_ms = target_ms;
            state.frame_index += 1;
            let frame_index = state.frame_index;
            (frame_index, state.frames_before(frame_index))
        };

        for id in frame_ids {
            // An earlier callback in this frame may have cancelled it
            let task = self.state.borrow_mut().tasks.remove(id);
            if let Some(task) = task {
                (task.callback)();
                ran += 1;
            }
        }

        let hooks: SmallVec<[PresentFn; 2]> =
            self.state.borrow().present_hooks.values().cloned().collect();
        for hook in hooks {
            (&mut *hook.borrow_mut())(frame_index);
        }

        ran
    }

    /// Run `hook` with the frame index after every presented frame
    ///
    /// The hook stays registered until the returned guard is dropped.
    pub fn on_present<F: FnMut(u64) + 'static>(&self, hook: F) -> PresentHook {
        let hook: PresentFn = Rc::new(RefCell::new(hook));
        let id = self.state.borrow_mut().present_hooks.insert(hook);
        PresentHook {
            id,
            state: Rc::downgrade(&self.state),
        }
    }

    /// Advance the clock by `ms`, presenting a frame every frame interval
    pub fn advance(&self, ms: u64) -> usize {
        let frame_ms = self.frame_interval();
        let mut remaining = ms;
        let mut ran = 0;
        while remaining > 0 {
            let step = remaining.min(frame_ms);
            ran += self.tick(step);
            remaining -= step;
        }
        ran
    }

    /// Keep presenting frames until nothing is queued or `max_ms` elapsed
    pub fn run_until_idle(&self, max_ms: u64) -> usize {
        let frame_ms = self.frame_interval();
        let mut elapsed = 0;
        let mut ran = 0;
        while self.pending() > 0 && elapsed < max_ms {
            ran += self.tick(frame_ms);
            elapsed += frame_ms;
        }
        ran
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EventLoop")
            .field("now_ms", &state.now_ms)
            .field("frame_index", &state.frame_index)
            .field("pending", &state.tasks.len())
            .finish()
    }
}

/// Cancellation token for a scheduled callback
///
/// Holds only a weak link to the loop, so cancelling after the loop is gone
/// is a harmless no-op.
#[derive(Clone, Debug)]
pub struct TaskHandle {
    id: TaskId,
    state: Weak<RefCell<LoopState>>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Cancel the callback. Returns true if it was still pending.
    pub fn cancel(&self) -> bool {
        match self.state.upgrade() {
            Some(state) => state.borrow_mut().tasks.remove(self.id).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state
            .upgrade()
            .map(|state| state.borrow().tasks.contains_key(self.id))
            .unwrap_or(false)
    }
}

/// Registration guard for [`EventLoop::on_present`]
#[derive(Debug)]
pub struct PresentHook {
    id: HookId,
    state: Weak<RefCell<LoopState>>,
}

impl PresentHook {
    pub fn id(&self) -> HookId {
        self.id
    }
}

impl Drop for PresentHook {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state.borrow_mut().present_hooks.remove(self.id);
        }
    }
}

/// Owner of every task a component registers
///
/// Dropping the scope (or calling [`TaskScope::cancel_all`]) cancels all
/// outstanding timers and frame callbacks, so nothing fires for a component
/// that has been torn down.
pub struct TaskScope {
    event_loop: EventLoop,
    handles: SmallVec<[TaskHandle; 4]>,
}

impl TaskScope {
    pub fn new(event_loop: &EventLoop) -> Self {
        Self {
            event_loop: event_loop.clone(),
            handles: SmallVec::new(),
        }
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    pub fn set_timeout<F: FnOnce() + 'static>(&mut self, delay_ms: u64, callback: F) -> TaskId {
        self.prune();
        let handle = self.event_loop.set_timeout(delay_ms, callback);
        let id = handle.id();
        self.handles.push(handle);
        id
    }

    pub fn request_frame<F: FnOnce() + 'static>(&mut self, callback: F) -> TaskId {
        self.prune();
        let handle = self.event_loop.request_frame(callback);
        let id = handle.id();
        self.handles.push(handle);
        id
    }

    /// Cancel a single task owned by this scope
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let cancelled = self.event_loop.cancel(id);
        self.handles.retain(|h| h.id() != id);
        cancelled
    }

    /// Number of owned tasks that have not fired yet
    pub fn outstanding(&self) -> usize {
        self.handles.iter().filter(|h| h.is_pending()).count()
    }

    /// Cancel everything this scope still owns. Returns how many were pending.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.handles.drain(..).filter(|h| h.cancel()).count();
        if cancelled > 0 {
            tracing::trace!(cancelled, "task scope cancelled pending work");
        }
        cancelled
    }

    fn prune(&mut self) {
        self.handles.retain(|h| h.is_pending());
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_timeouts_fire_in_due_order() {
        let event_loop = EventLoop::new();
        let log: Rc<RefCell<Vec<&str>>> = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        event_loop.set_timeout(300, move || l.borrow_mut().push("late"));
        let l = log.clone();
        event_loop.set_timeout(150, move || l.borrow_mut().push("early"));
        let l = log.clone();
        event_loop.set_timeout(150, move || l.borrow_mut().push("early-second"));

        event_loop.tick(1000);
        assert_eq!(*log.borrow(), vec!["early", "early-second", "late"]);
        assert_eq!(event_loop.now_ms(), 1000);
    }

    #[test]
    fn test_timeout_waits_for_due_time() {
        let event_loop = EventLoop::new();
        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();
        event_loop.set_timeout(100, move || f.set(true));

        event_loop.advance(96);
        assert!(!fired.get());
        event_loop.advance(16);
        assert!(fired.get());
    }

    #[test]
    fn test_frame_callbacks_run_on_next_frame_only() {
        let event_loop = EventLoop::new();
        let count = Rc::new(Cell::new(0));

        let c = count.clone();
        let inner_loop = event_loop.clone();
        event_loop.request_frame(move || {
            c.set(c.get() + 1);
            let c2 = c.clone();
            inner_loop.request_frame(move || c2.set(c2.get() + 10));
        });

        event_loop.tick(16);
        assert_eq!(count.get(), 1);
        event_loop.tick(16);
        assert_eq!(count.get(), 11);
    }

    #[test]
    fn test_nested_timeout_is_relative_to_fire_time() {
        let event_loop = EventLoop::new();
        let fired_at = Rc::new(Cell::new(0));

        let inner_loop = event_loop.clone();
        let f = fired_at.clone();
        event_loop.set_timeout(100, move || {
            let f2 = f.clone();
            let l2 = inner_loop.clone();
            inner_loop.set_timeout(50, move || f2.set(l2.now_ms()));
        });

        event_loop.tick(1000);
        assert_eq!(fired_at.get(), 150);
    }

    #[test]
    fn test_cancel_prevents_callback() {
        let event_loop = EventLoop::new();
        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();
        let handle = event_loop.set_timeout(10, move || f.set(true));

        assert!(handle.is_pending());
        assert!(handle.cancel());
        assert!(!handle.cancel());

        event_loop.advance(100);
        assert!(!fired.get());
        assert_eq!(event_loop.pending(), 0);
    }

    #[test]
    fn test_handle_outlives_loop() {
        let handle = {
            let event_loop = EventLoop::new();
            event_loop.set_timeout(10, || {})
        };
        assert!(!handle.is_pending());
        assert!(!handle.cancel());
    }

    #[test]
    fn test_scope_drop_cancels_everything() {
        let event_loop = EventLoop::new();
        let count = Rc::new(Cell::new(0));

        {
            let mut scope = TaskScope::new(&event_loop);
            let c = count.clone();
            scope.set_timeout(50, move || c.set(c.get() + 1));
            let c = count.clone();
            scope.request_frame(move || c.set(c.get() + 1));
            assert_eq!(scope.outstanding(), 2);
        }

        event_loop.advance(200);
        assert_eq!(count.get(), 0);
        assert_eq!(event_loop.pending(), 0);
    }

    #[test]
    fn test_scope_cancel_all_reports_pending_only() {
        let event_loop = EventLoop::new();
        let mut scope = TaskScope::new(&event_loop);
        scope.set_timeout(10, || {});
        scope.set_timeout(500, || {});

        event_loop.advance(32);
        assert_eq!(scope.outstanding(), 1);
        assert_eq!(scope.cancel_all(), 1);
    }

    #[test]
    fn test_run_until_idle_stops_when_empty() {
        let event_loop = EventLoop::with_frame_interval(10);
        event_loop.set_timeout(45, || {});
        event_loop.run_until_idle(10_000);
        assert_eq!(event_loop.pending(), 0);
        assert_eq!(event_loop.now_ms(), 50);
    }

    #[test]
    fn test_present_hook_runs_after_frame_callbacks() {
        let event_loop = EventLoop::with_frame_interval(10);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = seen.clone();
        event_loop.request_frame(move || sink.borrow_mut().push(0));
        let sink = seen.clone();
        let hook = event_loop.on_present(move |frame| sink.borrow_mut().push(frame));
        assert_eq!(event_loop.pending(), 1);

        event_loop.advance(20);
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
        assert_eq!(event_loop.pending(), 0);

        drop(hook);
        event_loop.advance(20);
        assert_eq!(seen.borrow().len(), 3);
    }
}
