//! Visibility observation
//!
//! [`VisibilityObserver`] is the seam between reveal logic and whatever
//! mechanism reports element visibility. [`GeometryObserver`] implements it
//! from element bounds and the current [`Viewport`]: callers register an
//! element with a threshold and receive `on_change(visible)` whenever the
//! element's intersection ratio crosses that threshold in either direction.
//!
//! Notifications are delivered from [`GeometryObserver::refresh`] (also run
//! by every viewport or bounds update), never from inside `observe`, so a
//! callback can never run while its registrant is still mid-borrow.
//!
//! The observer keeps only the current visible/hidden bit per observation.
//! Latching a reveal is the caller's job.

use crate::geometry::{Rect, Viewport};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

new_key_type! {
    /// Identifier for one registration with an observer
    pub struct ObservationId;
}

/// Caller-assigned identity of an observed element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// Visibility change callback
pub type VisibilityCallback = Box<dyn FnMut(bool)>;

/// Something that can report when elements enter or leave the viewport
pub trait VisibilityObserver {
    /// Start watching `element`; `on_change` fires on every threshold crossing
    fn observe(
        &self,
        element: ElementId,
        threshold: f32,
        on_change: VisibilityCallback,
    ) -> Unobserve;

    /// Stop a single observation. Returns false if it was already gone.
    fn unobserve(&self, id: ObservationId) -> bool;
}

/// Disposer returned by [`VisibilityObserver::observe`]
///
/// Calling [`Unobserve::dispose`] or dropping the value stops the
/// observation and releases its callback.
pub struct Unobserve {
    id: ObservationId,
    dispose: Option<Box<dyn FnOnce()>>,
}

impl Unobserve {
    pub fn new<F: FnOnce() + 'static>(id: ObservationId, dispose: F) -> Self {
        Self {
            id,
            dispose: Some(Box::new(dispose)),
        }
    }

    pub fn id(&self) -> ObservationId {
        self.id
    }

    pub fn dispose(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for Unobserve {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Unobserve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unobserve")
            .field("id", &self.id)
            .field("active", &self.dispose.is_some())
            .finish()
    }
}

struct Observation {
    element: ElementId,
    threshold: f32,
    visible: bool,
    /// Taken out while the callback runs
    callback: Option<VisibilityCallback>,
}

struct ObserverState {
    viewport: Viewport,
    bounds: FxHashMap<ElementId, Rect>,
    observations: SlotMap<ObservationId, Observation>,
}

impl ObserverState {
    fn is_visible(&self, element: ElementId, threshold: f32) -> bool {
        let Some(rect) = self.bounds.get(&element) else {
            return false;
        };
        let ratio = self.viewport.intersection_ratio(rect);
        ratio > 0.0 && ratio >= threshold
    }

    /// Flip stored visibility for every crossed threshold and report the flips
    fn collect_changes(&mut self) -> Vec<(ObservationId, bool)> {
        let mut changes = Vec::new();
        let ids: Vec<ObservationId> = self.observations.keys().collect();
        for id in ids {
            let (element, threshold, was_visible) = {
                let obs = &self.observations[id];
                (obs.element, obs.threshold, obs.visible)
            };
            let visible = self.is_visible(element, threshold);
            if visible != was_visible {
                self.observations[id].visible = visible;
                changes.push((id, visible));
            }
        }
        changes
    }
}

/// Visibility observer backed by element bounds and a scrolling viewport
///
/// Cloning yields another handle to the same observer. Independent
/// observers each track their own element set.
#[derive(Clone)]
pub struct GeometryObserver {
    state: Rc<RefCell<ObserverState>>,
}

impl GeometryObserver {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            state: Rc::new(RefCell::new(ObserverState {
                viewport,
                bounds: FxHashMap::default(),
                observations: SlotMap::with_key(),
            })),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.state.borrow().viewport
    }

    /// Replace the viewport and deliver any resulting notifications
    pub fn set_viewport(&self, viewport: Viewport) -> usize {
        self.state.borrow_mut().viewport = viewport;
        self.refresh()
    }

    /// Scroll the viewport and deliver any resulting notifications
    pub fn scroll_to(&self, scroll_y: f32) -> usize {
        let viewport = self.viewport().scrolled_to(scroll_y);
        self.set_viewport(viewport)
    }

    /// Record an element's layout bounds and deliver notifications
    pub fn set_element_bounds(&self, element: ElementId, bounds: Rect) -> usize {
        self.state.borrow_mut().bounds.insert(element, bounds);
        self.refresh()
    }

    /// The element left the page: drop its bounds and every observation of it
    /// without firing callbacks.
    pub fn remove_element(&self, element: ElementId) -> usize {
        let removed: Vec<Observation> = {
            let mut state = self.state.borrow_mut();
            state.bounds.remove(&element);
            let ids: Vec<ObservationId> = state
                .observations
                .iter()
                .filter(|(_, obs)| obs.element == element)
                .map(|(id, _)| id)
                .collect();
            ids.into_iter()
                .filter_map(|id| state.observations.remove(id))
                .collect()
        };
        if !removed.is_empty() {
            tracing::debug!(?element, count = removed.len(), "observations dropped with element");
        }
        // Callbacks are dropped here, outside the borrow
        removed.len()
    }

    /// Number of live observations
    pub fn len(&self) -> usize {
        self.state.borrow().observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current stored visibility of an observation
    pub fn is_visible(&self, id: ObservationId) -> Option<bool> {
        self.state.borrow().observations.get(id).map(|o| o.visible)
    }

    /// Intersection ratio of an element in the current viewport
    pub fn intersection_ratio(&self, element: ElementId) -> f32 {
        let state = self.state.borrow();
        state
            .bounds
            .get(&element)
            .map(|rect| state.viewport.intersection_ratio(rect))
            .unwrap_or(0.0)
    }

    /// Re-evaluate every observation and deliver threshold crossings.
    /// Returns the number of callbacks invoked.
    pub fn refresh(&self) -> usize {
        let changes = self.state.borrow_mut().collect_changes();
        let mut delivered = 0;

        for (id, visible) in changes {
            let callback = {
                let mut state = self.state.borrow_mut();
                state
                    .observations
                    .get_mut(id)
                    .and_then(|obs| obs.callback.take())
            };
            // Unobserved by an earlier callback in this batch
            let Some(mut callback) = callback else {
                continue;
            };

            callback(visible);
            delivered += 1;

            let mut state = self.state.borrow_mut();
            if let Some(obs) = state.observations.get_mut(id) {
                obs.callback = Some(callback);
            }
        }

        delivered
    }

    fn downgrade(&self) -> Weak<RefCell<ObserverState>> {
        Rc::downgrade(&self.state)
    }
}

impl VisibilityObserver for GeometryObserver {
    fn observe(
        &self,
        element: ElementId,
        threshold: f32,
        on_change: VisibilityCallback,
    ) -> Unobserve {
        let id = self.state.borrow_mut().observations.insert(Observation {
            element,
            threshold: threshold.clamp(0.0, 1.0),
            visible: false,
            callback: Some(on_change),
        });
        tracing::trace!(?element, threshold, "observing element");

        let weak = self.downgrade();
        Unobserve::new(id, move || {
            if let Some(state) = weak.upgrade() {
                let removed = state.borrow_mut().observations.remove(id);
                drop(removed);
            }
        })
    }

    fn unobserve(&self, id: ObservationId) -> bool {
        let removed = self.state.borrow_mut().observations.remove(id);
        removed.is_some()
    }
}

impl Default for GeometryObserver {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}
