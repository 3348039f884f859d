//! Event dispatch system
//!
//! Page-level input events routed to registered handlers.

use rustc_hash::FxHashMap;

/// Event type identifier
pub type EventType = u32;

/// Target id for events addressed to the whole page rather than an element
pub const WINDOW_TARGET: u64 = 0;

/// Common event types
pub mod event_types {
    use super::EventType;

    pub const POINTER_DOWN: EventType = 1;
    pub const POINTER_UP: EventType = 2;
    pub const POINTER_MOVE: EventType = 3;
    pub const POINTER_ENTER: EventType = 4;
    pub const POINTER_LEAVE: EventType = 5;
    pub const SCROLL: EventType = 30;
    pub const RESIZE: EventType = 40;
}

/// A UI event with associated data
#[derive(Clone, Debug)]
pub struct Event {
    pub event_type: EventType,
    pub target: u64,
    pub data: EventData,
    pub timestamp: u64,
    pub propagation_stopped: bool,
}

/// Event-specific data
#[derive(Clone, Debug, PartialEq)]
pub enum EventData {
    Pointer { x: f32, y: f32 },
    /// Absolute scroll offset of the page
    Scroll { offset_y: f32 },
    Resize { width: u32, height: u32 },
    None,
}

impl Event {
    pub fn new(event_type: EventType, target: u64, data: EventData, timestamp: u64) -> Self {
        Self {
            event_type,
            target,
            data,
            timestamp,
            propagation_stopped: false,
        }
    }

    /// Page scroll event
    pub fn scroll(offset_y: f32, timestamp: u64) -> Self {
        Self::new(
            event_types::SCROLL,
            WINDOW_TARGET,
            EventData::Scroll { offset_y },
            timestamp,
        )
    }

    /// Pointer movement in viewport coordinates
    pub fn pointer_move(x: f32, y: f32, timestamp: u64) -> Self {
        Self::new(
            event_types::POINTER_MOVE,
            WINDOW_TARGET,
            EventData::Pointer { x, y },
            timestamp,
        )
    }

    pub fn pointer_down(timestamp: u64) -> Self {
        Self::new(event_types::POINTER_DOWN, WINDOW_TARGET, EventData::None, timestamp)
    }

    pub fn pointer_up(timestamp: u64) -> Self {
        Self::new(event_types::POINTER_UP, WINDOW_TARGET, EventData::None, timestamp)
    }

    /// Pointer entering element `target`
    pub fn pointer_enter(target: u64, timestamp: u64) -> Self {
        Self::new(event_types::POINTER_ENTER, target, EventData::None, timestamp)
    }

    pub fn pointer_leave(target: u64, timestamp: u64) -> Self {
        Self::new(event_types::POINTER_LEAVE, target, EventData::None, timestamp)
    }

    pub fn resize(width: u32, height: u32, timestamp: u64) -> Self {
        Self::new(
            event_types::RESIZE,
            WINDOW_TARGET,
            EventData::Resize { width, height },
            timestamp,
        )
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }
}

/// Event handler function type
pub type EventHandler = Box<dyn Fn(&Event)>;

/// Dispatches events to registered handlers
pub struct EventDispatcher {
    handlers: FxHashMap<(u64, EventType), Vec<EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: FxHashMap::default(),
        }
    }

    /// Register an event handler for a target and event type
    pub fn register<F>(&mut self, target: u64, event_type: EventType, handler: F)
    where
        F: Fn(&Event) + 'static,
    {
        self.handlers
            .entry((target, event_type))
            .or_default()
            .push(Box::new(handler));
    }

    /// Drop every handler registered for `target`
    pub fn unregister_target(&mut self, target: u64) {
        self.handlers.retain(|(t, _), _| *t != target);
    }

    /// Dispatch an event to all registered handlers. Returns how many ran.
    pub fn dispatch(&self, event: &mut Event) -> usize {
        let mut ran = 0;
        if let Some(handlers) = self.handlers.get(&(event.target, event.event_type)) {
            for handler in handlers {
                if event.propagation_stopped {
                    break;
                }
                handler(event);
                ran += 1;
            }
        }
        ran
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_dispatch_reaches_matching_handlers() {
        let mut dispatcher = EventDispatcher::new();
        let seen = Rc::new(Cell::new(0.0f32));

        let s = seen.clone();
        dispatcher.register(WINDOW_TARGET, event_types::SCROLL, move |event| {
            if let EventData::Scroll { offset_y } = event.data {
                s.set(offset_y);
            }
        });

        let mut event = Event::scroll(240.0, 0);
        assert_eq!(dispatcher.dispatch(&mut event), 1);
        assert_eq!(seen.get(), 240.0);

        let mut other = Event::resize(800, 600, 0);
        assert_eq!(dispatcher.dispatch(&mut other), 0);
    }

    #[test]
    fn test_stop_propagation_skips_later_handlers() {
        let mut dispatcher = EventDispatcher::new();
        let count = Rc::new(Cell::new(0));

        dispatcher.register(7, event_types::POINTER_MOVE, |event| {
            assert_eq!(event.target, 7);
        });
        let c = count.clone();
        dispatcher.register(7, event_types::POINTER_MOVE, move |_| c.set(c.get() + 1));

        let mut event = Event::new(event_types::POINTER_MOVE, 7, EventData::None, 0);
        event.stop_propagation();
        assert_eq!(dispatcher.dispatch(&mut event), 0);
        assert_eq!(count.get(), 0);

        dispatcher.unregister_target(7);
        let mut event = Event::new(event_types::POINTER_MOVE, 7, EventData::None, 0);
        assert_eq!(dispatcher.dispatch(&mut event), 0);
    }
}
