//! State Machine Runtime
//!
//! Typed flat statecharts for choreography phases.
//! Supports:
//! - Flat state machines over any `Copy + Eq + Hash` state and event enums
//! - Guards (conditional transitions)
//! - Entry/exit actions
//! - Transition actions
//!
//! Actions and guards are plain closures; they cannot reach back into the
//! machine, so callers that need to react to a phase change read the value
//! returned from [`StateMachine::send`].

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt::Debug;
use std::hash::Hash;

/// A guard function that determines if a transition should occur
pub type Guard = Box<dyn Fn() -> bool>;

/// An action function executed during transitions
pub type Action = Box<dyn FnMut()>;

/// A transition in the state machine
pub struct Transition<S, E> {
    pub from_state: S,
    pub event: E,
    pub to_state: S,
    pub guard: Option<Guard>,
    pub actions: SmallVec<[Action; 2]>,
}

impl<S, E> Transition<S, E> {
    /// Create a simple transition without guard or actions
    pub fn new(from: S, event: E, to: S) -> Self {
        Self {
            from_state: from,
            event,
            to_state: to,
            guard: None,
            actions: SmallVec::new(),
        }
    }

    /// Add a guard condition
    pub fn with_guard<F: Fn() -> bool + 'static>(mut self, guard: F) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }

    /// Add an action to execute during transition
    pub fn with_action<F: FnMut() + 'static>(mut self, action: F) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    fn accepts(&self, state: S, event: E) -> bool
    where
        S: PartialEq,
        E: PartialEq,
    {
        self.from_state == state
            && self.event == event
            && self.guard.as_ref().map(|guard| guard()).unwrap_or(true)
    }
}

/// Builder for creating state machines
pub struct StateMachineBuilder<S, E> {
    initial_state: S,
    transitions: Vec<Transition<S, E>>,
    entry_callbacks: FxHashMap<S, Vec<Action>>,
    exit_callbacks: FxHashMap<S, Vec<Action>>,
}

impl<S, E> StateMachineBuilder<S, E>
where
    S: Copy + Eq + Hash + Debug,
    E: Copy + Eq + Debug,
{
    pub fn new(initial_state: S) -> Self {
        Self {
            initial_state,
            transitions: Vec::new(),
            entry_callbacks: FxHashMap::default(),
            exit_callbacks: FxHashMap::default(),
        }
    }

    /// Add a transition
    pub fn transition(mut self, transition: Transition<S, E>) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Add a simple transition (from, event, to)
    pub fn on(mut self, from: S, event: E, to: S) -> Self {
        self.transitions.push(Transition::new(from, event, to));
        self
    }

    /// Add an entry action for a state
    pub fn on_enter<F: FnMut() + 'static>(mut self, state: S, action: F) -> Self {
        self.entry_callbacks
            .entry(state)
            .or_default()
            .push(Box::new(action));
        self
    }

    /// Add an exit action for a state
    pub fn on_exit<F: FnMut() + 'static>(mut self, state: S, action: F) -> Self {
        self.exit_callbacks
            .entry(state)
            .or_default()
            .push(Box::new(action));
        self
    }

    /// Build the state machine
    pub fn build(self) -> StateMachine<S, E> {
        StateMachine {
            current_state: self.initial_state,
            transitions: self.transitions,
            entry_callbacks: self.entry_callbacks,
            exit_callbacks: self.exit_callbacks,
            history: Vec::new(),
        }
    }
}

/// A state machine instance
pub struct StateMachine<S, E> {
    current_state: S,
    transitions: Vec<Transition<S, E>>,
    entry_callbacks: FxHashMap<S, Vec<Action>>,
    exit_callbacks: FxHashMap<S, Vec<Action>>,
    /// History of state transitions (for debugging)
    history: Vec<(S, E, S)>,
}

impl<S, E> StateMachine<S, E>
where
    S: Copy + Eq + Hash + Debug,
    E: Copy + Eq + Debug,
{
    /// Create a new state machine with an initial state and transitions
    pub fn new(initial_state: S, transitions: Vec<Transition<S, E>>) -> Self {
        Self {
            current_state: initial_state,
            transitions,
            entry_callbacks: FxHashMap::default(),
            exit_callbacks: FxHashMap::default(),
            history: Vec::new(),
        }
    }

    /// Create a builder for a state machine
    pub fn builder(initial_state: S) -> StateMachineBuilder<S, E> {
        StateMachineBuilder::new(initial_state)
    }

    /// Get the current state
    pub fn current_state(&self) -> S {
        self.current_state
    }

    /// Check if we're in a specific state
    pub fn is_in(&self, state: S) -> bool {
        self.current_state == state
    }

    /// Get transition history
    pub fn history(&self) -> &[(S, E, S)] {
        &self.history
    }

    /// Clear transition history
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Check if an event can trigger a transition from current state
    pub fn can_send(&self, event: E) -> bool {
        let current = self.current_state;
        self.transitions.iter().any(|t| t.accepts(current, event))
    }

    /// Send an event, returning the new state if a transition was taken
    pub fn send(&mut self, event: E) -> Option<S> {
        let current = self.current_state;

        let idx = self
            .transitions
            .iter()
            .position(|t| t.accepts(current, event))?;

        let to_state = self.transitions[idx].to_state;

        if let Some(callbacks) = self.exit_callbacks.get_mut(&current) {
            for callback in callbacks.iter_mut() {
                callback();
            }
        }

        for action in self.transitions[idx].actions.iter_mut() {
            action();
        }

        self.current_state = to_state;
        self.history.push((current, event, to_state));
        tracing::trace!(from = ?current, ?event, to = ?to_state, "fsm transition");

        if let Some(callbacks) = self.entry_callbacks.get_mut(&to_state) {
            for callback in callbacks.iter_mut() {
                callback();
            }
        }

        Some(to_state)
    }

    /// Force the machine back to `state` without running any callbacks
    ///
    /// Used on teardown, where the phases in between must not be replayed.
    pub fn reset(&mut self, state: S) {
        self.current_state = state;
    }

    /// Register an entry callback for a state
    pub fn on_enter<F: FnMut() + 'static>(&mut self, state: S, callback: F) {
        self.entry_callbacks
            .entry(state)
            .or_default()
            .push(Box::new(callback));
    }

    /// Register an exit callback for a state
    pub fn on_exit<F: FnMut() + 'static>(&mut self, state: S, callback: F) {
        self.exit_callbacks
            .entry(state)
            .or_default()
            .push(Box::new(callback));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Door {
        Closed,
        Open,
        Locked,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum DoorEvent {
        Push,
        Pull,
        Lock,
        Unlock,
    }

    fn door() -> StateMachine<Door, DoorEvent> {
        StateMachine::new(
            Door::Closed,
            vec![
                Transition::new(Door::Closed, DoorEvent::Push, Door::Open),
                Transition::new(Door::Open, DoorEvent::Pull, Door::Closed),
                Transition::new(Door::Closed, DoorEvent::Lock, Door::Locked),
                Transition::new(Door::Locked, DoorEvent::Unlock, Door::Closed),
            ],
        )
    }

    #[test]
    fn test_simple_transitions() {
        let mut fsm = door();
        assert_eq!(fsm.current_state(), Door::Closed);

        assert_eq!(fsm.send(DoorEvent::Push), Some(Door::Open));
        assert_eq!(fsm.send(DoorEvent::Pull), Some(Door::Closed));
        assert_eq!(fsm.send(DoorEvent::Lock), Some(Door::Locked));
        assert!(fsm.is_in(Door::Locked));
    }

    #[test]
    fn test_invalid_event_no_transition() {
        let mut fsm = door();
        fsm.send(DoorEvent::Lock);

        // Locked doors ignore pushes
        assert_eq!(fsm.send(DoorEvent::Push), None);
        assert_eq!(fsm.current_state(), Door::Locked);
    }

    #[test]
    fn test_guard_conditions() {
        let enabled = Rc::new(Cell::new(true));
        let guard_flag = enabled.clone();

        let mut fsm = StateMachine::builder(Door::Closed)
            .transition(
                Transition::new(Door::Closed, DoorEvent::Push, Door::Open)
                    .with_guard(move || guard_flag.get()),
            )
            .on(Door::Open, DoorEvent::Pull, Door::Closed)
            .build();

        fsm.send(DoorEvent::Push);
        assert_eq!(fsm.current_state(), Door::Open);
        fsm.send(DoorEvent::Pull);

        enabled.set(false);
        assert!(!fsm.can_send(DoorEvent::Push));
        assert_eq!(fsm.send(DoorEvent::Push), None);
        assert_eq!(fsm.current_state(), Door::Closed);
    }

    #[test]
    fn test_entry_exit_and_transition_actions() {
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));

        let exit_log = order.clone();
        let action_log = order.clone();
        let entry_log = order.clone();

        let mut fsm = StateMachine::builder(Door::Closed)
            .transition(
                Transition::new(Door::Closed, DoorEvent::Push, Door::Open)
                    .with_action(move || action_log.borrow_mut().push("action")),
            )
            .on_exit(Door::Closed, move || exit_log.borrow_mut().push("exit"))
            .on_enter(Door::Open, move || entry_log.borrow_mut().push("enter"))
            .build();

        fsm.send(DoorEvent::Push);
        assert_eq!(*order.borrow(), vec!["exit", "action", "enter"]);
    }

    #[test]
    fn test_history_and_reset() {
        let mut fsm = door();
        fsm.send(DoorEvent::Push);
        fsm.send(DoorEvent::Pull);

        assert_eq!(
            fsm.history(),
            &[
                (Door::Closed, DoorEvent::Push, Door::Open),
                (Door::Open, DoorEvent::Pull, Door::Closed)
            ]
        );

        fsm.send(DoorEvent::Lock);
        fsm.reset(Door::Closed);
        assert_eq!(fsm.current_state(), Door::Closed);
        assert_eq!(fsm.history().len(), 3);

        fsm.clear_history();
        assert!(fsm.history().is_empty());
    }
}
