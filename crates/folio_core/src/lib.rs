//! Folio Core Runtime
//!
//! This crate provides the foundational primitives for the Folio page runtime:
//!
//! - **Event Loop**: Deterministic single-threaded timers and animation frames
//! - **Task Scopes**: Explicit cancellation tokens released on teardown
//! - **State Machines**: Typed flat statecharts for choreography phases
//! - **UI Environment**: The root-level classes and cursor a page may request
//!
//! # Example
//!
//! ```rust
//! use folio_core::scheduler::{EventLoop, TaskScope};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let event_loop = EventLoop::new();
//! let fired = Rc::new(Cell::new(false));
//!
//! let mut scope = TaskScope::new(&event_loop);
//! let flag = fired.clone();
//! scope.set_timeout(150, move || flag.set(true));
//!
//! event_loop.advance(100);
//! assert!(!fired.get());
//!
//! event_loop.advance(100);
//! assert!(fired.get());
//! ```

pub mod color;
pub mod environment;
pub mod events;
pub mod fsm;
pub mod scheduler;

pub use color::{Color, ColorError};
pub use environment::{Cursor, EnvironmentChange, RootSurface, SharedEnvironment, UiEnvironment};
pub use events::{Event, EventData, EventDispatcher, EventType};
pub use fsm::{StateMachine, StateMachineBuilder, Transition};
pub use scheduler::{EventLoop, HookId, PresentHook, TaskHandle, TaskId, TaskScope};
