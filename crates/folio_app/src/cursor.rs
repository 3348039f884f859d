//! Custom cursor
//!
//! Replaces the native cursor with a ring that follows the pointer. The ring
//! shrinks while the pointer is pressed and grows over links and buttons.
//! Pointer input arrives through the page's [`EventDispatcher`]; the native
//! cursor is hidden through the [`UiEnvironment`] while the cursor is
//! installed and restored on [`CustomCursor::uninstall`].
//!
//! [`UiEnvironment`]: folio_core::environment::UiEnvironment

use folio_core::environment::{Cursor, SharedEnvironment, UiEnvironment};
use folio_core::events::{event_types, EventData, EventDispatcher, WINDOW_TARGET};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    pub enabled: bool,
    /// Ring diameter at rest, in px
    pub size: f32,
    pub hover_size: f32,
    pub pressed_size: f32,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size: 32.0,
            hover_size: 48.0,
            pressed_size: 24.0,
        }
    }
}

/// What the ring is currently showing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorMode {
    #[default]
    Rest,
    Hover,
    Pressed,
}

impl fmt::Display for CursorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CursorMode::Rest => "rest",
            CursorMode::Hover => "hover",
            CursorMode::Pressed => "pressed",
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CursorState {
    pub x: f32,
    pub y: f32,
    pub pressed: bool,
    pub link_hovered: bool,
}

impl CursorState {
    /// Pressed wins over hover
    pub fn mode(&self) -> CursorMode {
        if self.pressed {
            CursorMode::Pressed
        } else if self.link_hovered {
            CursorMode::Hover
        } else {
            CursorMode::Rest
        }
    }

    /// Ring transform, centered on the pointer
    pub fn transform(&self) -> String {
        format!(
            "translate3d({}px, {}px, 0) translate(-50%, -50%)",
            self.x, self.y
        )
    }
}

/// An installed custom cursor
pub struct CustomCursor {
    config: CursorConfig,
    state: Rc<Cell<CursorState>>,
    active: Rc<Cell<bool>>,
    environment: Weak<RefCell<UiEnvironment>>,
}

impl CustomCursor {
    /// Hide the native cursor and follow pointer events on `dispatcher`
    ///
    /// `links` are the element targets that count as links or buttons.
    pub fn install(
        dispatcher: &mut EventDispatcher,
        environment: &SharedEnvironment,
        config: CursorConfig,
        links: impl IntoIterator<Item = u64>,
    ) -> Self {
        let state = Rc::new(Cell::new(CursorState::default()));
        let active = Rc::new(Cell::new(true));

        let update = |f: fn(&mut CursorState, &EventData)| {
            let state = state.clone();
            let active = active.clone();
            move |event: &folio_core::events::Event| {
                if active.get() {
                    let mut s = state.get();
                    f(&mut s, &event.data);
                    state.set(s);
                }
            }
        };

        dispatcher.register(
            WINDOW_TARGET,
            event_types::POINTER_MOVE,
            update(|s, data| {
                if let EventData::Pointer { x, y } = *data {
                    s.x = x;
                    s.y = y;
                }
            }),
        );
        dispatcher.register(
            WINDOW_TARGET,
            event_types::POINTER_DOWN,
            update(|s, _| s.pressed = true),
        );
        dispatcher.register(
            WINDOW_TARGET,
            event_types::POINTER_UP,
            update(|s, _| s.pressed = false),
        );
        for link in links {
            dispatcher.register(
                link,
                event_types::POINTER_ENTER,
                update(|s, _| s.link_hovered = true),
            );
            dispatcher.register(
                link,
                event_types::POINTER_LEAVE,
                update(|s, _| s.link_hovered = false),
            );
        }

        environment.borrow_mut().set_cursor(Cursor::Hidden);
        tracing::debug!("custom cursor installed");

        Self {
            config,
            state,
            active,
            environment: Rc::downgrade(environment),
        }
    }

    pub fn state(&self) -> CursorState {
        self.state.get()
    }

    pub fn mode(&self) -> CursorMode {
        self.state.get().mode()
    }

    /// Ring diameter for the current mode
    pub fn diameter(&self) -> f32 {
        match self.mode() {
            CursorMode::Rest => self.config.size,
            CursorMode::Hover => self.config.hover_size,
            CursorMode::Pressed => self.config.pressed_size,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.active.get()
    }

    /// Stop following the pointer and restore the native cursor
    pub fn uninstall(&self) {
        if !self.active.replace(false) {
            return;
        }
        if let Some(env) = self.environment.upgrade() {
            env.borrow_mut().set_cursor(Cursor::Default);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::events::Event;

    const LINK: u64 = 42;

    fn installed() -> (EventDispatcher, SharedEnvironment, CustomCursor) {
        let mut dispatcher = EventDispatcher::new();
        let env = UiEnvironment::shared();
        let cursor = CustomCursor::install(&mut dispatcher, &env, CursorConfig::default(), [LINK]);
        (dispatcher, env, cursor)
    }

    #[test]
    fn test_install_hides_native_cursor() {
        let (_dispatcher, env, cursor) = installed();
        assert_eq!(env.borrow().cursor(), Cursor::Hidden);

        cursor.uninstall();
        cursor.uninstall();
        assert_eq!(env.borrow().cursor(), Cursor::Default);
        assert_eq!(env.borrow_mut().take_changes().len(), 2);
    }

    #[test]
    fn test_ring_follows_pointer_and_resizes() {
        let (dispatcher, _env, cursor) = installed();
        dispatcher.dispatch(&mut Event::pointer_move(120.0, 80.0, 0));
        assert_eq!(
            cursor.state().transform(),
            "translate3d(120px, 80px, 0) translate(-50%, -50%)"
        );
        assert_eq!(cursor.diameter(), 32.0);

        dispatcher.dispatch(&mut Event::pointer_enter(LINK, 1));
        assert_eq!(cursor.mode(), CursorMode::Hover);
        assert_eq!(cursor.diameter(), 48.0);

        dispatcher.dispatch(&mut Event::pointer_down(2));
        assert_eq!(cursor.mode(), CursorMode::Pressed);
        assert_eq!(cursor.diameter(), 24.0);

        dispatcher.dispatch(&mut Event::pointer_up(3));
        dispatcher.dispatch(&mut Event::pointer_leave(LINK, 4));
        assert_eq!(cursor.mode(), CursorMode::Rest);
    }

    #[test]
    fn test_other_targets_do_not_hover() {
        let (dispatcher, _env, cursor) = installed();
        dispatcher.dispatch(&mut Event::pointer_enter(LINK + 1, 0));
        assert_eq!(cursor.mode(), CursorMode::Rest);
    }

    #[test]
    fn test_uninstalled_cursor_ignores_input() {
        let (dispatcher, _env, cursor) = installed();
        cursor.uninstall();
        dispatcher.dispatch(&mut Event::pointer_move(5.0, 5.0, 0));
        assert_eq!(cursor.state(), CursorState::default());
        assert!(!cursor.is_installed());
    }
}
