//! UI environment context
//!
//! `UiEnvironment` is the explicit stand-in for document-level state: the set
//! of classes on the root element and the cursor style. Components never
//! touch a rendering surface directly; they request changes here and the
//! single owner of the environment drains [`UiEnvironment::take_changes`] and
//! applies them.
//!
//! ```
//! use folio_core::environment::{EnvironmentChange, UiEnvironment};
//!
//! let mut env = UiEnvironment::new();
//! env.add_root_class("dark");
//! assert!(env.has_root_class("dark"));
//! assert_eq!(
//!     env.take_changes(),
//!     vec![EnvironmentChange::RootClassAdded("dark".into())]
//! );
//! ```

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Shared handle to the environment for single-threaded components
pub type SharedEnvironment = Rc<RefCell<UiEnvironment>>;

/// Cursor style requested for the page
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
    /// Native cursor hidden (a custom cursor is drawn instead)
    Hidden,
}

/// A single requested mutation of the environment
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnvironmentChange {
    RootClassAdded(String),
    RootClassRemoved(String),
    CursorChanged(Cursor),
}

/// Root-level UI state owned by the page
#[derive(Debug, Default)]
pub struct UiEnvironment {
    root_classes: BTreeSet<String>,
    cursor: Cursor,
    /// Changes not yet applied to the rendering surface
    pending: Vec<EnvironmentChange>,
    /// Set whenever a change is recorded, cleared by the owner
    dirty: bool,
}

impl UiEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared handle
    pub fn shared() -> SharedEnvironment {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn has_root_class(&self, class: &str) -> bool {
        self.root_classes.contains(class)
    }

    pub fn root_classes(&self) -> impl Iterator<Item = &str> {
        self.root_classes.iter().map(String::as_str)
    }

    /// Add a class to the root element. Returns false if it was already present.
    pub fn add_root_class(&mut self, class: &str) -> bool {
        if !self.root_classes.insert(class.to_string()) {
            return false;
        }
        self.record(EnvironmentChange::RootClassAdded(class.to_string()));
        true
    }

    /// Remove a class from the root element. Returns false if it was absent.
    pub fn remove_root_class(&mut self, class: &str) -> bool {
        if !self.root_classes.remove(class) {
            return false;
        }
        self.record(EnvironmentChange::RootClassRemoved(class.to_string()));
        true
    }

    /// Set or clear a class depending on `enabled`
    pub fn set_root_class(&mut self, class: &str, enabled: bool) -> bool {
        if enabled {
            self.add_root_class(class)
        } else {
            self.remove_root_class(class)
        }
    }

    /// Flip a class, returning whether it is now present
    pub fn toggle_root_class(&mut self, class: &str) -> bool {
        let enabled = !self.has_root_class(class);
        self.set_root_class(class, enabled);
        enabled
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        if self.cursor != cursor {
            self.cursor = cursor;
            self.record(EnvironmentChange::CursorChanged(cursor));
        }
    }

    /// Whether changes are waiting to be applied
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Drain the recorded changes for application to the rendering surface
    pub fn take_changes(&mut self) -> Vec<EnvironmentChange> {
        self.dirty = false;
        std::mem::take(&mut self.pending)
    }

    fn record(&mut self, change: EnvironmentChange) {
        tracing::trace!(?change, "environment change");
        self.pending.push(change);
        self.dirty = true;
    }
}

/// The rendered root element, kept in step by applying drained changes
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RootSurface {
    classes: BTreeSet<String>,
    cursor: Cursor,
    applied: u64,
}

impl RootSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain `env` and apply every pending change. Returns how many were applied.
    pub fn sync(&mut self, env: &mut UiEnvironment) -> usize {
        if !env.is_dirty() {
            return 0;
        }
        let changes = env.take_changes();
        for change in &changes {
            self.apply(change);
        }
        changes.len()
    }

    pub fn apply(&mut self, change: &EnvironmentChange) {
        match change {
            EnvironmentChange::RootClassAdded(class) => {
                self.classes.insert(class.clone());
            }
            EnvironmentChange::RootClassRemoved(class) => {
                self.classes.remove(class);
            }
            EnvironmentChange::CursorChanged(cursor) => self.cursor = *cursor,
        }
        self.applied += 1;
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Total changes applied so far
    pub fn applied(&self) -> u64 {
        self.applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_class_is_not_recorded() {
        let mut env = UiEnvironment::new();
        assert!(env.add_root_class("dark"));
        assert!(!env.add_root_class("dark"));
        assert_eq!(env.take_changes().len(), 1);
        assert!(!env.is_dirty());
    }

    #[test]
    fn test_toggle_root_class() {
        let mut env = UiEnvironment::new();
        assert!(env.toggle_root_class("dark"));
        assert!(!env.toggle_root_class("dark"));
        assert_eq!(
            env.take_changes(),
            vec![
                EnvironmentChange::RootClassAdded("dark".into()),
                EnvironmentChange::RootClassRemoved("dark".into()),
            ]
        );
    }

    #[test]
    fn test_cursor_changes_only_when_different() {
        let mut env = UiEnvironment::new();
        env.set_cursor(Cursor::Default);
        assert!(!env.is_dirty());

        env.set_cursor(Cursor::Hidden);
        assert!(env.is_dirty());
        assert_eq!(env.cursor(), Cursor::Hidden);
    }

    #[test]
    fn test_surface_sync_drains_and_mirrors() {
        let mut env = UiEnvironment::new();
        let mut surface = RootSurface::new();
        env.add_root_class("dark");
        env.add_root_class("loading");
        env.remove_root_class("loading");
        env.set_cursor(Cursor::Hidden);

        assert_eq!(surface.sync(&mut env), 4);
        assert!(!env.is_dirty());
        assert!(surface.has_class("dark"));
        assert!(!surface.has_class("loading"));
        assert_eq!(surface.cursor(), Cursor::Hidden);

        assert_eq!(surface.sync(&mut env), 0);
        assert_eq!(surface.applied(), 4);
    }
}
