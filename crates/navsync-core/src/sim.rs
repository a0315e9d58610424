//! In-memory collaborators for trace replay and tests.
//!
//! Each type is a cheap handle over shared state: give one clone to the
//! coordinator and keep another to inspect what happened.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;

use crate::navigation::{Location, LocationProvider, NavigateMode, NavigationError, Navigator};
use crate::recovery::{SessionStore, StorageError};
use crate::toast::{ToastDisplay, ToastId, ToastKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigatorWrite {
    pub target: Location,
    pub mode: NavigateMode,
}

#[derive(Debug, Default)]
struct BrowserState {
    location: Location,
    writes: Vec<NavigatorWrite>,
    /// Locations written but not yet reported back to the coordinator.
    echoes: Vec<Location>,
    fail_writes: bool,
}

/// Address bar plus router. Accepted writes change the location and queue an
/// echo the host must feed back via `on_location_change`.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBrowser {
    state: Rc<RefCell<BrowserState>>,
}

impl SimulatedBrowser {
    pub fn new(initial: Location) -> Self {
        Self {
            state: Rc::new(RefCell::new(BrowserState {
                location: initial,
                ..Default::default()
            })),
        }
    }

    pub fn location(&self) -> Location {
        self.state.borrow().location.clone()
    }

    /// Simulate the user (or a link) moving the browser. Returns the
    /// location so it can be passed straight to the coordinator.
    pub fn visit(&self, location: Location) -> Location {
        self.state.borrow_mut().location = location.clone();
        location
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    pub fn writes(&self) -> Vec<NavigatorWrite> {
        self.state.borrow().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.borrow().writes.len()
    }

    pub fn take_echoes(&self) -> Vec<Location> {
        std::mem::take(&mut self.state.borrow_mut().echoes)
    }
}

impl Navigator for SimulatedBrowser {
    fn navigate(&mut self, target: &Location, mode: NavigateMode) -> Result<(), NavigationError> {
        let mut state = self.state.borrow_mut();
        if state.fail_writes {
            return Err(NavigationError::Rejected {
                target: target.to_string(),
                message: "simulated navigator failure".to_string(),
            });
        }
        state.writes.push(NavigatorWrite {
            target: target.clone(),
            mode,
        });
        state.location = target.clone();
        state.echoes.push(target.clone());
        Ok(())
    }
}

impl LocationProvider for SimulatedBrowser {
    fn current(&self) -> Location {
        self.location()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum DisplayCall {
    Show {
        id: ToastId,
        message: String,
        kind: ToastKind,
    },
    Update {
        id: ToastId,
        message: String,
        kind: ToastKind,
    },
    Dismiss {
        id: ToastId,
    },
}

#[derive(Debug, Default)]
struct DisplayState {
    calls: Vec<DisplayCall>,
    visible: BTreeMap<ToastId, (String, ToastKind)>,
}

/// Toast display that records every call and tracks what is on screen.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    state: Rc<RefCell<DisplayState>>,
}

impl RecordingDisplay {
    pub fn calls(&self) -> Vec<DisplayCall> {
        self.state.borrow().calls.clone()
    }

    pub fn visible(&self) -> Vec<(ToastId, String, ToastKind)> {
        self.state
            .borrow()
            .visible
            .iter()
            .map(|(id, (message, kind))| (*id, message.clone(), *kind))
            .collect()
    }

    pub fn visible_count(&self) -> usize {
        self.state.borrow().visible.len()
    }

    pub fn shown_count(&self) -> usize {
        self.count(|c| matches!(c, DisplayCall::Show { .. }))
    }

    pub fn updated_count(&self) -> usize {
        self.count(|c| matches!(c, DisplayCall::Update { .. }))
    }

    pub fn dismissed_count(&self) -> usize {
        self.count(|c| matches!(c, DisplayCall::Dismiss { .. }))
    }

    fn count(&self, predicate: impl Fn(&DisplayCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| predicate(c)).count()
    }
}

impl ToastDisplay for RecordingDisplay {
    fn show(&mut self, id: ToastId, message: &str, kind: ToastKind) {
        let mut state = self.state.borrow_mut();
        state.visible.insert(id, (message.to_string(), kind));
        state.calls.push(DisplayCall::Show {
            id,
            message: message.to_string(),
            kind,
        });
    }

    fn update(&mut self, id: ToastId, message: &str, kind: ToastKind) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.visible.get_mut(&id) {
            *entry = (message.to_string(), kind);
        }
        state.calls.push(DisplayCall::Update {
            id,
            message: message.to_string(),
            kind,
        });
    }

    fn dismiss(&mut self, id: ToastId) {
        let mut state = self.state.borrow_mut();
        state.visible.remove(&id);
        state.calls.push(DisplayCall::Dismiss { id });
    }
}

/// Session store whose every call fails, e.g. storage disabled by the
/// browser. Counts calls so callers can check it is not retried.
#[derive(Debug, Clone, Default)]
pub struct UnavailableSessionStore {
    calls: Rc<Cell<usize>>,
}

impl UnavailableSessionStore {
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn fail(&self) -> StorageError {
        self.calls.set(self.calls.get() + 1);
        StorageError::Unavailable {
            message: "storage disabled".to_string(),
        }
    }
}

impl SessionStore for UnavailableSessionStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(self.fail())
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(self.fail())
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(self.fail())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_write_queues_echo() {
        let mut browser = SimulatedBrowser::new(Location::parse("/portal?tab=time-off"));
        let target = Location::parse("/portal?tab=messages");
        browser.navigate(&target, NavigateMode::Replace).unwrap();

        assert_eq!(browser.location(), target);
        assert_eq!(browser.take_echoes(), vec![target]);
        assert!(browser.take_echoes().is_empty());
        assert_eq!(browser.write_count(), 1);
    }

    #[test]
    fn test_browser_failing_writes_leave_location() {
        let mut browser = SimulatedBrowser::new(Location::parse("/portal"));
        browser.set_fail_writes(true);
        let result = browser.navigate(&Location::parse("/portal?tab=x"), NavigateMode::Push);

        assert!(result.is_err());
        assert_eq!(browser.location(), Location::parse("/portal"));
        assert_eq!(browser.write_count(), 0);
    }

    #[test]
    fn test_display_tracks_visible_toasts() {
        let display = RecordingDisplay::default();
        let mut handle = display.clone();
        handle.show(ToastId(1), "Refreshing data...", ToastKind::Loading);
        handle.update(ToastId(1), "Data refreshed", ToastKind::Success);

        assert_eq!(
            display.visible(),
            vec![(ToastId(1), "Data refreshed".to_string(), ToastKind::Success)]
        );
        handle.dismiss(ToastId(1));
        assert_eq!(display.visible_count(), 0);
        assert_eq!(display.calls().len(), 3);
    }
}
