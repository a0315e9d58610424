use std::collections::VecDeque;

use serde::Serialize;

use super::location::Location;
use crate::clock::Millis;

/// One accepted location change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationEvent {
    pub location: Location,
    pub timestamp: Millis,
}

impl NavigationEvent {
    pub fn path(&self) -> &str {
        &self.location.path
    }
}

/// Bounded FIFO of navigation events. Oldest entries are evicted at capacity.
#[derive(Debug, Clone)]
pub struct NavigationHistory {
    events: VecDeque<NavigationEvent>,
    capacity: usize,
}

impl NavigationHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, event: NavigationEvent) {
        while self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn iter(&self) -> impl Iterator<Item = &NavigationEvent> {
        self.events.iter()
    }

    pub fn last(&self) -> Option<&NavigationEvent> {
        self.events.back()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.events.clear();
    }
}

/// Turns raw location reports into navigation events.
///
/// Reports identical to the last accepted location are coalesced; the
/// observer never fails.
#[derive(Debug, Clone)]
pub struct NavigationObserver {
    history: NavigationHistory,
    current: Option<Location>,
}

impl NavigationObserver {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: NavigationHistory::new(capacity),
            current: None,
        }
    }

    /// Record the location present at attach. Mounting is not a transition,
    /// so nothing is appended to history.
    pub fn prime(&mut self, location: Location) {
        self.current = Some(location);
    }

    /// Returns the accepted event, or `None` when the report is a duplicate.
    pub fn on_location_change(
        &mut self,
        location: Location,
        now: Millis,
    ) -> Option<NavigationEvent> {
        if self.current.as_ref() == Some(&location) {
            tracing::trace!(
                event = "core.nav.duplicate_ignored",
                location = %location
            );
            return None;
        }

        let event = NavigationEvent {
            location: location.clone(),
            timestamp: now,
        };
        self.current = Some(location);
        self.history.push(event.clone());
        Some(event)
    }

    /// The last location reported by the environment (accepted or primed).
    pub fn current(&self) -> Option<&Location> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.current = None;
    }
}
