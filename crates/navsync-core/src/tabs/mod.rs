//! Single-source-of-truth reconciliation between the URL and the active view.
//!
//! The URL wins on every externally driven change, except for the one report
//! that arrives while an internal change is still inside its debounce window.
//! That report is assumed to be the echo of our own pending write.

use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::types::ViewId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabSource {
    FromUrl,
    FromInternal,
}

impl std::fmt::Display for TabSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TabSource::FromUrl => write!(f, "url"),
            TabSource::FromInternal => write!(f, "internal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabState {
    pub active_view: ViewId,
    pub source: TabSource,
    pub last_changed_at: Millis,
}

/// Result of feeding a URL-reported view to the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlUpdate {
    Adopted,
    /// Same view as the current state.
    Unchanged,
    /// Inside a debounce window; the guard is consumed.
    Suppressed,
}

/// Reported when a debounce window closes and the URL never caught up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    pub state_view: ViewId,
    pub url_view: ViewId,
}

#[derive(Debug, Clone)]
pub struct TabStateSynchronizer {
    state: TabState,
    debounce_ms: u64,
    guard_until: Option<Millis>,
    /// Last view the environment reported, whether adopted or not.
    url_view: Option<ViewId>,
}

impl TabStateSynchronizer {
    /// Start from the view present in the URL at attach.
    pub fn new(initial_view: ViewId, debounce_ms: u64, now: Millis) -> Self {
        Self {
            url_view: Some(initial_view.clone()),
            state: TabState {
                active_view: initial_view,
                source: TabSource::FromUrl,
                last_changed_at: now,
            },
            debounce_ms,
            guard_until: None,
        }
    }

    pub fn current(&self) -> &TabState {
        &self.state
    }

    pub fn is_guarded(&self, now: Millis) -> bool {
        self.guard_until.is_some_and(|until| now < until)
    }

    /// End of the open debounce window, if any.
    pub fn guard_deadline(&self) -> Option<Millis> {
        self.guard_until
    }

    /// Optimistically switch to `view` and open the debounce window.
    ///
    /// Returns `false` without touching anything when `view` is already
    /// active. The caller performs the URL write.
    pub fn set_from_internal(&mut self, view: ViewId, now: Millis) -> bool {
        if view == self.state.active_view {
            return false;
        }
        self.apply(view, TabSource::FromInternal, now);
        self.open_guard(now);
        true
    }

    /// Switch to `view` unconditionally (recovery). Opens the debounce
    /// window so the recovery write's echo is not mistaken for a user action.
    pub fn force(&mut self, view: ViewId, now: Millis) {
        self.apply(view, TabSource::FromInternal, now);
        self.open_guard(now);
    }

    pub fn set_from_url(&mut self, view: ViewId, now: Millis) -> UrlUpdate {
        self.url_view = Some(view.clone());

        if self.is_guarded(now) {
            self.guard_until = None;
            return UrlUpdate::Suppressed;
        }
        self.guard_until = None;

        if view == self.state.active_view {
            return UrlUpdate::Unchanged;
        }
        self.apply(view, TabSource::FromUrl, now);
        UrlUpdate::Adopted
    }

    /// Close the debounce window and check whether the URL converged on the
    /// active view.
    pub fn settle(&mut self, now: Millis) -> Option<Divergence> {
        if self.is_guarded(now) {
            return None;
        }
        self.guard_until = None;

        match &self.url_view {
            Some(url_view) if *url_view != self.state.active_view => Some(Divergence {
                state_view: self.state.active_view.clone(),
                url_view: url_view.clone(),
            }),
            _ => None,
        }
    }

    fn open_guard(&mut self, now: Millis) {
        self.guard_until = if self.debounce_ms == 0 {
            None
        } else {
            Some(now.saturating_add(self.debounce_ms))
        };
    }

    fn apply(&mut self, view: ViewId, source: TabSource, now: Millis) {
        self.state = TabState {
            active_view: view,
            source,
            last_changed_at: now,
        };
    }
}
