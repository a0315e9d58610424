//! Structured record of everything the coordinator did.
//!
//! Hosts drain the log with `Coordinator::take_events`. Control flow never
//! reads it back.

use serde::Serialize;

use crate::clock::Millis;
use crate::loops::LoopPhase;
use crate::refresh::{DenyReason, RefreshTrigger};
use crate::tabs::TabSource;
use crate::toast::{SuppressReason, ToastId, ToastKey, ToastKind};
use crate::types::{ResourceKey, ViewId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinatorEvent {
    NavigationRecorded {
        location: String,
        at: Millis,
    },
    PhaseChanged {
        from: LoopPhase,
        to: LoopPhase,
        count: usize,
        at: Millis,
    },
    TabChanged {
        view: ViewId,
        source: TabSource,
        at: Millis,
    },
    /// URL named a view outside `known_views`; the default was used instead.
    UnknownViewReplaced {
        requested: ViewId,
        fallback: ViewId,
        at: Millis,
    },
    UrlEchoSuppressed {
        view: ViewId,
        at: Millis,
    },
    UrlWriteFailed {
        target: String,
        error: String,
        at: Millis,
    },
    UrlDiverged {
        state_view: ViewId,
        url_view: ViewId,
        at: Millis,
    },
    RefreshStarted {
        key: ResourceKey,
        trigger: RefreshTrigger,
        at: Millis,
    },
    RefreshThrottled {
        key: ResourceKey,
        trigger: RefreshTrigger,
        reason: DenyReason,
        at: Millis,
    },
    RefreshFinished {
        key: ResourceKey,
        trigger: RefreshTrigger,
        error: Option<String>,
        at: Millis,
    },
    /// Completion arrived after its ticket was already released.
    RefreshAbandoned {
        key: ResourceKey,
        at: Millis,
    },
    RefreshRetryScheduled {
        key: ResourceKey,
        attempt: u32,
        due_at: Millis,
    },
    ToastShown {
        id: ToastId,
        key: ToastKey,
        kind: ToastKind,
        at: Millis,
    },
    ToastSuppressed {
        key: ToastKey,
        reason: SuppressReason,
        at: Millis,
    },
    ToastResolved {
        id: ToastId,
        key: ToastKey,
        at: Millis,
    },
    ToastDismissed {
        id: ToastId,
        at: Millis,
    },
    RecoveryStarted {
        safe_view: ViewId,
        at: Millis,
    },
    /// Reset requested while the recovery flag was already set.
    RecoverySkipped {
        at: Millis,
    },
    RecoveryNavigationFailed {
        target: String,
        error: String,
        at: Millis,
    },
    RecoveryFinished {
        at: Millis,
    },
    StorageDegraded {
        error: String,
        at: Millis,
    },
    Detached {
        timers_cancelled: usize,
        toasts_dismissed: usize,
        at: Millis,
    },
}

impl CoordinatorEvent {
    pub fn at(&self) -> Millis {
        match self {
            CoordinatorEvent::NavigationRecorded { at, .. }
            | CoordinatorEvent::PhaseChanged { at, .. }
            | CoordinatorEvent::TabChanged { at, .. }
            | CoordinatorEvent::UnknownViewReplaced { at, .. }
            | CoordinatorEvent::UrlEchoSuppressed { at, .. }
            | CoordinatorEvent::UrlWriteFailed { at, .. }
            | CoordinatorEvent::UrlDiverged { at, .. }
            | CoordinatorEvent::RefreshStarted { at, .. }
            | CoordinatorEvent::RefreshThrottled { at, .. }
            | CoordinatorEvent::RefreshFinished { at, .. }
            | CoordinatorEvent::RefreshAbandoned { at, .. }
            | CoordinatorEvent::ToastShown { at, .. }
            | CoordinatorEvent::ToastSuppressed { at, .. }
            | CoordinatorEvent::ToastResolved { at, .. }
            | CoordinatorEvent::ToastDismissed { at, .. }
            | CoordinatorEvent::RecoveryStarted { at, .. }
            | CoordinatorEvent::RecoverySkipped { at }
            | CoordinatorEvent::RecoveryNavigationFailed { at, .. }
            | CoordinatorEvent::RecoveryFinished { at }
            | CoordinatorEvent::StorageDegraded { at, .. }
            | CoordinatorEvent::Detached { at, .. } => *at,
            CoordinatorEvent::RefreshRetryScheduled { due_at, .. } => *due_at,
        }
    }
}

impl std::fmt::Display for CoordinatorEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinatorEvent::NavigationRecorded { location, .. } => {
                write!(f, "navigation {location}")
            }
            CoordinatorEvent::PhaseChanged {
                from, to, count, ..
            } => write!(f, "phase {from} -> {to} ({count} events in window)"),
            CoordinatorEvent::TabChanged { view, source, .. } => {
                write!(f, "tab {view} (from {source})")
            }
            CoordinatorEvent::UnknownViewReplaced {
                requested,
                fallback,
                ..
            } => write!(f, "unknown view {requested}, using {fallback}"),
            CoordinatorEvent::UrlEchoSuppressed { view, .. } => {
                write!(f, "url echo {view} suppressed")
            }
            CoordinatorEvent::UrlWriteFailed { target, error, .. } => {
                write!(f, "url write {target} failed: {error}")
            }
            CoordinatorEvent::UrlDiverged {
                state_view,
                url_view,
                ..
            } => write!(f, "url shows {url_view} but active view is {state_view}"),
            CoordinatorEvent::RefreshStarted { key, trigger, .. } => {
                write!(f, "refresh {key} started ({trigger})")
            }
            CoordinatorEvent::RefreshThrottled {
                key,
                trigger,
                reason,
                ..
            } => write!(f, "refresh {key} throttled ({trigger}): {reason}"),
            CoordinatorEvent::RefreshFinished {
                key, error: None, ..
            } => write!(f, "refresh {key} finished"),
            CoordinatorEvent::RefreshFinished {
                key,
                error: Some(error),
                ..
            } => write!(f, "refresh {key} failed: {error}"),
            CoordinatorEvent::RefreshAbandoned { key, .. } => {
                write!(f, "refresh {key} completion ignored")
            }
            CoordinatorEvent::RefreshRetryScheduled {
                key,
                attempt,
                due_at,
            } => write!(f, "refresh {key} retry #{attempt} at {due_at}ms"),
            CoordinatorEvent::ToastShown { id, key, .. } => write!(f, "{id} shown [{key}]"),
            CoordinatorEvent::ToastSuppressed { key, reason, .. } => {
                write!(f, "toast [{key}] suppressed: {reason}")
            }
            CoordinatorEvent::ToastResolved { id, key, .. } => {
                write!(f, "{id} resolved [{key}]")
            }
            CoordinatorEvent::ToastDismissed { id, .. } => write!(f, "{id} dismissed"),
            CoordinatorEvent::RecoveryStarted { safe_view, .. } => {
                write!(f, "recovery started, navigating to {safe_view}")
            }
            CoordinatorEvent::RecoverySkipped { .. } => {
                write!(f, "recovery skipped, flag already set")
            }
            CoordinatorEvent::RecoveryNavigationFailed { target, error, .. } => {
                write!(f, "recovery navigation to {target} failed: {error}")
            }
            CoordinatorEvent::RecoveryFinished { .. } => write!(f, "recovery finished"),
            CoordinatorEvent::StorageDegraded { error, .. } => {
                write!(f, "session store unavailable, using memory: {error}")
            }
            CoordinatorEvent::Detached {
                timers_cancelled,
                toasts_dismissed,
                ..
            } => write!(
                f,
                "detached ({timers_cancelled} timers cancelled, {toasts_dismissed} toasts dismissed)"
            ),
        }
    }
}

#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<CoordinatorEvent>,
}

impl EventLog {
    pub fn push(&mut self, event: CoordinatorEvent) {
        self.events.push(event);
    }

    pub fn take(&mut self) -> Vec<CoordinatorEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CoordinatorEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
