//! Owned timer registry.
//!
//! Nothing here sleeps. Deadlines are compared against the injected clock
//! when the coordinator ticks, and cancelling a timer removes it for good.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::clock::Millis;
use crate::toast::ToastId;
use crate::types::ResourceKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TimerId(u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum TimerKind {
    /// Tab debounce window closes.
    DebounceSettled,
    ToastExpiry(ToastId),
    RecoveryStabilized,
    AutoRefresh(ResourceKey),
    RefreshRetry(ResourceKey),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timer {
    pub id: TimerId,
    pub deadline: Millis,
    pub kind: TimerKind,
}

#[derive(Debug, Default)]
pub struct TimerRegistry {
    timers: BTreeMap<TimerId, Timer>,
    next_id: u64,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Millis, kind: TimerKind) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        tracing::trace!(
            event = "core.timer.scheduled",
            timer_id = id.0,
            deadline = deadline,
            kind = ?kind
        );
        self.timers.insert(id, Timer { id, deadline, kind });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    /// Cancel every timer whose kind matches. Returns how many were removed.
    pub fn cancel_matching(&mut self, predicate: impl Fn(&TimerKind) -> bool) -> usize {
        let before = self.timers.len();
        self.timers.retain(|_, timer| !predicate(&timer.kind));
        before - self.timers.len()
    }

    /// Remove and return every timer due at `now`, earliest deadline first.
    /// Timers with equal deadlines fire in scheduling order.
    pub fn pop_due(&mut self, now: Millis) -> Vec<Timer> {
        let due_ids: Vec<TimerId> = self
            .timers
            .values()
            .filter(|t| t.deadline <= now)
            .map(|t| t.id)
            .collect();

        let mut due: Vec<Timer> = due_ids
            .into_iter()
            .filter_map(|id| self.timers.remove(&id))
            .collect();
        due.sort_by_key(|t| (t.deadline, t.id));
        due
    }

    pub fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        self.timers.clear();
        count
    }

    pub fn contains(&self, predicate: impl Fn(&TimerKind) -> bool) -> bool {
        self.timers.values().any(|t| predicate(&t.kind))
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.timers.values().map(|t| t.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
