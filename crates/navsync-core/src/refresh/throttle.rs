use std::collections::BTreeMap;

use navsync_config::RefreshConfig;
use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::types::ResourceKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshTrigger {
    /// User asked for fresh data.
    Manual,
    /// Background refresh (mount, schedule).
    Automatic,
    /// Follow-up after a failed automatic refresh. Spaced like a manual one.
    Retry,
}

impl std::fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshTrigger::Manual => write!(f, "manual"),
            RefreshTrigger::Automatic => write!(f, "automatic"),
            RefreshTrigger::Retry => write!(f, "retry"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshTicket {
    pub resource_key: ResourceKey,
    pub last_run_at: Option<Millis>,
    pub in_progress: bool,
    pub manual_min_interval_ms: u64,
    pub automatic_min_interval_ms: u64,
    /// Bumped on every allowed attempt; completions carry it back so a
    /// stale completion cannot release a newer run.
    #[serde(skip)]
    generation: u64,
}

impl RefreshTicket {
    pub fn min_interval_ms(&self, trigger: RefreshTrigger) -> u64 {
        match trigger {
            RefreshTrigger::Manual | RefreshTrigger::Retry => self.manual_min_interval_ms,
            RefreshTrigger::Automatic => self.automatic_min_interval_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenyReason {
    InProgress,
    TooSoon { retry_in_ms: u64 },
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::InProgress => write!(f, "already in progress"),
            DenyReason::TooSoon { retry_in_ms } => {
                write!(f, "too soon, retry in {retry_in_ms}ms")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    /// Allowed; `generation` must be passed back to `complete`.
    Allowed { generation: u64 },
    Denied(DenyReason),
}

impl RefreshDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RefreshDecision::Allowed { .. })
    }
}

/// Per-resource gate: one run at a time, minimum spacing between runs.
///
/// Advisory only. It never runs anything and never fails.
#[derive(Debug, Clone)]
pub struct RefreshThrottler {
    config: RefreshConfig,
    tickets: BTreeMap<ResourceKey, RefreshTicket>,
    next_generation: u64,
}

impl RefreshThrottler {
    pub fn new(config: RefreshConfig) -> Self {
        Self {
            config,
            tickets: BTreeMap::new(),
            next_generation: 0,
        }
    }

    pub fn attempt(
        &mut self,
        key: &ResourceKey,
        trigger: RefreshTrigger,
        now: Millis,
    ) -> RefreshDecision {
        let config = &self.config;
        let ticket = self
            .tickets
            .entry(key.clone())
            .or_insert_with(|| RefreshTicket {
                resource_key: key.clone(),
                last_run_at: None,
                in_progress: false,
                manual_min_interval_ms: config.manual_min_interval_ms(key),
                automatic_min_interval_ms: config.automatic_min_interval_ms(key),
                generation: 0,
            });

        if ticket.in_progress {
            return RefreshDecision::Denied(DenyReason::InProgress);
        }

        if let Some(last_run_at) = ticket.last_run_at {
            let elapsed = now.saturating_sub(last_run_at);
            let min_interval = ticket.min_interval_ms(trigger);
            if elapsed < min_interval {
                return RefreshDecision::Denied(DenyReason::TooSoon {
                    retry_in_ms: min_interval - elapsed,
                });
            }
        }

        self.next_generation += 1;
        ticket.in_progress = true;
        ticket.generation = self.next_generation;
        RefreshDecision::Allowed {
            generation: self.next_generation,
        }
    }

    /// Release the ticket for `key`, success or failure alike.
    ///
    /// Returns `false` when the generation does not match the outstanding
    /// run (already released by a reset, or superseded).
    pub fn complete(&mut self, key: &ResourceKey, generation: u64, now: Millis) -> bool {
        match self.tickets.get_mut(key) {
            Some(ticket) if ticket.in_progress && ticket.generation == generation => {
                ticket.in_progress = false;
                ticket.last_run_at = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Clear every in-progress flag so a stuck run cannot block future ones.
    /// Returns the keys that were released.
    pub fn reset_in_progress(&mut self) -> Vec<ResourceKey> {
        let mut released = Vec::new();
        for ticket in self.tickets.values_mut() {
            if ticket.in_progress {
                ticket.in_progress = false;
                released.push(ticket.resource_key.clone());
            }
        }
        released
    }

    pub fn ticket(&self, key: &ResourceKey) -> Option<&RefreshTicket> {
        self.tickets.get(key)
    }

    pub fn in_flight(&self) -> Vec<ResourceKey> {
        self.tickets
            .values()
            .filter(|t| t.in_progress)
            .map(|t| t.resource_key.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.tickets.clear();
    }
}
