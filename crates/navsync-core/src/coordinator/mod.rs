//! The per-mount coordinator.
//!
//! Owns every component, the timer registry and the event log. The host
//! pushes location changes and calls `tick` from its poll loop; refreshes run
//! through [`CoordinatorHandle`] so the coordinator is never borrowed across
//! an await.

mod builder;
mod handle;


use std::collections::BTreeMap;
use std::rc::Rc;

use navsync_config::NavsyncConfig;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{Clock, Millis};
use crate::errors::CoordinatorError;
use crate::events::{CoordinatorEvent, EventLog};
use crate::loops::{LoopDetector, LoopPhase, PhaseTransition};
use crate::navigation::{
    Location, NavigateMode, NavigationEvent, NavigationHistory, NavigationObserver, Navigator,
};
use crate::recovery::{RecoveryController, RecoveryOutcome};
use crate::refresh::{
    DenyReason, RefreshDecision, RefreshError, RefreshOperation, RefreshThrottler,
    RefreshTrigger,
};
use crate::tabs::{TabSource, TabState, TabStateSynchronizer, UrlUpdate};
use crate::timers::{TimerKind, TimerRegistry};
use crate::toast::{
    NotificationCoordinator, NotifyOutcome, REFRESHED_MESSAGE, REFRESHING_MESSAGE,
    ToastDisplay, ToastId, ToastKey, ToastKind, ToastRecord,
};
use crate::types::{ResourceKey, ViewId};

pub use builder::CoordinatorBuilder;
pub use handle::CoordinatorHandle;

/// A refresh the coordinator wants run, returned from [`Coordinator::tick`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueRefresh {
    pub key: ResourceKey,
    pub trigger: RefreshTrigger,
}

/// Proof that the throttler allowed a run. Hand it back to
/// `finish_refresh` or `release_refresh`.
#[derive(Debug, PartialEq, Eq)]
pub struct RefreshPermit {
    key: ResourceKey,
    trigger: RefreshTrigger,
    generation: u64,
    epoch: u64,
}

impl RefreshPermit {
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    pub fn trigger(&self) -> RefreshTrigger {
        self.trigger
    }

    pub(crate) fn duplicate(&self) -> Self {
        Self {
            key: self.key.clone(),
            trigger: self.trigger,
            generation: self.generation,
            epoch: self.epoch,
        }
    }
}

pub enum RefreshStart {
    Allowed {
        permit: RefreshPermit,
        operation: Rc<dyn RefreshOperation>,
    },
    Throttled(DenyReason),
}

impl std::fmt::Debug for RefreshStart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshStart::Allowed { permit, .. } => {
                f.debug_struct("Allowed").field("permit", permit).finish()
            }
            RefreshStart::Throttled(reason) => f.debug_tuple("Throttled").field(reason).finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Completed,
    Throttled { reason: DenyReason },
    /// The ticket was already released (recovery reset); result discarded.
    Abandoned,
    /// Finished after detach; result discarded.
    Detached,
}

/// Diagnostic snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorStatus {
    pub attached: bool,
    pub phase: LoopPhase,
    pub window_count: usize,
    pub active_view: ViewId,
    pub tab_source: TabSource,
    pub location: Option<String>,
    pub history_len: usize,
    pub in_flight: Vec<ResourceKey>,
    pub active_toasts: Vec<ToastRecord>,
    pub pending_timers: usize,
    pub next_deadline: Option<Millis>,
    pub recovery_in_flight: bool,
    pub storage_degraded: bool,
}

pub struct Coordinator {
    config: NavsyncConfig,
    clock: Rc<dyn Clock>,
    navigator: Box<dyn Navigator>,
    display: Box<dyn ToastDisplay>,
    operations: BTreeMap<ResourceKey, Rc<dyn RefreshOperation>>,
    observer: NavigationObserver,
    detector: LoopDetector,
    tabs: TabStateSynchronizer,
    throttler: RefreshThrottler,
    toasts: NotificationCoordinator,
    recovery: RecoveryController,
    timers: TimerRegistry,
    events: EventLog,
    /// Bumped on detach so permits from the old mount are recognised.
    epoch: u64,
    attached: bool,
    loading_toasts: BTreeMap<ResourceKey, ToastId>,
    retry_attempts: BTreeMap<ResourceKey, u32>,
}

impl Coordinator {
    pub fn builder(config: NavsyncConfig) -> CoordinatorBuilder {
        CoordinatorBuilder::new(config)
    }

    /// Feed a location reported by the environment.
    ///
    /// Returns the recorded event, or `None` for a duplicate report or a
    /// detached coordinator.
    pub fn on_location_change(&mut self, location: Location) -> Option<NavigationEvent> {
        if !self.attached {
            return None;
        }
        let now = self.clock.now_ms();
        let event = self.observer.on_location_change(location, now)?;
        debug!(
            event = "core.nav.recorded",
            location = %event.location,
            history_len = self.observer.history().len()
        );
        self.events.push(CoordinatorEvent::NavigationRecorded {
            location: event.location.to_string(),
            at: now,
        });

        for transition in self.detector.record(now) {
            self.emit_transition(transition);
        }

        self.sync_tab_from_url(&event.location, now);

        // Retried on every event while EMERGENCY holds; a held flag only
        // defers it.
        if self.detector.phase() == LoopPhase::Emergency {
            self.run_recovery(now);
        }
        Some(event)
    }

    /// Switch views from inside the application and mirror it into the URL.
    ///
    /// Returns `Ok(false)` if `view` is already active.
    pub fn select_view(&mut self, view: impl Into<ViewId>) -> Result<bool, CoordinatorError> {
        if !self.attached {
            return Err(CoordinatorError::Detached);
        }
        let view = view.into();
        if !self.config.tabs.is_known_view(&view) {
            return Err(CoordinatorError::UnknownView { view });
        }

        let now = self.clock.now_ms();
        if !self.tabs.set_from_internal(view.clone(), now) {
            return Ok(false);
        }
        info!(event = "core.tabs.changed", view = %view, source = "internal");
        self.events.push(CoordinatorEvent::TabChanged {
            view: view.clone(),
            source: TabSource::FromInternal,
            at: now,
        });

        self.write_view_to_url(&view, now, false);
        self.arm_debounce_timer();
        Ok(true)
    }

    /// Run loop recovery now, as if EMERGENCY had just been entered.
    pub fn reset(&mut self) -> RecoveryOutcome {
        let now = self.clock.now_ms();
        self.run_recovery(now)
    }

    /// Show a toast. Returns whether it was shown.
    pub fn notify(&mut self, message: &str, kind: ToastKind) -> bool {
        if !self.attached {
            return false;
        }
        let now = self.clock.now_ms();
        self.show_toast(message, kind, now).is_some()
    }

    pub fn dismiss_toast(&mut self, key: &ToastKey) -> bool {
        let Some(id) = self
            .toasts
            .active(self.clock.now_ms())
            .find(|r| &r.key == key)
            .map(|r| r.id)
        else {
            return false;
        };
        let dismissed = self.toasts.dismiss_id(id, self.display.as_mut());
        if dismissed {
            debug!(event = "core.toast.dismissed", key = %key);
            self.events.push(CoordinatorEvent::ToastDismissed {
                id,
                at: self.clock.now_ms(),
            });
        }
        dismissed
    }

    /// Fire every due timer. Returns the refreshes that became due; run them
    /// with [`CoordinatorHandle::run_due`] or `begin_refresh`.
    pub fn tick(&mut self) -> Vec<DueRefresh> {
        if !self.attached {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let mut due = Vec::new();

        for timer in self.timers.pop_due(now) {
            match timer.kind {
                TimerKind::DebounceSettled => self.settle_tabs(now),
                TimerKind::ToastExpiry(id) => {
                    if self.toasts.expire(id, now, self.display.as_mut()) {
                        debug!(event = "core.toast.expired", id = %id);
                        self.events.push(CoordinatorEvent::ToastDismissed { id, at: now });
                    }
                }
                TimerKind::RecoveryStabilized => self.finish_recovery(now),
                TimerKind::AutoRefresh(key) => due.push(DueRefresh {
                    key,
                    trigger: RefreshTrigger::Automatic,
                }),
                TimerKind::RefreshRetry(key) => due.push(DueRefresh {
                    key,
                    trigger: RefreshTrigger::Retry,
                }),
            }
        }

        if let Some(transition) = self.detector.expire(now) {
            self.emit_transition(transition);
        }
        due
    }

    /// Ask the throttler for a run of `key`. An allowed manual refresh puts
    /// up a loading toast.
    pub fn begin_refresh(
        &mut self,
        key: &ResourceKey,
        trigger: RefreshTrigger,
    ) -> Result<RefreshStart, CoordinatorError> {
        if !self.attached {
            return Err(CoordinatorError::Detached);
        }
        let operation = self
            .operations
            .get(key)
            .cloned()
            .ok_or_else(|| CoordinatorError::UnknownResource { key: key.clone() })?;

        let now = self.clock.now_ms();
        match self.throttler.attempt(key, trigger, now) {
            RefreshDecision::Denied(reason) => {
                debug!(
                    event = "core.refresh.throttled",
                    key = %key,
                    trigger = %trigger,
                    reason = %reason
                );
                self.events.push(CoordinatorEvent::RefreshThrottled {
                    key: key.clone(),
                    trigger,
                    reason,
                    at: now,
                });
                Ok(RefreshStart::Throttled(reason))
            }
            RefreshDecision::Allowed { generation } => {
                info!(event = "core.refresh.started", key = %key, trigger = %trigger);
                self.events.push(CoordinatorEvent::RefreshStarted {
                    key: key.clone(),
                    trigger,
                    at: now,
                });
                if trigger == RefreshTrigger::Manual
                    && let Some(id) = self.show_toast(REFRESHING_MESSAGE, ToastKind::Loading, now)
                {
                    self.loading_toasts.insert(key.clone(), id);
                }
                Ok(RefreshStart::Allowed {
                    permit: RefreshPermit {
                        key: key.clone(),
                        trigger,
                        generation,
                        epoch: self.epoch,
                    },
                    operation,
                })
            }
        }
    }

    /// Record the result of an allowed run.
    ///
    /// The ticket is released on success and failure alike. A failure comes
    /// back as `CoordinatorError::RefreshFailed` after the error toast and any
    /// retry have been arranged.
    pub fn finish_refresh(
        &mut self,
        permit: RefreshPermit,
        result: Result<(), RefreshError>,
    ) -> Result<RefreshOutcome, CoordinatorError> {
        if !self.attached || permit.epoch != self.epoch {
            debug!(event = "core.refresh.late_completion_ignored", key = %permit.key);
            return Ok(RefreshOutcome::Detached);
        }
        let now = self.clock.now_ms();
        let RefreshPermit {
            key,
            trigger,
            generation,
            ..
        } = permit;

        if !self.throttler.complete(&key, generation, now) {
            debug!(event = "core.refresh.abandoned", key = %key);
            self.events.push(CoordinatorEvent::RefreshAbandoned { key, at: now });
            return Ok(RefreshOutcome::Abandoned);
        }

        match result {
            Ok(()) => {
                info!(event = "core.refresh.completed", key = %key, trigger = %trigger);
                self.events.push(CoordinatorEvent::RefreshFinished {
                    key: key.clone(),
                    trigger,
                    error: None,
                    at: now,
                });
                self.retry_attempts.remove(&key);
                if let Some(id) = self.loading_toasts.remove(&key) {
                    self.resolve_toast(id, REFRESHED_MESSAGE, ToastKind::Success, now);
                }
                Ok(RefreshOutcome::Completed)
            }
            Err(error) => {
                warn!(
                    event = "core.refresh.failed",
                    key = %key,
                    trigger = %trigger,
                    error = %error
                );
                self.events.push(CoordinatorEvent::RefreshFinished {
                    key: key.clone(),
                    trigger,
                    error: Some(error.to_string()),
                    at: now,
                });

                let message = error.to_string();
                match self.loading_toasts.remove(&key) {
                    Some(id) => self.resolve_toast(id, &message, ToastKind::Error, now),
                    None => {
                        self.show_toast(&message, ToastKind::Error, now);
                    }
                }

                if trigger != RefreshTrigger::Manual {
                    self.schedule_retry(&key, now);
                }
                Err(CoordinatorError::RefreshFailed { key, source: error })
            }
        }
    }

    /// Give a permit back without a result (the refresh was cancelled).
    /// The ticket is released and any loading toast taken down.
    pub fn release_refresh(&mut self, permit: RefreshPermit) {
        if !self.attached || permit.epoch != self.epoch {
            return;
        }
        let now = self.clock.now_ms();
        if self.throttler.complete(&permit.key, permit.generation, now) {
            info!(event = "core.refresh.cancelled", key = %permit.key);
            self.dismiss_loading_toast(&permit.key, now);
            self.events.push(CoordinatorEvent::RefreshAbandoned {
                key: permit.key,
                at: now,
            });
        }
    }

    /// Unmount. Cancels every timer, takes every toast off screen and drops
    /// all per-mount state. The recovery flag is left for the next mount.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        let now = self.clock.now_ms();
        let timers_cancelled = self.timers.cancel_all();
        let toasts_dismissed = self.toasts.dismiss_all(self.display.as_mut());

        self.observer.clear();
        self.detector.clear_window();
        self.throttler.clear();
        self.loading_toasts.clear();
        self.retry_attempts.clear();
        self.attached = false;
        self.epoch += 1;

        info!(
            event = "core.coordinator.detached",
            timers_cancelled = timers_cancelled,
            toasts_dismissed = toasts_dismissed
        );
        self.events.push(CoordinatorEvent::Detached {
            timers_cancelled,
            toasts_dismissed,
            at: now,
        });
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn current_tab(&self) -> &TabState {
        self.tabs.current()
    }

    pub fn phase(&self) -> LoopPhase {
        self.detector.phase()
    }

    pub fn history(&self) -> &NavigationHistory {
        self.observer.history()
    }

    pub fn current_location(&self) -> Option<&Location> {
        self.observer.current()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn config(&self) -> &NavsyncConfig {
        &self.config
    }

    pub fn now_ms(&self) -> Millis {
        self.clock.now_ms()
    }

    pub fn take_events(&mut self) -> Vec<CoordinatorEvent> {
        self.events.take()
    }

    pub fn status(&self) -> CoordinatorStatus {
        let now = self.clock.now_ms();
        let tab = self.tabs.current();
        CoordinatorStatus {
            attached: self.attached,
            phase: self.detector.phase(),
            window_count: self.detector.count(),
            active_view: tab.active_view.clone(),
            tab_source: tab.source,
            location: self.observer.current().map(ToString::to_string),
            history_len: self.observer.history().len(),
            in_flight: self.throttler.in_flight(),
            active_toasts: self.toasts.active(now).cloned().collect(),
            pending_timers: self.timers.len(),
            next_deadline: self.timers.next_deadline(),
            recovery_in_flight: self.recovery.is_in_flight(),
            storage_degraded: self.recovery.flag().is_degraded(),
        }
    }

    fn sync_tab_from_url(&mut self, location: &Location, now: Millis) {
        let (view, replaced) = view_from_location(&self.config, location);
        if let Some(requested) = replaced {
            debug!(event = "core.tabs.unknown_view_replaced", requested = %requested);
            self.events.push(CoordinatorEvent::UnknownViewReplaced {
                requested,
                fallback: view.clone(),
                at: now,
            });
        }

        match self.tabs.set_from_url(view.clone(), now) {
            UrlUpdate::Adopted => {
                info!(event = "core.tabs.changed", view = %view, source = "url");
                self.events.push(CoordinatorEvent::TabChanged {
                    view,
                    source: TabSource::FromUrl,
                    at: now,
                });
            }
            UrlUpdate::Suppressed => {
                debug!(event = "core.tabs.echo_suppressed", view = %view);
                self.events
                    .push(CoordinatorEvent::UrlEchoSuppressed { view, at: now });
            }
            UrlUpdate::Unchanged => {}
        }
    }

    fn settle_tabs(&mut self, now: Millis) {
        if let Some(divergence) = self.tabs.settle(now) {
            debug!(
                event = "core.tabs.diverged",
                state_view = %divergence.state_view,
                url_view = %divergence.url_view
            );
            self.events.push(CoordinatorEvent::UrlDiverged {
                state_view: divergence.state_view,
                url_view: divergence.url_view,
                at: now,
            });
        }
    }

    /// Replace-write `view` into the current location, keeping the path and
    /// every other query parameter. Failures are reported, never rolled back.
    fn write_view_to_url(&mut self, view: &ViewId, now: Millis, recovering: bool) {
        let target = self
            .observer
            .current()
            .cloned()
            .unwrap_or_else(|| Location::new("/"))
            .with_param(self.config.tabs.query_param(), view.as_str());

        if let Err(error) = self.navigator.navigate(&target, NavigateMode::Replace) {
            let target = target.to_string();
            if recovering {
                warn!(
                    event = "core.recovery.navigation_failed",
                    target = %target,
                    error = %error
                );
                self.events.push(CoordinatorEvent::RecoveryNavigationFailed {
                    target,
                    error: error.to_string(),
                    at: now,
                });
            } else {
                warn!(
                    event = "core.tabs.url_write_failed",
                    target = %target,
                    error = %error
                );
                self.events.push(CoordinatorEvent::UrlWriteFailed {
                    target,
                    error: error.to_string(),
                    at: now,
                });
            }
        }
    }

    fn arm_debounce_timer(&mut self) {
        self.timers
            .cancel_matching(|kind| matches!(kind, TimerKind::DebounceSettled));
        if let Some(deadline) = self.tabs.guard_deadline() {
            self.timers.schedule(deadline, TimerKind::DebounceSettled);
        }
    }

    fn run_recovery(&mut self, now: Millis) -> RecoveryOutcome {
        let outcome = self.recovery.begin();
        self.report_storage_degradation(now);

        let RecoveryOutcome::Started { safe_view } = outcome else {
            self.events.push(CoordinatorEvent::RecoverySkipped { at: now });
            return RecoveryOutcome::Skipped;
        };
        self.events.push(CoordinatorEvent::RecoveryStarted {
            safe_view: safe_view.clone(),
            at: now,
        });

        if let Some(transition) = self.detector.begin_recovery(now) {
            self.emit_transition(transition);
        }

        self.tabs.force(safe_view.clone(), now);
        self.events.push(CoordinatorEvent::TabChanged {
            view: safe_view.clone(),
            source: TabSource::FromInternal,
            at: now,
        });
        self.write_view_to_url(&safe_view, now, true);
        self.arm_debounce_timer();

        self.detector.clear_window();
        for key in self.throttler.reset_in_progress() {
            info!(event = "core.refresh.reset_by_recovery", key = %key);
            self.dismiss_loading_toast(&key, now);
        }

        let message = self.recovery.message().to_string();
        self.show_toast(&message, ToastKind::Warning, now);

        self.timers
            .cancel_matching(|kind| matches!(kind, TimerKind::RecoveryStabilized));
        self.timers.schedule(
            now.saturating_add(self.recovery.stabilization_ms()),
            TimerKind::RecoveryStabilized,
        );
        RecoveryOutcome::Started { safe_view }
    }

    fn finish_recovery(&mut self, now: Millis) {
        self.recovery.finish();
        self.report_storage_degradation(now);
        if let Some(transition) = self.detector.finish_recovery(now) {
            self.emit_transition(transition);
        }
        self.events.push(CoordinatorEvent::RecoveryFinished { at: now });
    }

    fn report_storage_degradation(&mut self, now: Millis) {
        if let Some(error) = self.recovery.take_degradation() {
            self.events.push(CoordinatorEvent::StorageDegraded {
                error: error.to_string(),
                at: now,
            });
        }
    }

    fn schedule_retry(&mut self, key: &ResourceKey, now: Millis) {
        let attempt = self.retry_attempts.get(key).copied().unwrap_or(0) + 1;
        if attempt > self.config.refresh.max_retries() {
            debug!(event = "core.refresh.retries_exhausted", key = %key);
            self.retry_attempts.remove(key);
            return;
        }
        self.retry_attempts.insert(key.clone(), attempt);

        let due_at = now.saturating_add(self.config.refresh.retry_delay_ms());
        self.timers
            .schedule(due_at, TimerKind::RefreshRetry(key.clone()));
        info!(
            event = "core.refresh.retry_scheduled",
            key = %key,
            attempt = attempt,
            due_at = due_at
        );
        self.events.push(CoordinatorEvent::RefreshRetryScheduled {
            key: key.clone(),
            attempt,
            due_at,
        });
    }

    fn show_toast(&mut self, message: &str, kind: ToastKind, now: Millis) -> Option<ToastId> {
        match self.toasts.notify(message, kind, now, self.display.as_mut()) {
            NotifyOutcome::Shown { id, key, expire_at } => {
                if let Some(deadline) = expire_at {
                    self.timers.schedule(deadline, TimerKind::ToastExpiry(id));
                }
                debug!(event = "core.toast.shown", id = %id, key = %key);
                self.events.push(CoordinatorEvent::ToastShown {
                    id,
                    key,
                    kind,
                    at: now,
                });
                Some(id)
            }
            NotifyOutcome::Suppressed { key, reason } => {
                debug!(event = "core.toast.suppressed", key = %key, reason = %reason);
                self.events.push(CoordinatorEvent::ToastSuppressed {
                    key,
                    reason,
                    at: now,
                });
                None
            }
        }
    }

    fn resolve_toast(&mut self, id: ToastId, message: &str, kind: ToastKind, now: Millis) {
        let was_dismissed = self.toasts.get(id).is_none_or(|r| r.dismissed);
        match self
            .toasts
            .resolve(id, message, kind, now, self.display.as_mut())
        {
            Some(deadline) => {
                self.timers.schedule(deadline, TimerKind::ToastExpiry(id));
                self.events.push(CoordinatorEvent::ToastResolved {
                    id,
                    key: ToastKey::new(message, kind),
                    at: now,
                });
            }
            None => {
                if !was_dismissed && self.toasts.get(id).is_some_and(|r| r.dismissed) {
                    self.events.push(CoordinatorEvent::ToastDismissed { id, at: now });
                }
            }
        }
    }

    fn dismiss_loading_toast(&mut self, key: &ResourceKey, now: Millis) {
        if let Some(id) = self.loading_toasts.remove(key)
            && self.toasts.dismiss_id(id, self.display.as_mut())
        {
            self.events.push(CoordinatorEvent::ToastDismissed { id, at: now });
        }
    }

    fn emit_transition(&mut self, transition: PhaseTransition) {
        let PhaseTransition {
            from,
            to,
            at,
            count,
        } = transition;
        match to {
            LoopPhase::Warning | LoopPhase::Emergency => warn!(
                event = "core.loop.phase_changed",
                from = %from,
                to = %to,
                count = count
            ),
            _ => info!(
                event = "core.loop.phase_changed",
                from = %from,
                to = %to,
                count = count
            ),
        }
        self.events.push(CoordinatorEvent::PhaseChanged {
            from,
            to,
            count,
            at,
        });
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("attached", &self.attached)
            .field("phase", &self.detector.phase())
            .field("tab", self.tabs.current())
            .field("timers", &self.timers.len())
            .finish_non_exhaustive()
    }
}

/// The view a location names. Falls back to the default view when the
/// parameter is missing, or when it names a view outside `known_views`; the
/// second element carries the rejected name in that case.
pub(crate) fn view_from_location(
    config: &NavsyncConfig,
    location: &Location,
) -> (ViewId, Option<ViewId>) {
    let tabs = &config.tabs;
    let default = ViewId::from(tabs.default_view());
    match location.param(tabs.query_param()).filter(|v| !v.is_empty()) {
        Some(view) if tabs.is_known_view(view) => (ViewId::from(view), None),
        Some(view) => (default, Some(ViewId::from(view))),
        None => (default, None),
    }
}
