use std::collections::BTreeMap;
use std::rc::Rc;

use navsync_config::NavsyncConfig;
use tracing::info;

use super::{Coordinator, view_from_location};
use crate::clock::{Clock, SystemClock};
use crate::events::{CoordinatorEvent, EventLog};
use crate::loops::LoopDetector;
use crate::navigation::{LocationProvider, NavigationObserver, Navigator};
use crate::recovery::{MemorySessionStore, RecoveryController, RecoveryFlag, SessionStore};
use crate::refresh::{RefreshOperation, RefreshThrottler};
use crate::tabs::TabStateSynchronizer;
use crate::timers::{TimerKind, TimerRegistry};
use crate::toast::{NotificationCoordinator, ToastDisplay};
use crate::types::{ResourceKey, ViewId};

/// Collects collaborators and refresh operations, then attaches.
pub struct CoordinatorBuilder {
    config: NavsyncConfig,
    clock: Rc<dyn Clock>,
    store: Rc<dyn SessionStore>,
    operations: BTreeMap<ResourceKey, Rc<dyn RefreshOperation>>,
}

impl CoordinatorBuilder {
    pub fn new(config: NavsyncConfig) -> Self {
        Self {
            config,
            clock: Rc::new(SystemClock::new()),
            store: Rc::new(MemorySessionStore::new()),
            operations: BTreeMap::new(),
        }
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Rc::new(clock);
        self
    }

    pub fn session_store(mut self, store: impl SessionStore + 'static) -> Self {
        self.store = Rc::new(store);
        self
    }

    /// Register the refresh for one resource. Registering a key twice keeps
    /// the last operation.
    pub fn refresh(
        mut self,
        key: impl Into<ResourceKey>,
        operation: impl RefreshOperation + 'static,
    ) -> Self {
        self.operations.insert(key.into(), Rc::new(operation));
        self
    }

    /// Mount: read the current location, derive the initial view, schedule
    /// attach-time refreshes and pick up any recovery left pending by an
    /// earlier mount in the same session.
    pub fn attach(
        self,
        location: &dyn LocationProvider,
        navigator: impl Navigator + 'static,
        display: impl ToastDisplay + 'static,
    ) -> Coordinator {
        let config = self.config;
        let now = self.clock.now_ms();
        let initial = location.current();

        let mut events = EventLog::default();
        let mut observer = NavigationObserver::new(config.history.capacity());
        observer.prime(initial.clone());

        let (view, replaced) = view_from_location(&config, &initial);
        if let Some(requested) = replaced {
            events.push(CoordinatorEvent::UnknownViewReplaced {
                requested,
                fallback: view.clone(),
                at: now,
            });
        }
        let tabs = TabStateSynchronizer::new(view.clone(), config.tabs.debounce_ms(), now);

        let mut timers = TimerRegistry::new();
        if config.refresh.auto_refresh_on_attach() {
            for key in self.operations.keys() {
                timers.schedule(now, TimerKind::AutoRefresh(key.clone()));
            }
        }

        let mut recovery = RecoveryController::new(
            RecoveryFlag::new(self.store, config.recovery.flag_key()),
            ViewId::from(config.safe_view()),
            config.recovery.stabilization_ms(),
            config.recovery.message(),
        );
        if recovery.resume() {
            timers.schedule(
                now.saturating_add(recovery.stabilization_ms()),
                TimerKind::RecoveryStabilized,
            );
        }
        if let Some(error) = recovery.take_degradation() {
            events.push(CoordinatorEvent::StorageDegraded {
                error: error.to_string(),
                at: now,
            });
        }

        info!(
            event = "core.coordinator.attached",
            location = %initial,
            view = %view,
            resources = self.operations.len()
        );

        Coordinator {
            detector: LoopDetector::from_config(&config.loop_detection),
            throttler: RefreshThrottler::new(config.refresh.clone()),
            toasts: NotificationCoordinator::new(config.toasts.clone()),
            clock: self.clock,
            navigator: Box::new(navigator),
            display: Box::new(display),
            operations: self.operations,
            observer,
            tabs,
            recovery,
            timers,
            events,
            config,
            epoch: 0,
            attached: true,
            loading_toasts: BTreeMap::new(),
            retry_attempts: BTreeMap::new(),
        }
    }
}
