use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::debug;

use super::{Coordinator, RefreshOutcome, RefreshPermit, RefreshStart};
use crate::errors::CoordinatorError;
use crate::events::CoordinatorEvent;
use crate::navigation::{Location, NavigationEvent};
use crate::refresh::{RefreshError, RefreshTrigger};
use crate::types::ResourceKey;

/// Shared single-threaded handle to a coordinator.
///
/// The async refresh path lives here: the coordinator is borrowed only to
/// start and to finish a run, so location changes and ticks are processed
/// while a refresh is suspended.
#[derive(Clone)]
pub struct CoordinatorHandle {
    inner: Rc<RefCell<Coordinator>>,
}

impl CoordinatorHandle {
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            inner: Rc::new(RefCell::new(coordinator)),
        }
    }

    /// Run `f` with exclusive access. Must not be called from inside a
    /// refresh operation that is being awaited through this handle.
    pub fn with<R>(&self, f: impl FnOnce(&mut Coordinator) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }

    pub fn on_location_change(&self, location: Location) -> Option<NavigationEvent> {
        self.inner.borrow_mut().on_location_change(location)
    }

    pub fn take_events(&self) -> Vec<CoordinatorEvent> {
        self.inner.borrow_mut().take_events()
    }

    pub fn detach(&self) {
        self.inner.borrow_mut().detach();
    }

    /// Throttle-checked refresh of `key`.
    ///
    /// Dropping the returned future before it completes releases the ticket.
    pub async fn refresh(
        &self,
        key: &ResourceKey,
        trigger: RefreshTrigger,
    ) -> Result<RefreshOutcome, CoordinatorError> {
        let start = self.inner.borrow_mut().begin_refresh(key, trigger)?;
        let (permit, operation) = match start {
            RefreshStart::Allowed { permit, operation } => (permit, operation),
            RefreshStart::Throttled(reason) => return Ok(RefreshOutcome::Throttled { reason }),
        };

        let guard = PermitGuard::arm(&self.inner, &permit);
        let result: Result<(), RefreshError> = operation.run(key).await;
        guard.disarm();

        self.inner.borrow_mut().finish_refresh(permit, result)
    }

    /// Fire due timers, then run every refresh they produced, in order.
    pub async fn run_due(&self) -> Vec<(ResourceKey, Result<RefreshOutcome, CoordinatorError>)> {
        let due = self.inner.borrow_mut().tick();
        let mut results = Vec::with_capacity(due.len());
        for refresh in due {
            let outcome = self.refresh(&refresh.key, refresh.trigger).await;
            results.push((refresh.key, outcome));
        }
        results
    }
}

impl std::fmt::Debug for CoordinatorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_borrow() {
            Ok(coordinator) => f
                .debug_tuple("CoordinatorHandle")
                .field(&*coordinator)
                .finish(),
            Err(_) => f.write_str("CoordinatorHandle(<borrowed>)"),
        }
    }
}

/// Releases an outstanding permit if the refresh future is dropped early.
struct PermitGuard {
    coordinator: Weak<RefCell<Coordinator>>,
    permit: Option<RefreshPermit>,
}

impl PermitGuard {
    fn arm(coordinator: &Rc<RefCell<Coordinator>>, permit: &RefreshPermit) -> Self {
        Self {
            coordinator: Rc::downgrade(coordinator),
            permit: Some(permit.duplicate()),
        }
    }

    /// The run finished; the caller hands its own permit to `finish_refresh`.
    fn disarm(mut self) {
        self.permit = None;
    }
}

impl Drop for PermitGuard {
    fn drop(&mut self) {
        let Some(permit) = self.permit.take() else {
            return;
        };
        match self.coordinator.upgrade() {
            Some(inner) => match inner.try_borrow_mut() {
                Ok(mut coordinator) => coordinator.release_refresh(permit),
                Err(_) => debug!(event = "core.refresh.release_skipped_busy", key = %permit.key()),
            },
            None => debug!(event = "core.refresh.release_skipped", key = %permit.key()),
        }
    }
}
