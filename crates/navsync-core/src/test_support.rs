//! Shared fixtures for coordinator tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use navsync_config::{NavsyncConfig, TabsConfig};

use crate::clock::ManualClock;
use crate::coordinator::{Coordinator, CoordinatorBuilder, CoordinatorHandle};
use crate::navigation::Location;
use crate::recovery::MemorySessionStore;
use crate::refresh::{RefreshError, RefreshOperation};
use crate::sim::{RecordingDisplay, SimulatedBrowser};
use crate::types::ResourceKey;

pub const VIEWS: [&str; 5] = [
    "time-off",
    "messages",
    "shift-coverage",
    "announcements",
    "training",
];

/// Defaults plus a known-views list and no attach-time refresh, so tests
/// start from an empty timer registry.
pub fn test_config() -> NavsyncConfig {
    let mut config = NavsyncConfig {
        tabs: TabsConfig {
            known_views: Some(VIEWS.iter().map(|v| v.to_string()).collect()),
            ..Default::default()
        },
        ..Default::default()
    };
    config.refresh.auto_refresh_on_attach = Some(false);
    config
}

pub struct Harness {
    pub clock: ManualClock,
    pub browser: SimulatedBrowser,
    pub display: RecordingDisplay,
    pub store: MemorySessionStore,
}

impl Harness {
    pub fn new(initial: &str) -> Self {
        Self::with_store(initial, MemorySessionStore::new())
    }

    /// Share a session store with an earlier mount.
    pub fn with_store(initial: &str, store: MemorySessionStore) -> Self {
        Self {
            clock: ManualClock::new(0),
            browser: SimulatedBrowser::new(Location::parse(initial)),
            display: RecordingDisplay::default(),
            store,
        }
    }

    pub fn builder(&self, config: NavsyncConfig) -> CoordinatorBuilder {
        Coordinator::builder(config)
            .clock(self.clock.clone())
            .session_store(self.store.clone())
    }

    pub fn attach(&self, builder: CoordinatorBuilder) -> Coordinator {
        builder.attach(&self.browser, self.browser.clone(), self.display.clone())
    }

    pub fn coordinator(&self) -> Coordinator {
        self.attach(self.builder(test_config()))
    }

    pub fn handle(&self, builder: CoordinatorBuilder) -> CoordinatorHandle {
        CoordinatorHandle::new(self.attach(builder))
    }

    /// Report a user navigation to `raw`.
    pub fn visit(&self, coordinator: &mut Coordinator, raw: &str) {
        let location = self.browser.visit(Location::parse(raw));
        coordinator.on_location_change(location);
    }

    /// Deliver every location the coordinator wrote since the last call.
    pub fn deliver_echoes(&self, coordinator: &mut Coordinator) {
        for location in self.browser.take_echoes() {
            coordinator.on_location_change(location);
        }
    }
}

/// Refresh that counts its runs and resolves immediately with a fixed result.
#[derive(Clone)]
pub struct CountingRefresh {
    pub runs: Rc<Cell<u32>>,
    fail_with: Option<String>,
}

impl CountingRefresh {
    pub fn ok() -> Self {
        Self {
            runs: Rc::new(Cell::new(0)),
            fail_with: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            runs: Rc::new(Cell::new(0)),
            fail_with: Some(message.to_string()),
        }
    }
}

impl RefreshOperation for CountingRefresh {
    fn run(&self, _key: &ResourceKey) -> LocalBoxFuture<'static, Result<(), RefreshError>> {
        self.runs.set(self.runs.get() + 1);
        let result = match &self.fail_with {
            Some(message) => Err(RefreshError::failed(message.clone())),
            None => Ok(()),
        };
        Box::pin(futures::future::ready(result))
    }
}

/// Refresh that stays pending until the test completes it.
#[derive(Clone, Default)]
pub struct GatedRefresh {
    pending: Rc<RefCell<Vec<oneshot::Sender<Result<(), RefreshError>>>>>,
}

impl GatedRefresh {
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Complete the oldest outstanding run.
    pub fn complete(&self, result: Result<(), RefreshError>) {
        let sender = {
            let mut pending = self.pending.borrow_mut();
            if pending.is_empty() {
                return;
            }
            pending.remove(0)
        };
        let _ = sender.send(result);
    }
}

impl RefreshOperation for GatedRefresh {
    fn run(&self, _key: &ResourceKey) -> LocalBoxFuture<'static, Result<(), RefreshError>> {
        let (sender, receiver) = oneshot::channel();
        self.pending.borrow_mut().push(sender);
        Box::pin(async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(RefreshError::failed("operation dropped")))
        })
    }
}
