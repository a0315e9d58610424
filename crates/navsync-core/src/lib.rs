//! navsync-core: navigation-synchronized refresh coordination
//!
//! Keeps a view's tab state in step with the URL, gates refreshes and toasts,
//! and detects and recovers from navigation loops. Everything is owned by one
//! [`Coordinator`] per mounted view and driven by an injected clock.
//!
//! # Main Entry Points
//!
//! - [`coordinator`] - Attach, feed location changes, tick timers, refresh
//! - [`navigation`] - Locations, history and the navigator seam
//! - [`refresh`] - Per-resource refresh throttling
//! - [`recovery`] - Loop recovery and the session-scoped recovery flag
//! - [`sim`] - In-memory collaborators for replay and tests

pub mod clock;
pub mod coordinator;
pub mod errors;
pub mod events;
pub mod logging;
pub mod loops;
pub mod navigation;
pub mod recovery;
pub mod refresh;
pub mod sim;
pub mod tabs;
pub mod timers;
pub mod toast;
pub mod types;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, ManualClock, Millis, SystemClock};
pub use coordinator::{
    Coordinator, CoordinatorBuilder, CoordinatorHandle, CoordinatorStatus, DueRefresh,
    RefreshOutcome, RefreshPermit, RefreshStart,
};
pub use errors::{CoordinatorError, NavsyncError, NavsyncResult};
pub use events::CoordinatorEvent;
pub use loops::{LoopDetector, LoopPhase, PhaseTransition};
pub use navigation::{
    Location, LocationProvider, NavigateMode, NavigationError, NavigationEvent,
    NavigationHistory, Navigator,
};
pub use recovery::{MemorySessionStore, RecoveryOutcome, SessionStore, StorageError};
pub use refresh::{DenyReason, RefreshError, RefreshOperation, RefreshTrigger};
pub use tabs::{TabSource, TabState};
pub use toast::{ToastDisplay, ToastId, ToastKey, ToastKind};
pub use types::{ResourceKey, ViewId};

// Re-export config types from navsync-config
pub use navsync_config::{ConfigError, NavsyncConfig};

// Re-export logging initialization
pub use logging::init_logging;
