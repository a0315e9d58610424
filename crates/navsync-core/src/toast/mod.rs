//! Toast deduplication, spacing and auto-dismiss.

pub mod coordinator;
pub mod traits;
pub mod types;

pub use coordinator::{NotificationCoordinator, NotifyOutcome, SuppressReason};
pub use traits::ToastDisplay;
pub use types::{ToastId, ToastKey, ToastKind, ToastRecord};

/// Shown while a manual refresh is running.
pub const REFRESHING_MESSAGE: &str = "Refreshing data...";
/// Replaces the loading toast when a refresh succeeds.
pub const REFRESHED_MESSAGE: &str = "Data refreshed";
