//! Loop recovery and the session-scoped recovery flag.

pub mod controller;
pub mod errors;
pub mod store;

pub use controller::{RecoveryController, RecoveryOutcome};
pub use errors::StorageError;
pub use store::{MemorySessionStore, RecoveryFlag, SessionStore};
