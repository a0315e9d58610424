//! Refresh gating and the caller-supplied refresh seam.

pub mod errors;
pub mod throttle;
pub mod traits;

pub use errors::RefreshError;
pub use throttle::{
    DenyReason, RefreshDecision, RefreshThrottler, RefreshTicket, RefreshTrigger,
};
pub use traits::RefreshOperation;
