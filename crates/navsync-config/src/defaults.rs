//! Built-in fallback values.
//!
//! These are the thresholds observed in the deployed portal. They have no
//! documented derivation and are meant to be tuned through config files.

pub const HISTORY_CAPACITY: usize = 20;

pub const QUERY_PARAM: &str = "tab";
pub const DEFAULT_VIEW: &str = "time-off";
pub const DEBOUNCE_MS: u64 = 500;

pub const LOOP_WINDOW_MS: u64 = 5_000;
pub const WARNING_THRESHOLD: usize = 5;
pub const EMERGENCY_THRESHOLD: usize = 7;

pub const MANUAL_MIN_INTERVAL_MS: u64 = 3_000;
pub const AUTOMATIC_MIN_INTERVAL_MS: u64 = 8 * 60 * 1_000;
pub const AUTO_REFRESH_ON_ATTACH: bool = true;
pub const RETRY_DELAY_MS: u64 = 5_000;
pub const MAX_RETRIES: u32 = 1;

pub const TOAST_MIN_SPACING_MS: u64 = 10_000;
pub const SUCCESS_TTL_MS: u64 = 3_000;
pub const INFO_TTL_MS: u64 = 3_000;
pub const WARNING_TTL_MS: u64 = 4_000;
pub const ERROR_TTL_MS: u64 = 5_000;

pub const STABILIZATION_MS: u64 = 10_000;
pub const RECOVERY_FLAG_KEY: &str = "navsync.recovery";
pub const RECOVERY_MESSAGE: &str = "Navigation was reset after repeated view changes";
