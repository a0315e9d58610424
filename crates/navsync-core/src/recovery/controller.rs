use tracing::info;

use super::store::RecoveryFlag;
use crate::types::ViewId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Flag set; the caller performs the reset steps.
    Started { safe_view: ViewId },
    /// The flag was already set, by this instance or another mount.
    Skipped,
}

/// Single-flight gate for loop recovery.
///
/// Owns the recovery flag and the reset parameters. The coordinator runs the
/// actual reset steps once `begin` says so.
#[derive(Debug)]
pub struct RecoveryController {
    flag: RecoveryFlag,
    safe_view: ViewId,
    stabilization_ms: u64,
    message: String,
    in_flight: bool,
}

impl RecoveryController {
    pub fn new(
        flag: RecoveryFlag,
        safe_view: ViewId,
        stabilization_ms: u64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            flag,
            safe_view,
            stabilization_ms,
            message: message.into(),
            in_flight: false,
        }
    }

    pub fn begin(&mut self) -> RecoveryOutcome {
        if self.in_flight || self.flag.is_set() {
            info!(
                event = "core.recovery.skipped",
                in_flight = self.in_flight,
                flag = self.flag.key()
            );
            return RecoveryOutcome::Skipped;
        }
        self.flag.set();
        self.in_flight = true;
        info!(
            event = "core.recovery.started",
            safe_view = %self.safe_view
        );
        RecoveryOutcome::Started {
            safe_view: self.safe_view.clone(),
        }
    }

    /// Stabilization elapsed: clear the flag and end the flight.
    pub fn finish(&mut self) {
        self.flag.clear();
        self.in_flight = false;
        info!(event = "core.recovery.completed");
    }

    /// Whether a flag left behind by an earlier mount needs a stabilization
    /// timer from this instance.
    pub fn resume(&mut self) -> bool {
        let pending = self.flag.is_set();
        if pending {
            info!(
                event = "core.recovery.resumed",
                flag = self.flag.key()
            );
        }
        pending
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn safe_view(&self) -> &ViewId {
        &self.safe_view
    }

    pub fn stabilization_ms(&self) -> u64 {
        self.stabilization_ms
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn flag(&self) -> &RecoveryFlag {
        &self.flag
    }

    pub fn take_degradation(&mut self) -> Option<super::StorageError> {
        self.flag.take_degradation()
    }
}
