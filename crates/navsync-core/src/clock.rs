//! Millisecond time source.
//!
//! Every timestamp in the coordinator comes from a [`Clock`], so tests and
//! trace replays drive time explicitly with [`ManualClock`].

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Milliseconds since the clock's origin.
pub type Millis = u64;

pub trait Clock {
    fn now_ms(&self) -> Millis;
}

/// Monotonic wall clock, origin at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, ms: Millis) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    /// Jump to an absolute time. Going backwards is ignored.
    pub fn set(&self, ms: Millis) {
        if ms > self.now.get() {
            self.now.set(ms);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}
