//! Time sources for ledger operations
//!
//! Completion timestamps come from the host's notion of "now". Production
//! code reads the system clock; tests and replays pin the time explicitly.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current Unix timestamp in seconds
pub trait Clock: Send + Sync {
    /// Current time as Unix seconds
    fn now(&self) -> i64;
}

/// Wall-clock time via `chrono`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Manually driven clock
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    /// Create a clock pinned at the given Unix timestamp
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Move the clock to a new timestamp
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Advance the clock by `seconds`
    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
