//! Time source for settlement timestamps.
//!
//! The processor never reads the wall clock directly. Embedding it in a
//! replicated state machine means supplying the block / log timestamp
//! through [`FixedClock`] so every replica stamps records identically.

use chrono::{DateTime, Utc};

/// Supplies the timestamp stamped on settlement records.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
