//! Test utilities for write rate limiting.
//!
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```ignore
//! use xs_02_write_rate_limit::{FixedTimeSource, MonotonicClock};
//!
//! let clock = FixedTimeSource::new(1000);
//! clock.advance(250);
//! assert_eq!(clock.now().as_millis(), 1250);
//! ```

use crate::domain::WrlTimestamp;
use crate::ports::MonotonicClock;
use std::sync::atomic::{AtomicU64, Ordering};

/// A time source that only moves when told to.
#[derive(Debug, Default)]
pub struct FixedTimeSource {
    millis: AtomicU64,
}

impl FixedTimeSource {
    /// Create a time source fixed at `millis`.
    pub fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    /// Move time forward.
    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl MonotonicClock for FixedTimeSource {
    fn now(&self) -> WrlTimestamp {
        WrlTimestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}
