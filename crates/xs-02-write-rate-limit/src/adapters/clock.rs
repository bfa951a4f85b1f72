use crate::domain::WrlTimestamp;
use crate::ports::MonotonicClock;
use std::time::Instant;

/// Production time source backed by `std::time::Instant`.
///
/// Milliseconds are counted from construction, which is all the limiter
/// needs: only differences between timestamps matter.
#[derive(Debug, Clone, Copy)]
pub struct SystemMonotonicClock {
    origin: Instant,
}

impl SystemMonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemMonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemMonotonicClock {
    fn now(&self) -> WrlTimestamp {
        let elapsed = self.origin.elapsed().as_millis();
        WrlTimestamp::from_millis(u64::try_from(elapsed).unwrap_or(u64::MAX))
    }
}
