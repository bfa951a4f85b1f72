//! Per-domain rate limit state and monotonic timestamps.

use serde::{Deserialize, Serialize};

/// Cap on the interval credited by a single update, in milliseconds.
///
/// Keeps `elapsed * rate` far from overflow for any configured rate.
pub const MAX_ELAPSED_MS: u64 = 1000 * 1000 * 1000;

/// Monotonic time in milliseconds since an arbitrary origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WrlTimestamp(pub u64);

impl WrlTimestamp {
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Whole seconds, used for log throttling.
    pub const fn as_secs(self) -> u64 {
        self.0 / 1000
    }

    /// Milliseconds since `earlier`, zero if the clock went backwards.
    pub fn millis_since(self, earlier: WrlTimestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Rate limit state carried by each domain record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrlAccount {
    /// Signed credit; negative means throttled.
    pub credit: i64,
    /// Last time credit was brought up to date.
    pub timestamp: WrlTimestamp,
    /// Whether "domain is affected" has been logged for this domain.
    pub delay_logged: bool,
}

impl WrlAccount {
    /// Whether the domain is currently throttled.
    pub fn is_throttled(&self) -> bool {
        self.credit < 0
    }
}

/// Result of charging a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// The write was not charged (exempt caller or limiter not in force).
    Exempt,
    /// Charged; credit is still non-negative.
    Charged,
    /// Charged; credit is now negative and the domain is throttled.
    Throttled,
}
