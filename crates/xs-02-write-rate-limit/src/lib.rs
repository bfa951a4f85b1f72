//! # Write Rate Limit Subsystem (xs-02)
//!
//! Bounds how fast each guest domain may commit write transactions while
//! letting domains share slack through a global reserve.
//!
//! ## Model
//!
//! - Every domain holds a signed credit. Time accrues credit at
//!   `rate / live_domains` per second; each write costs `write_cost`.
//! - A domain may save at most `domain_burst`; anything above is handed to
//!   the reserve, which itself saturates at `global_burst`.
//! - A domain that went negative may borrow from the reserve back up to
//!   zero, never further, and never below the reserve's floor of zero.
//! - New domains are seeded with up to `domain_burst` from the reserve,
//!   which may dip to `-new_domains_burst` to pay for them.
//! - Negative credit means throttled: the event loop stops reading the
//!   domain's ring and sleeps until the credit would reach zero.
//!
//! All arithmetic is integer fixed point; see `WrlConfig` for units.
//!
//! ## Architecture
//!
//! - **Domain Layer:** `WrlAccount`, `WrlTimestamp`, `xfer_credit`
//! - **Ports Layer:** `MonotonicClock`
//! - **Service Layer:** `WriteRateLimiter`
//! - **Adapters:** `SystemMonotonicClock`

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

/// Test utilities (FixedTimeSource).
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::SystemMonotonicClock;
pub use config::WrlConfig;
pub use domain::{xfer_credit, DebitOutcome, WrlAccount, WrlTimestamp, MAX_ELAPSED_MS};
pub use ports::MonotonicClock;
pub use service::WriteRateLimiter;

#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::FixedTimeSource;
