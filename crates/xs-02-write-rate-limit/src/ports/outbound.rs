//! # Driven Ports (Outbound SPI)

use crate::domain::WrlTimestamp;

/// Monotonic time source.
///
/// Enables deterministic testing by injecting controllable time sources.
/// Production uses `SystemMonotonicClock`; tests use `FixedTimeSource`.
pub trait MonotonicClock: Send + Sync {
    /// Current monotonic time.
    fn now(&self) -> WrlTimestamp;
}
