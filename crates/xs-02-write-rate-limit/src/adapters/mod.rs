//! # Adapters
//!
//! - `SystemMonotonicClock` - production time source

mod clock;

pub use clock::SystemMonotonicClock;
