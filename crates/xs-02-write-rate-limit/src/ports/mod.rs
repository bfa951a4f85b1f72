//! Ports module for Write Rate Limiting

pub mod outbound;

pub use outbound::MonotonicClock;
