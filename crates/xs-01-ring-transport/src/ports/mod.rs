//! Ports module for Ring Transport
//!
//! Driven ports (SPI) the host must implement: the notification service and
//! the foreign memory mapper.

pub mod outbound;

pub use outbound::{EventChannel, EventChannelError, ForeignMemoryMapper, MapError, MappedPage};
