//! # Ring Transport Subsystem (xs-01)
//!
//! Byte-exact transfer across the request/response rings of a domain's shared
//! page. The transport knows nothing about message framing; it moves as many
//! bytes as currently fit and tells the caller how many that was.
//!
//! ## Architecture
//!
//! - **Domain Layer:** shared page layout (`RingInterface`), index window
//!   validation and chunk arithmetic (`RingView`, `RingIndexes`)
//! - **Ports Layer:** the notification service (`EventChannel`) and the
//!   foreign memory mapper (`ForeignMemoryMapper`, `MappedPage`)
//! - **Service Layer:** `RingTransport`, which reads/writes a domain's rings
//!   and kicks the peer after publishing
//!
//! ## Hostile Peer
//!
//! The guest writes its own indices concurrently. Both indices are loaded
//! once, followed by an acquire fence, and validated before any byte is
//! touched; a window larger than the ring is reported as
//! `RingError::Corrupted` and nothing is copied.
//!
//! ## Example
//!
//! ```rust
//! use xs_01_ring_transport::{RingInterface, RING_CAPACITY};
//!
//! let iface = RingInterface::new();
//! let written = iface.response_ring().produce(&[7u8; 2000]).unwrap();
//! assert_eq!(written, RING_CAPACITY - 1);
//!
//! let mut buf = [0u8; 16];
//! let read = iface.response_ring().consume(&mut buf).unwrap();
//! assert_eq!(read, 16);
//! assert!(buf.iter().all(|b| *b == 7));
//! ```

pub mod domain;
pub mod ports;
pub mod service;

/// Mock adapters and a guest-side ring driver.
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use domain::{
    mask_idx, RingError, RingIdx, RingIndexes, RingInterface, RingView, PAGE_SIZE, PRODUCER_LIMIT,
    RING_CAPACITY,
};
pub use ports::{EventChannel, EventChannelError, ForeignMemoryMapper, MapError, MappedPage};
pub use service::RingTransport;
