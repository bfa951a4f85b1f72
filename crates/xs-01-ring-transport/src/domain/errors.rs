//! Ring protocol errors.

use crate::domain::RingIdx;
use thiserror::Error;

/// Errors raised while touching a shared ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// The peer published indices outside the valid window
    /// `0 <= prod - cons <= RING_CAPACITY`. Terminal for the connection.
    #[error("ring indices corrupted: cons={cons} prod={prod}")]
    Corrupted { cons: RingIdx, prod: RingIdx },
}
