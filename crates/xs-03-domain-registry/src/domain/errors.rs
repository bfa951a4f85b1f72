//! Domain layer error types.

use shared_types::{DomainId, Errno};
use thiserror::Error;
use xs_01_ring_transport::{EventChannelError, MapError, RingError};

/// Failure of a domain layer operation.
///
/// Every variant maps to a POSIX code through [`DomainError::errno`]; the
/// dispatch layer sends that code back to the requesting connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The domain's ring indexes are out of range. Its connection is no
    /// longer serviced until it is introduced again.
    #[error("domain {domid}: ring corrupted ({source})")]
    ProtocolCorruption {
        domid: DomainId,
        #[source]
        source: RingError,
    },

    /// Mapping the ring page or binding its event channel failed.
    #[error("resource unavailable: {0}")]
    ResourceExhaustion(String),

    /// Malformed arguments or a conflicting registration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The caller may not perform this operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// No introduced domain with this id.
    #[error("domain {0} not found")]
    NotFound(DomainId),
}

impl DomainError {
    /// Error code reported to the requester.
    pub fn errno(&self) -> Errno {
        match self {
            DomainError::ProtocolCorruption { .. } => Errno::Eio,
            DomainError::ResourceExhaustion(_) => Errno::Enomem,
            DomainError::InvalidRequest(_) => Errno::Einval,
            DomainError::PermissionDenied(_) => Errno::Eacces,
            DomainError::NotFound(_) => Errno::Enoent,
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        DomainError::InvalidRequest(reason.into())
    }
}

impl From<MapError> for DomainError {
    fn from(err: MapError) -> Self {
        DomainError::ResourceExhaustion(err.to_string())
    }
}

impl From<EventChannelError> for DomainError {
    fn from(err: EventChannelError) -> Self {
        DomainError::ResourceExhaustion(err.to_string())
    }
}
