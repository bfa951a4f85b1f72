//! # Driven Ports (Outbound SPI)
//!
//! Interfaces to the hypervisor primitives this subsystem relies on. Their
//! implementations live outside the workspace; the `test-utils` feature
//! provides in-memory mocks.

use crate::domain::RingInterface;
use shared_types::{DomainId, EvtchnPort, FrameId};
use thiserror::Error;

/// Errors from the notification service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventChannelError {
    /// Binding to the remote port failed.
    #[error("failed to bind to domain {domid} port {port}")]
    BindFailed { domid: DomainId, port: EvtchnPort },

    /// Unbinding a local port failed.
    #[error("failed to unbind port {0}")]
    UnbindFailed(EvtchnPort),

    /// The event device could not be read or written.
    #[error("event device error: {0}")]
    Device(String),
}

/// Asynchronous, edge-triggered notification service.
///
/// Notifications are coalesced: several `notify` calls may produce a single
/// wake-up on the other side, so receivers must re-check state rather than
/// count edges.
pub trait EventChannel: Send + Sync {
    /// Bind a fresh local port to `remote_port` of domain `remote`.
    fn bind_interdomain(
        &self,
        remote: DomainId,
        remote_port: EvtchnPort,
    ) -> Result<EvtchnPort, EventChannelError>;

    /// Bind the shared domain-exception virtual interrupt.
    fn bind_dom_exc_virq(&self) -> Result<EvtchnPort, EventChannelError>;

    /// Release a local port.
    fn unbind(&self, port: EvtchnPort) -> Result<(), EventChannelError>;

    /// Kick the remote end. Fire-and-forget, never blocks.
    fn notify(&self, port: EvtchnPort);

    /// Next port with a pending event, if any.
    fn pending(&self) -> Result<Option<EvtchnPort>, EventChannelError>;

    /// Re-enable delivery on a port after handling it.
    fn unmask(&self, port: EvtchnPort) -> Result<(), EventChannelError>;
}

/// Errors from the foreign memory mapper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// The frame could not be mapped (bad frame, domain gone, no memory).
    #[error("failed to map frame {frame} of domain {domid}")]
    MapFailed { domid: DomainId, frame: FrameId },
}

/// A mapped shared page.
pub trait MappedPage: Send + Sync {
    /// Ring layout view over the page.
    fn interface(&self) -> &RingInterface;
}

/// Maps a foreign domain's ring page into our address space.
pub trait ForeignMemoryMapper: Send + Sync {
    /// Map `frame` of `domid` read/write.
    fn map(&self, domid: DomainId, frame: FrameId) -> Result<Box<dyn MappedPage>, MapError>;

    /// Unmap a page previously returned by `map`.
    fn unmap(&self, page: Box<dyn MappedPage>);
}
