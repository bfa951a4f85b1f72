//! # Core Identifiers
//!
//! Newtype wrappers for the numeric handles exchanged between the store,
//! the hypervisor interfaces and the guest domains.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Special domain id meaning "the calling domain itself".
pub const DOMID_SELF: u32 = 0x7FF0;

/// Numeric identifier of a guest execution context.
///
/// Assigned externally by the hypervisor and reused after a domain dies,
/// which is why ownership records also carry a generation count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DomainId(pub u32);

impl DomainId {
    /// The control domain.
    pub const CONTROL: DomainId = DomainId(0);

    /// Create a new domain id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw numeric value.
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Whether this is the `DOMID_SELF` alias.
    pub const fn is_self_alias(self) -> bool {
        self.0 == DOMID_SELF
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for DomainId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Machine frame (or grant) identifier backing a domain's shared ring page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameId(pub u64);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Event channel port number.
///
/// Local ports are allocated by the notification service when binding;
/// remote ports are declared by the peer domain. `0` means unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EvtchnPort(pub u32);

impl EvtchnPort {
    /// The unbound port.
    pub const UNBOUND: EvtchnPort = EvtchnPort(0);

    /// Whether the port refers to a live binding.
    pub const fn is_bound(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EvtchnPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a client connection owned by the dispatch layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Global store generation counter value.
pub type Generation = u64;

/// The originator of a request as seen by the domain layer.
///
/// Local socket connections carry no domain; requests arriving over a
/// domain's ring carry that domain's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// Connection the request arrived on.
    pub connection: ConnectionId,
    /// Domain owning the connection, `None` for local sockets.
    pub domid: Option<DomainId>,
    /// Whether the connection was opened with write access.
    pub can_write: bool,
    /// Whether the connection currently has a transaction open.
    pub in_transaction: bool,
}

impl Caller {
    /// A privileged local socket connection.
    pub fn local(connection: ConnectionId) -> Self {
        Self {
            connection,
            domid: None,
            can_write: true,
            in_transaction: false,
        }
    }

    /// A connection belonging to a domain.
    pub fn domain(connection: ConnectionId, domid: DomainId) -> Self {
        Self {
            connection,
            domid: Some(domid),
            can_write: true,
            in_transaction: false,
        }
    }

    /// Builder: mark the caller read-only.
    pub fn read_only(mut self) -> Self {
        self.can_write = false;
        self
    }

    /// Builder: mark the caller as inside a transaction.
    pub fn in_transaction(mut self) -> Self {
        self.in_transaction = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_id_display() {
        assert_eq!(DomainId::new(7).to_string(), "7");
        assert!(DomainId(DOMID_SELF).is_self_alias());
        assert!(!DomainId::CONTROL.is_self_alias());
    }

    #[test]
    fn test_frame_id_display_is_hex() {
        assert_eq!(FrameId(0x1234).to_string(), "0x1234");
    }

    #[test]
    fn test_port_bound() {
        assert!(!EvtchnPort::UNBOUND.is_bound());
        assert!(EvtchnPort(42).is_bound());
    }

    #[test]
    fn test_caller_builders() {
        let caller = Caller::domain(ConnectionId(3), DomainId(5))
            .read_only()
            .in_transaction();
        assert_eq!(caller.domid, Some(DomainId(5)));
        assert!(!caller.can_write);
        assert!(caller.in_transaction);
        assert_eq!(Caller::local(ConnectionId(1)).domid, None);
    }

    #[test]
    fn test_domain_id_serde() {
        let json = serde_json::to_string(&DomainId(9)).unwrap();
        assert_eq!(json, "9");
        let back: DomainId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DomainId(9));
    }
}
