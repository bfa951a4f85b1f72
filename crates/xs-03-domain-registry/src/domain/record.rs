//! # Domain Record
//!
//! One record per domain id. A record that has not completed introduction is
//! a placeholder: it exists only to pin the generation a domain id was first
//! seen at, and owns neither a ring mapping nor an event channel binding.

use shared_types::{ConnectionId, DomainId, EvtchnPort, FrameId, Generation};
use std::fmt;
use xs_01_ring_transport::{MappedPage, RingInterface};
use xs_02_write_rate_limit::WrlAccount;

/// How the ring page was obtained, which decides how it is released.
pub(crate) enum RingMapping {
    /// Mapped through the foreign memory mapper; handed back to it on retire.
    Foreign(Box<dyn MappedPage>),
    /// Supplied at bootstrap for the control domain; dropped on retire.
    Bootstrap(Box<dyn MappedPage>),
}

impl RingMapping {
    pub(crate) fn interface(&self) -> &RingInterface {
        match self {
            RingMapping::Foreign(page) | RingMapping::Bootstrap(page) => page.interface(),
        }
    }
}

/// Live connection state of an introduced domain.
pub(crate) struct DomainConnection {
    pub(crate) id: ConnectionId,
    pub(crate) mapping: RingMapping,
    /// Frame the ring page was mapped from; `None` for the bootstrap page.
    pub(crate) frame: Option<FrameId>,
    pub(crate) local_port: EvtchnPort,
    pub(crate) remote_port: EvtchnPort,
    /// Set after ring corruption; the connection is no longer serviced.
    pub(crate) ignored: bool,
    /// Domain whose implicit paths this connection acts for.
    pub(crate) target: Option<DomainId>,
}

/// Per-domain state.
pub struct DomainRecord {
    domid: DomainId,
    generation: Generation,
    path: String,
    shutdown: bool,
    pub(crate) conn: Option<DomainConnection>,
    pub(crate) entries: u32,
    pub(crate) watches: u32,
    pub(crate) wrl: WrlAccount,
}

impl DomainRecord {
    /// A placeholder stamped with `generation`.
    pub(crate) fn placeholder(domid: DomainId, generation: Generation, path: String) -> Self {
        Self {
            domid,
            generation,
            path,
            shutdown: false,
            conn: None,
            entries: 0,
            watches: 0,
            wrl: WrlAccount::default(),
        }
    }

    pub fn domid(&self) -> DomainId {
        self.domid
    }

    /// Global generation at the time the record was allocated.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Home path of the domain in the store.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether registration has completed.
    pub fn is_introduced(&self) -> bool {
        self.conn.is_some()
    }

    /// Whether the domain was seen crashed or shut down.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    pub(crate) fn set_shutdown(&mut self, shutdown: bool) {
        self.shutdown = shutdown;
    }

    pub fn connection(&self) -> Option<ConnectionId> {
        self.conn.as_ref().map(|c| c.id)
    }

    pub fn frame(&self) -> Option<FrameId> {
        self.conn.as_ref().and_then(|c| c.frame)
    }

    /// Local event channel port, `UNBOUND` if none.
    pub fn local_port(&self) -> EvtchnPort {
        self.conn
            .as_ref()
            .map_or(EvtchnPort::UNBOUND, |c| c.local_port)
    }

    /// Remote port as last declared by the peer.
    pub fn remote_port(&self) -> EvtchnPort {
        self.conn
            .as_ref()
            .map_or(EvtchnPort::UNBOUND, |c| c.remote_port)
    }

    pub fn is_ignored(&self) -> bool {
        self.conn.as_ref().is_some_and(|c| c.ignored)
    }

    pub fn target(&self) -> Option<DomainId> {
        self.conn.as_ref().and_then(|c| c.target)
    }

    /// Store entries owned by this domain.
    pub fn entry_count(&self) -> u32 {
        self.entries
    }

    /// Watches registered by this domain.
    pub fn watch_count(&self) -> u32 {
        self.watches
    }

    pub fn wrl(&self) -> &WrlAccount {
        &self.wrl
    }

    pub(crate) fn interface(&self) -> Option<&RingInterface> {
        self.conn.as_ref().map(|c| c.mapping.interface())
    }
}

impl fmt::Debug for DomainRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainRecord")
            .field("domid", &self.domid)
            .field("generation", &self.generation)
            .field("introduced", &self.is_introduced())
            .field("shutdown", &self.shutdown)
            .field("port", &self.local_port())
            .field("entries", &self.entries)
            .field("watches", &self.watches)
            .field("credit", &self.wrl.credit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_owns_nothing() {
        let record = DomainRecord::placeholder(DomainId(9), 17, "/local/domain/9".into());
        assert!(!record.is_introduced());
        assert_eq!(record.generation(), 17);
        assert_eq!(record.local_port(), EvtchnPort::UNBOUND);
        assert_eq!(record.frame(), None);
        assert!(record.interface().is_none());
        assert!(!record.is_ignored());
    }
}
