use crate::domain::{is_unprivileged, DomainConnection, DomainError};
use crate::service::DomainRegistry;
use shared_types::DomainId;
use tracing::warn;
use xs_01_ring_transport::RingError;
use xs_telemetry::metrics::RING_CORRUPTIONS;

impl DomainRegistry {
    /// Whether the domain has request bytes the store should read now.
    ///
    /// Throttled unprivileged domains are not read until their credit
    /// recovers.
    pub fn can_read(&self, domid: DomainId) -> bool {
        let Some(record) = self.lookup(domid) else {
            return false;
        };
        if is_unprivileged(domid, self.config.priv_domid) && record.wrl().is_throttled() {
            return false;
        }
        match (&record.conn, record.interface()) {
            (Some(conn), Some(iface)) if !conn.ignored => iface.request_ring().has_data(),
            _ => false,
        }
    }

    /// Whether the response ring has room.
    ///
    /// Corrupted response indices read as writable; the next `write` then
    /// quarantines the connection.
    pub fn can_write(&self, domid: DomainId) -> bool {
        let Some(record) = self.lookup(domid) else {
            return false;
        };
        match (&record.conn, record.interface()) {
            (Some(conn), Some(iface)) if !conn.ignored => !iface.response_ring().is_full(),
            _ => false,
        }
    }

    /// Read request bytes from the domain's ring.
    ///
    /// An ignored connection transfers nothing. Corruption quarantines the
    /// connection.
    pub fn read(&mut self, domid: DomainId, buf: &mut [u8]) -> Result<usize, DomainError> {
        let conn = self.live_connection(domid)?;
        if conn.ignored {
            return Ok(0);
        }
        let result = self
            .transport
            .read(conn.mapping.interface(), conn.local_port, buf);
        self.ring_result(domid, result)
    }

    /// Write response bytes to the domain's ring.
    pub fn write(&mut self, domid: DomainId, data: &[u8]) -> Result<usize, DomainError> {
        let conn = self.live_connection(domid)?;
        if conn.ignored {
            return Ok(0);
        }
        let result = self
            .transport
            .write(conn.mapping.interface(), conn.local_port, data);
        self.ring_result(domid, result)
    }

    fn live_connection(&self, domid: DomainId) -> Result<&DomainConnection, DomainError> {
        self.domains
            .get(&domid)
            .and_then(|r| r.conn.as_ref())
            .ok_or(DomainError::NotFound(domid))
    }

    fn ring_result(
        &mut self,
        domid: DomainId,
        result: Result<usize, RingError>,
    ) -> Result<usize, DomainError> {
        result.map_err(|source| {
            self.quarantine(domid);
            DomainError::ProtocolCorruption { domid, source }
        })
    }

    /// Stop servicing a connection whose peer corrupted the ring.
    fn quarantine(&mut self, domid: DomainId) {
        let Some(conn) = self.domains.get_mut(&domid).and_then(|r| r.conn.as_mut()) else {
            return;
        };
        if conn.ignored {
            return;
        }
        conn.ignored = true;
        self.hooks.reset_connection(conn.id);
        RING_CORRUPTIONS.inc();
        warn!(domid = %domid, conn = %conn.id, "Ring corrupted, ignoring connection");
    }
}
