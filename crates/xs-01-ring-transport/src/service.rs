//! # Ring Transport Service
//!
//! Wires the ring view to the notification service: every completed read or
//! write is followed by a kick on the domain's local port so the guest
//! re-evaluates its side of the ring.

use crate::domain::{RingError, RingInterface};
use crate::ports::EventChannel;
use shared_types::EvtchnPort;
use std::sync::Arc;
use tracing::{debug, warn};

/// Byte mover between the store and one domain's shared page.
pub struct RingTransport {
    events: Arc<dyn EventChannel>,
}

impl RingTransport {
    /// Create a transport that kicks peers through `events`.
    pub fn new(events: Arc<dyn EventChannel>) -> Self {
        Self { events }
    }

    /// Write up to `data.len()` bytes to the response ring.
    ///
    /// Returns the number of bytes accepted; callers retry the remainder
    /// once the guest has consumed.
    pub fn write(
        &self,
        iface: &RingInterface,
        port: EvtchnPort,
        data: &[u8],
    ) -> Result<usize, RingError> {
        let written = iface.response_ring().produce(data).inspect_err(|err| {
            warn!(port = %port, error = %err, "Response ring corrupted");
        })?;

        debug!(port = %port, requested = data.len(), written, "Ring write");
        self.events.notify(port);
        Ok(written)
    }

    /// Read up to `buf.len()` bytes from the request ring.
    pub fn read(
        &self,
        iface: &RingInterface,
        port: EvtchnPort,
        buf: &mut [u8],
    ) -> Result<usize, RingError> {
        let read = iface.request_ring().consume(buf).inspect_err(|err| {
            warn!(port = %port, error = %err, "Request ring corrupted");
        })?;

        debug!(port = %port, requested = buf.len(), read, "Ring read");
        self.events.notify(port);
        Ok(read)
    }

    /// Write all of `data`, chunk by chunk, until the ring refuses more.
    ///
    /// Returns the total accepted. Each chunk re-reads the indices, so a
    /// guest consuming concurrently can make room mid-call.
    pub fn write_all_available(
        &self,
        iface: &RingInterface,
        port: EvtchnPort,
        data: &[u8],
    ) -> Result<usize, RingError> {
        let mut total = 0;
        while total < data.len() {
            let n = self.write(iface, port, &data[total..])?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }

    /// Kick a port without touching the rings.
    pub fn notify(&self, port: EvtchnPort) {
        self.events.notify(port);
    }
}
