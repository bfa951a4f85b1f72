//! Test utilities for ring transport.
//!
//! In-memory implementations of the driven ports plus a guest-side driver
//! for the shared rings. Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use xs_01_ring_transport::test_utils::GuestEnd;
//! use xs_01_ring_transport::RingInterface;
//!
//! let iface = Arc::new(RingInterface::new());
//! let guest = GuestEnd::new(iface.clone());
//! assert_eq!(guest.send_request(b"ping"), 4);
//! ```

use crate::domain::RingInterface;
use crate::ports::{EventChannel, EventChannelError, ForeignMemoryMapper, MapError, MappedPage};
use parking_lot::Mutex;
use shared_types::{DomainId, EvtchnPort, FrameId};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// A heap-allocated page shared with a test's guest driver.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPage {
    iface: Arc<RingInterface>,
}

impl InMemoryPage {
    pub fn new() -> Self {
        Self {
            iface: Arc::new(RingInterface::new()),
        }
    }

    /// Handle for the guest side of the page.
    pub fn shared(&self) -> Arc<RingInterface> {
        self.iface.clone()
    }
}

impl MappedPage for InMemoryPage {
    fn interface(&self) -> &RingInterface {
        &self.iface
    }
}

/// Drives the guest half of a shared page: produces requests, consumes
/// responses, and can scribble hostile indices.
#[derive(Debug, Clone)]
pub struct GuestEnd {
    iface: Arc<RingInterface>,
}

impl GuestEnd {
    pub fn new(iface: Arc<RingInterface>) -> Self {
        Self { iface }
    }

    /// Queue request bytes; returns how many fit.
    pub fn send_request(&self, data: &[u8]) -> usize {
        let mut total = 0;
        while total < data.len() {
            match self.iface.request_ring().produce(&data[total..]) {
                Ok(0) | Err(_) => break,
                Ok(n) => total += n,
            }
        }
        total
    }

    /// Drain up to `max` response bytes.
    pub fn recv_response(&self, max: usize) -> Vec<u8> {
        let mut out = vec![0u8; max];
        let mut total = 0;
        while total < max {
            match self.iface.response_ring().consume(&mut out[total..]) {
                Ok(0) | Err(_) => break,
                Ok(n) => total += n,
            }
        }
        out.truncate(total);
        out
    }

    /// Overwrite the guest-owned response consumer index.
    pub fn set_response_consumer(&self, value: u32) {
        self.iface.response_ring().cons_cell().store(value, Ordering::Relaxed);
    }

    /// Overwrite the guest-owned request producer index.
    pub fn set_request_producer(&self, value: u32) {
        self.iface.request_ring().prod_cell().store(value, Ordering::Relaxed);
    }

    /// Shared page view.
    pub fn interface(&self) -> &RingInterface {
        &self.iface
    }
}

#[derive(Debug, Default)]
struct EventState {
    next_port: u32,
    bound: HashMap<EvtchnPort, (DomainId, EvtchnPort)>,
    unbound: Vec<EvtchnPort>,
    notified: Vec<EvtchnPort>,
    pending: VecDeque<EvtchnPort>,
    unmasked: Vec<EvtchnPort>,
    fail_bind: bool,
}

/// Event channel mock recording every call.
#[derive(Debug)]
pub struct MockEventChannel {
    state: Mutex<EventState>,
}

impl MockEventChannel {
    /// Local ports are handed out from 100 upwards.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(EventState {
                next_port: 100,
                ..Default::default()
            }),
        }
    }

    /// Make subsequent binds fail.
    pub fn set_fail_bind(&self, fail: bool) {
        self.state.lock().fail_bind = fail;
    }

    /// Queue an incoming event on `port`.
    pub fn raise(&self, port: EvtchnPort) {
        self.state.lock().pending.push_back(port);
    }

    pub fn notified(&self) -> Vec<EvtchnPort> {
        self.state.lock().notified.clone()
    }

    pub fn unbound(&self) -> Vec<EvtchnPort> {
        self.state.lock().unbound.clone()
    }

    pub fn unmasked(&self) -> Vec<EvtchnPort> {
        self.state.lock().unmasked.clone()
    }

    /// `(remote domain, remote port)` a local port is bound to.
    pub fn binding(&self, port: EvtchnPort) -> Option<(DomainId, EvtchnPort)> {
        self.state.lock().bound.get(&port).copied()
    }

    pub fn bound_count(&self) -> usize {
        self.state.lock().bound.len()
    }

    pub fn clear_notified(&self) {
        self.state.lock().notified.clear();
    }

    fn allocate(state: &mut EventState) -> EvtchnPort {
        let port = EvtchnPort(state.next_port);
        state.next_port += 1;
        port
    }
}

impl Default for MockEventChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl EventChannel for MockEventChannel {
    fn bind_interdomain(
        &self,
        remote: DomainId,
        remote_port: EvtchnPort,
    ) -> Result<EvtchnPort, EventChannelError> {
        let mut state = self.state.lock();
        if state.fail_bind {
            return Err(EventChannelError::BindFailed {
                domid: remote,
                port: remote_port,
            });
        }
        let port = Self::allocate(&mut state);
        state.bound.insert(port, (remote, remote_port));
        Ok(port)
    }

    fn bind_dom_exc_virq(&self) -> Result<EvtchnPort, EventChannelError> {
        let mut state = self.state.lock();
        let port = Self::allocate(&mut state);
        // A virq has no remote end.
        state.bound.insert(port, (DomainId::CONTROL, EvtchnPort::UNBOUND));
        Ok(port)
    }

    fn unbind(&self, port: EvtchnPort) -> Result<(), EventChannelError> {
        let mut state = self.state.lock();
        if state.bound.remove(&port).is_none() {
            return Err(EventChannelError::UnbindFailed(port));
        }
        state.unbound.push(port);
        Ok(())
    }

    fn notify(&self, port: EvtchnPort) {
        self.state.lock().notified.push(port);
    }

    fn pending(&self) -> Result<Option<EvtchnPort>, EventChannelError> {
        Ok(self.state.lock().pending.pop_front())
    }

    fn unmask(&self, port: EvtchnPort) -> Result<(), EventChannelError> {
        self.state.lock().unmasked.push(port);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MapperState {
    pages: HashMap<DomainId, Arc<RingInterface>>,
    frames: HashMap<DomainId, FrameId>,
    unmapped: usize,
    fail: bool,
}

/// Foreign mapper mock handing out fresh in-memory pages.
#[derive(Debug, Default)]
pub struct MockMapper {
    state: Mutex<MapperState>,
}

impl MockMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent maps fail.
    pub fn set_fail(&self, fail: bool) {
        self.state.lock().fail = fail;
    }

    /// Guest driver for the page last mapped for `domid`.
    pub fn guest(&self, domid: DomainId) -> Option<GuestEnd> {
        self.state.lock().pages.get(&domid).cloned().map(GuestEnd::new)
    }

    /// Frame last mapped for `domid`.
    pub fn frame_of(&self, domid: DomainId) -> Option<FrameId> {
        self.state.lock().frames.get(&domid).copied()
    }

    pub fn unmapped(&self) -> usize {
        self.state.lock().unmapped
    }
}

impl ForeignMemoryMapper for MockMapper {
    fn map(&self, domid: DomainId, frame: FrameId) -> Result<Box<dyn MappedPage>, MapError> {
        let mut state = self.state.lock();
        if state.fail {
            return Err(MapError::MapFailed { domid, frame });
        }
        let page = InMemoryPage::new();
        state.pages.insert(domid, page.shared());
        state.frames.insert(domid, frame);
        Ok(Box::new(page))
    }

    fn unmap(&self, page: Box<dyn MappedPage>) {
        drop(page);
        self.state.lock().unmapped += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_event_channel_allocates_ports() {
        let events = MockEventChannel::new();
        let a = events.bind_interdomain(DomainId(1), EvtchnPort(5)).unwrap();
        let b = events.bind_interdomain(DomainId(2), EvtchnPort(6)).unwrap();
        assert_ne!(a, b);
        assert_eq!(events.binding(a), Some((DomainId(1), EvtchnPort(5))));

        events.unbind(a).unwrap();
        assert!(events.unbind(a).is_err());
        assert_eq!(events.unbound(), vec![a]);
    }

    #[test]
    fn test_mock_event_channel_pending_queue() {
        let events = MockEventChannel::new();
        events.raise(EvtchnPort(7));
        assert_eq!(events.pending().unwrap(), Some(EvtchnPort(7)));
        assert_eq!(events.pending().unwrap(), None);
    }

    #[test]
    fn test_mock_mapper_shares_page_with_guest() {
        let mapper = MockMapper::new();
        let page = mapper.map(DomainId(4), FrameId(0x10)).unwrap();
        let guest = mapper.guest(DomainId(4)).unwrap();
        guest.send_request(b"hi");
        assert!(page.interface().request_ring().has_data());

        mapper.unmap(page);
        assert_eq!(mapper.unmapped(), 1);
    }

    #[test]
    fn test_mock_mapper_failure() {
        let mapper = MockMapper::new();
        mapper.set_fail(true);
        assert!(mapper.map(DomainId(4), FrameId(1)).is_err());
    }
}
