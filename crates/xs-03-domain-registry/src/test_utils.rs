//! Test utilities for the domain registry.
//!
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```ignore
//! use xs_03_domain_registry::test_utils::{dom0, TestHarness};
//! use xs_03_domain_registry::DomainAdminApi;
//! use shared_types::{DomainId, EvtchnPort, FrameId};
//!
//! let harness = TestHarness::new();
//! let mut registry = harness.registry();
//! harness.domain_info.set_running(DomainId(5));
//!
//! registry
//!     .introduce(&dom0(), DomainId(5), FrameId(0x1000), EvtchnPort(3))
//!     .unwrap();
//! assert!(registry.is_introduced(DomainId(5)));
//! ```

use crate::config::DomainLayerConfig;
use crate::domain::DomainInfo;
use crate::ports::{ConnectionHooks, DomainInfoSource};
use crate::service::{DomainRegistry, RegistryDependencies};
use parking_lot::Mutex;
use shared_bus::{DomainEvent, EventFilter, InMemoryEventBus, Subscription};
use shared_types::{Caller, ConnectionId, DomainId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use xs_01_ring_transport::test_utils::{MockEventChannel, MockMapper};
use xs_02_write_rate_limit::FixedTimeSource;

/// Connection id the harness uses for the local privileged socket.
pub const DOM0_SOCKET: ConnectionId = ConnectionId(1);

/// Privileged local caller.
pub fn dom0() -> Caller {
    Caller::local(DOM0_SOCKET)
}

/// Hypervisor domain-info table.
#[derive(Debug, Default)]
pub struct MockDomainInfo {
    domains: Mutex<HashMap<DomainId, DomainInfo>>,
    queries: AtomicUsize,
}

impl MockDomainInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, domid: DomainId, info: DomainInfo) {
        self.domains.lock().insert(domid, info);
    }

    pub fn set_running(&self, domid: DomainId) {
        self.set(domid, DomainInfo::running());
    }

    pub fn set_shutdown(&self, domid: DomainId) {
        self.update(domid, |info| info.shutdown = true);
    }

    pub fn set_crashed(&self, domid: DomainId) {
        self.update(domid, |info| info.crashed = true);
    }

    pub fn set_dying(&self, domid: DomainId) {
        self.update(domid, |info| info.dying = true);
    }

    /// The hypervisor forgets the domain entirely.
    pub fn remove(&self, domid: DomainId) {
        self.domains.lock().remove(&domid);
    }

    /// Number of lookups served.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn update(&self, domid: DomainId, f: impl FnOnce(&mut DomainInfo)) {
        f(self.domains.lock().entry(domid).or_default());
    }
}

impl DomainInfoSource for MockDomainInfo {
    fn domain_info(&self, domid: DomainId) -> Option<DomainInfo> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.domains.lock().get(&domid).copied()
    }
}

/// One call made through [`ConnectionHooks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookCall {
    Opened(ConnectionId, DomainId),
    Reset(ConnectionId),
    WatchesCleared(ConnectionId),
    Closed(ConnectionId),
    TransactionInc(ConnectionId, DomainId),
    TransactionDec(ConnectionId, DomainId),
}

/// Connection hooks that only record.
#[derive(Debug, Default)]
pub struct RecordingConnectionHooks {
    calls: Mutex<Vec<HookCall>>,
}

impl RecordingConnectionHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: HookCall) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: HookCall) {
        self.calls.lock().push(call);
    }
}

impl ConnectionHooks for RecordingConnectionHooks {
    fn connection_opened(&self, conn: ConnectionId, domid: DomainId) {
        self.record(HookCall::Opened(conn, domid));
    }

    fn reset_connection(&self, conn: ConnectionId) {
        self.record(HookCall::Reset(conn));
    }

    fn delete_watches_and_transactions(&self, conn: ConnectionId) {
        self.record(HookCall::WatchesCleared(conn));
    }

    fn connection_closed(&self, conn: ConnectionId) {
        self.record(HookCall::Closed(conn));
    }

    fn transaction_entry_inc(&self, conn: ConnectionId, owner: DomainId) {
        self.record(HookCall::TransactionInc(conn, owner));
    }

    fn transaction_entry_dec(&self, conn: ConnectionId, owner: DomainId) {
        self.record(HookCall::TransactionDec(conn, owner));
    }
}

/// Every mock a registry needs, kept reachable for assertions.
pub struct TestHarness {
    pub events: Arc<MockEventChannel>,
    pub mapper: Arc<MockMapper>,
    pub domain_info: Arc<MockDomainInfo>,
    pub hooks: Arc<RecordingConnectionHooks>,
    pub bus: Arc<InMemoryEventBus>,
    pub clock: Arc<FixedTimeSource>,
    watcher: Mutex<Subscription>,
}

impl TestHarness {
    /// Clock starts at one second so timestamps are never zero.
    pub fn new() -> Self {
        let bus = Arc::new(InMemoryEventBus::new());
        let watcher = Mutex::new(bus.subscribe(EventFilter::all()));
        Self {
            events: Arc::new(MockEventChannel::new()),
            mapper: Arc::new(MockMapper::new()),
            domain_info: Arc::new(MockDomainInfo::new()),
            hooks: Arc::new(RecordingConnectionHooks::new()),
            bus,
            clock: Arc::new(FixedTimeSource::new(1_000)),
            watcher,
        }
    }

    pub fn dependencies(&self) -> RegistryDependencies {
        RegistryDependencies {
            events: self.events.clone(),
            mapper: self.mapper.clone(),
            domain_info: self.domain_info.clone(),
            hooks: self.hooks.clone(),
            publisher: self.bus.clone(),
            clock: self.clock.clone(),
        }
    }

    /// Registry with default configuration.
    pub fn registry(&self) -> DomainRegistry {
        self.registry_with(DomainLayerConfig::default())
    }

    pub fn registry_with(&self, config: DomainLayerConfig) -> DomainRegistry {
        DomainRegistry::new(config, self.dependencies())
    }

    /// Special-node events fired since the last call.
    pub fn fired(&self) -> Vec<DomainEvent> {
        self.watcher.lock().drain()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
