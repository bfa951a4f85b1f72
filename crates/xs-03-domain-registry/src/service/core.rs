use crate::config::{DomainLayerConfig, RegistryConfig};
use crate::domain::{DomainConnection, DomainError, DomainRecord, RingMapping};
use crate::ports::{ConnectionHooks, DomainAdminApi, DomainInfoSource};
use crate::service::special::SpecialNodePerms;
use crate::sweeper::CleanupSweeper;
use shared_bus::{DomainEvent, EventPublisher};
use shared_types::{
    Caller, ConnectionId, DomainId, EvtchnPort, FrameId, Generation, NodePerms, PermFlags,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use xs_01_ring_transport::{EventChannel, ForeignMemoryMapper, RingTransport};
use xs_02_write_rate_limit::{MonotonicClock, WriteRateLimiter};
use xs_telemetry::metrics::{DOMAINS_INTRODUCED, DOMAINS_RELEASED};

/// Connection ids handed to domains start here. Socket connections numbered
/// by the dispatch layer stay below.
pub const FIRST_DOMAIN_CONNECTION: u64 = 1 << 32;

/// Collaborators the registry drives.
#[derive(Clone)]
pub struct RegistryDependencies {
    pub events: Arc<dyn EventChannel>,
    pub mapper: Arc<dyn ForeignMemoryMapper>,
    pub domain_info: Arc<dyn DomainInfoSource>,
    pub hooks: Arc<dyn ConnectionHooks>,
    pub publisher: Arc<dyn EventPublisher>,
    pub clock: Arc<dyn MonotonicClock>,
}

/// Registry of guest domains.
pub struct DomainRegistry {
    pub(crate) config: RegistryConfig,
    pub(crate) domains: BTreeMap<DomainId, DomainRecord>,
    /// Global store generation; records are stamped with it on allocation.
    pub(crate) generation: Generation,
    pub(crate) next_connection: u64,
    pub(crate) virq_port: Option<EvtchnPort>,
    pub(crate) special: SpecialNodePerms,
    pub(crate) wrl: WriteRateLimiter,
    pub(crate) transport: RingTransport,
    pub(crate) sweeper: CleanupSweeper,
    pub(crate) events: Arc<dyn EventChannel>,
    pub(crate) mapper: Arc<dyn ForeignMemoryMapper>,
    pub(crate) domain_info: Arc<dyn DomainInfoSource>,
    pub(crate) hooks: Arc<dyn ConnectionHooks>,
    pub(crate) publisher: Arc<dyn EventPublisher>,
    pub(crate) clock: Arc<dyn MonotonicClock>,
}

impl DomainRegistry {
    pub fn new(config: DomainLayerConfig, deps: RegistryDependencies) -> Self {
        Self {
            config: config.registry,
            domains: BTreeMap::new(),
            generation: 0,
            next_connection: FIRST_DOMAIN_CONNECTION,
            virq_port: None,
            special: SpecialNodePerms::default(),
            wrl: WriteRateLimiter::with_config(config.wrl),
            transport: RingTransport::new(Arc::clone(&deps.events)),
            sweeper: CleanupSweeper::new(),
            events: deps.events,
            mapper: deps.mapper,
            domain_info: deps.domain_info,
            hooks: deps.hooks,
            publisher: deps.publisher,
            clock: deps.clock,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn rate_limiter(&self) -> &WriteRateLimiter {
        &self.wrl
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Introduced record for `domid`.
    pub fn lookup(&self, domid: DomainId) -> Option<&DomainRecord> {
        self.domains.get(&domid).filter(|r| r.is_introduced())
    }

    /// Whether any record, placeholder or not, exists for `domid`.
    pub fn contains(&self, domid: DomainId) -> bool {
        self.domains.contains_key(&domid)
    }

    /// Number of introduced domains.
    pub fn introduced_count(&self) -> usize {
        self.domains.values().filter(|r| r.is_introduced()).count()
    }

    /// Domain whose local port is `port`.
    pub fn domain_by_port(&self, port: EvtchnPort) -> Option<DomainId> {
        if !port.is_bound() {
            return None;
        }
        self.domains
            .values()
            .find(|r| r.local_port() == port)
            .map(DomainRecord::domid)
    }

    /// Domain whose connection is `conn`.
    pub fn domain_by_connection(&self, conn: ConnectionId) -> Option<DomainId> {
        self.domains
            .values()
            .find(|r| r.connection() == Some(conn))
            .map(DomainRecord::domid)
    }

    /// Domain `domid`'s connection acts for, if set.
    pub fn target_of(&self, domid: DomainId) -> Option<DomainId> {
        self.lookup(domid).and_then(DomainRecord::target)
    }

    /// Path that relative paths from `caller` resolve against.
    pub fn get_implicit_path(&self, caller: &Caller) -> String {
        match caller.domid.and_then(|domid| self.domains.get(&domid)) {
            Some(record) => record.path().to_string(),
            None => self.get_domain_path(DomainId::CONTROL),
        }
    }

    // =========================================================================
    // GENERATIONS
    // =========================================================================

    pub fn current_generation(&self) -> Generation {
        self.generation
    }

    /// Advance the global generation. Called by the store on every commit.
    pub fn bump_generation(&mut self) -> Generation {
        self.generation += 1;
        self.generation
    }

    /// Generation of `domid`.
    ///
    /// A domain unknown to the registry but reported by the hypervisor is
    /// given a placeholder stamped with the current generation.
    pub fn generation_of(&mut self, domid: DomainId) -> Result<Generation, DomainError> {
        if let Some(record) = self.domains.get(&domid) {
            return Ok(record.generation());
        }
        if self.domain_info.domain_info(domid).is_none() {
            return Err(DomainError::NotFound(domid));
        }
        Ok(self.allocate(domid).generation())
    }

    /// Whether `domid` still owns an entry written at `node_generation`.
    ///
    /// A known domain owns it if it is not younger than the entry. An
    /// unknown domain that the hypervisor no longer reports does not; one it
    /// does report is pinned with a placeholder and does.
    pub fn check_domain_generation(&mut self, domid: DomainId, node_generation: Generation) -> bool {
        if let Some(record) = self.domains.get(&domid) {
            return record.generation() <= node_generation;
        }
        if self.domain_info.domain_info(domid).is_none() {
            return false;
        }
        self.allocate(domid);
        true
    }

    /// Strip permissions that refer to departed domains.
    ///
    /// A stale owner is replaced by the privileged domain; other stale
    /// entries are flagged `IGNORE` so a new domain reusing the id does not
    /// inherit them.
    pub fn adjust_node_perms(
        &mut self,
        perms: &mut NodePerms,
        node_generation: Generation,
    ) -> Result<(), DomainError> {
        let Some(owner) = perms.owner() else {
            return Err(DomainError::invalid("node has an empty permission list"));
        };

        if !self.check_domain_generation(owner, node_generation) {
            debug!(owner = %owner, to = %self.config.priv_domid, "Reassigning orphaned node");
            perms.entries[0].id = self.config.priv_domid;
        }

        for entry in perms.entries.iter_mut().skip(1) {
            if entry.perms.contains(PermFlags::IGNORE) {
                continue;
            }
            if !self.check_domain_generation(entry.id, node_generation) {
                entry.perms |= PermFlags::IGNORE;
            }
        }
        Ok(())
    }

    // =========================================================================
    // RECORD LIFECYCLE
    // =========================================================================

    pub(crate) fn allocate(&mut self, domid: DomainId) -> &mut DomainRecord {
        let generation = self.generation;
        let path = self.get_domain_path(domid);
        self.domains.entry(domid).or_insert_with(|| {
            debug!(domid = %domid, generation, "Domain record allocated");
            DomainRecord::placeholder(domid, generation, path)
        })
    }

    /// Attach a freshly bound connection to `domid`'s record, creating the
    /// record if needed, and seed its rate limit account.
    pub(crate) fn install_connection(
        &mut self,
        domid: DomainId,
        mapping: RingMapping,
        frame: Option<FrameId>,
        local_port: EvtchnPort,
        remote_port: EvtchnPort,
    ) -> ConnectionId {
        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;
        let now = self.clock.now();

        self.allocate(domid);
        if let Some(record) = self.domains.get_mut(&domid) {
            record.set_shutdown(false);
            record.entries = 0;
            record.watches = 0;
            self.wrl.domain_created(&mut record.wrl, now);
            record.conn = Some(DomainConnection {
                id,
                mapping,
                frame,
                local_port,
                remote_port,
                ignored: false,
                target: None,
            });
        }

        self.hooks.connection_opened(id, domid);
        DOMAINS_INTRODUCED.inc();
        id
    }

    /// First introduction: map, bind, install, announce.
    pub(crate) fn connect(
        &mut self,
        domid: DomainId,
        frame: FrameId,
        remote_port: EvtchnPort,
    ) -> Result<ConnectionId, DomainError> {
        let page = self.mapper.map(domid, frame)?;
        let local_port = match self.events.bind_interdomain(domid, remote_port) {
            Ok(port) => port,
            Err(err) => {
                self.mapper.unmap(page);
                return Err(err.into());
            }
        };

        let conn = self.install_connection(
            domid,
            RingMapping::Foreign(page),
            Some(frame),
            local_port,
            remote_port,
        );
        self.publisher.publish(DomainEvent::Introduced(domid));

        info!(
            domid = %domid,
            frame = %frame,
            port = %local_port,
            remote_port = %remote_port,
            "Domain introduced"
        );
        Ok(conn)
    }

    /// Re-introduction of a live domain over the same page from another
    /// connection: replace the event channel binding only.
    pub(crate) fn rebind(
        &mut self,
        caller: &Caller,
        domid: DomainId,
        frame: FrameId,
        remote_port: EvtchnPort,
    ) -> Result<ConnectionId, DomainError> {
        let conn = self
            .domains
            .get_mut(&domid)
            .and_then(|r| r.conn.as_mut())
            .ok_or(DomainError::NotFound(domid))?;

        if conn.frame != Some(frame) || conn.id == caller.connection {
            return Err(DomainError::invalid(format!(
                "domain {domid} already introduced"
            )));
        }

        if conn.local_port.is_bound() {
            if let Err(err) = self.events.unbind(conn.local_port) {
                warn!(domid = %domid, port = %conn.local_port, error = %err, "Unbinding port failed");
            }
        }
        conn.local_port = match self.events.bind_interdomain(domid, remote_port) {
            Ok(port) => port,
            Err(err) => {
                warn!(domid = %domid, error = %err, "Rebinding event channel failed");
                EvtchnPort::UNBOUND
            }
        };
        conn.remote_port = remote_port;
        conn.ignored = false;

        info!(domid = %domid, port = %conn.local_port, "Domain event channel rebound");
        Ok(conn.id)
    }

    /// Drop per-connection state and restart the rings from zero.
    pub(crate) fn reset_connection_state(&mut self, domid: DomainId) {
        if let Some(conn) = self.domains.get(&domid).and_then(|r| r.conn.as_ref()) {
            self.hooks.reset_connection(conn.id);
            conn.mapping.interface().reset_indexes();
        }
    }

    /// Tear down `domid`. Returns whether a record existed.
    pub(crate) fn retire(&mut self, domid: DomainId) -> bool {
        let Some(mut record) = self.domains.remove(&domid) else {
            return false;
        };
        let Some(conn) = record.conn.take() else {
            debug!(domid = %domid, "Placeholder discarded");
            return true;
        };

        if conn.local_port.is_bound() {
            if let Err(err) = self.events.unbind(conn.local_port) {
                warn!(domid = %domid, port = %conn.local_port, error = %err, "Unbinding port failed");
            }
        }
        match conn.mapping {
            RingMapping::Foreign(page) => self.mapper.unmap(page),
            RingMapping::Bootstrap(page) => drop(page),
        }
        self.publisher.publish(DomainEvent::Released(Some(domid)));
        self.wrl.domain_destroyed(&mut record.wrl);

        for other in self.domains.values_mut() {
            if let Some(other_conn) = other.conn.as_mut() {
                if other_conn.target == Some(domid) {
                    other_conn.target = None;
                }
            }
        }
        self.hooks.connection_closed(conn.id);

        DOMAINS_INTRODUCED.dec();
        DOMAINS_RELEASED.inc();
        info!(domid = %domid, conn = %conn.id, "Domain released");
        true
    }
}

pub(crate) fn introduced_mut(
    domains: &mut BTreeMap<DomainId, DomainRecord>,
    domid: DomainId,
) -> Option<&mut DomainRecord> {
    domains.get_mut(&domid).filter(|r| r.is_introduced())
}
