//! Domain layer: records, errors and the pure helpers the registry uses.

pub mod errors;
pub mod record;

pub use errors::DomainError;
pub use record::DomainRecord;

pub(crate) use record::{DomainConnection, RingMapping};

use shared_types::DomainId;

/// Domain info as reported by the hypervisor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainInfo {
    pub crashed: bool,
    pub shutdown: bool,
    /// Being destroyed; its connection must be torn down.
    pub dying: bool,
}

impl DomainInfo {
    /// A healthy running domain.
    pub const fn running() -> Self {
        Self {
            crashed: false,
            shutdown: false,
            dying: false,
        }
    }

    /// Whether the domain stopped running, for good or ill.
    pub const fn is_stopped(&self) -> bool {
        self.crashed || self.shutdown
    }
}

/// Whether `domid` is subject to quotas and rate-limit read gating.
pub fn is_unprivileged(domid: DomainId, priv_domid: DomainId) -> bool {
    domid != DomainId::CONTROL && domid != priv_domid
}
