//! # Driven Ports (Outbound SPI)
//!
//! The notification service and the foreign memory mapper are declared by
//! the ring transport crate; the ports below cover the rest of the daemon.

use crate::config::DomainLayerConfig;
use crate::domain::DomainInfo;
use shared_types::{ConnectionId, DomainId};

/// Hypervisor domain-info query.
pub trait DomainInfoSource: Send + Sync {
    /// Current state of `domid`, or `None` if no such domain exists.
    fn domain_info(&self, domid: DomainId) -> Option<DomainInfo>;
}

/// Connection bookkeeping owned by the dispatch layer.
///
/// The registry allocates connection ids for the domains it introduces and
/// tells the dispatch layer when their state must be dropped.
pub trait ConnectionHooks: Send + Sync {
    /// A domain connection now exists.
    fn connection_opened(&self, conn: ConnectionId, domid: DomainId);

    /// Drop watches, transactions and any buffered input and output.
    fn reset_connection(&self, conn: ConnectionId);

    /// Drop watches and transactions only.
    fn delete_watches_and_transactions(&self, conn: ConnectionId);

    /// The connection is gone; forget it.
    fn connection_closed(&self, conn: ConnectionId);

    /// Charge an entry to `owner` inside the connection's open transaction.
    fn transaction_entry_inc(&self, conn: ConnectionId, owner: DomainId);

    /// Refund an entry to `owner` inside the connection's open transaction.
    fn transaction_entry_dec(&self, conn: ConnectionId, owner: DomainId);
}

/// Source of the domain layer configuration.
pub trait ConfigProvider: Send + Sync {
    fn domain_layer_config(&self) -> DomainLayerConfig;
}
