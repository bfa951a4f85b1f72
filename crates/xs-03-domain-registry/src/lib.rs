//! # Domain Registry Subsystem (xs-03)
//!
//! Tracks every guest domain the store talks to: its ring page, its event
//! channel, its write rate limit account and the entries and watches charged
//! to it. Domains enter through `INTRODUCE` and leave through `RELEASE`, a
//! cleanup sweep, or shutdown.
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | One record per id | Introduced or placeholder, never both |
//! | Generation pinning | A record keeps the generation it was first allocated at |
//! | Ordered teardown | Unbind, unmap, fire `@releaseDomain`, return credit |
//! | Idempotent retire | The record leaves the map first; a second retire is a no-op |
//! | Quarantine | A corrupted ring is never read or written again until re-introduced |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - records, errors, domain-info snapshot
//! - `ports/` - `DomainAdminApi` (inbound); `DomainInfoSource`,
//!   `ConnectionHooks`, `ConfigProvider` (outbound)
//! - `service/` - `DomainRegistry`: lifecycle, event dispatch, ring IO,
//!   accounting, special node permissions
//! - `sweeper.rs` - `CleanupSweeper`, restartable scan over the registry
//! - `ipc/` - request parsing and reply encoding
//! - `adapters/` - static and TOML configuration providers
//!
//! ## Usage
//!
//! ```ignore
//! use xs_03_domain_registry::{DomainAdminApi, DomainRegistry, RegistryDependencies};
//!
//! let mut registry = DomainRegistry::new(config, deps);
//! registry.bind_exception_virq()?;
//! registry.introduce(&caller, DomainId(5), FrameId(0x1000), EvtchnPort(3))?;
//!
//! loop {
//!     match registry.handle_event()? {
//!         EventOutcome::DomainReady(domid) => service_rings(&mut registry, domid),
//!         _ => {}
//!     }
//! }
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ipc;
pub mod ports;
pub mod service;
pub mod sweeper;

/// Mock collaborators and a wired-up registry harness.
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::{ConfigError, StaticConfigProvider, TomlConfigProvider};
pub use config::{DomainLayerConfig, RegistryConfig, DEFAULT_DOMAIN_PATH_PREFIX};
pub use domain::{is_unprivileged, DomainError, DomainInfo, DomainRecord};
pub use ports::{ConfigProvider, ConnectionHooks, DomainAdminApi, DomainInfoSource};
pub use service::{DomainRegistry, EventOutcome, RegistryDependencies, FIRST_DOMAIN_CONNECTION};
pub use sweeper::{CleanupSweeper, SweepAction, SweepReport, SweepState, SweepTarget};

// Re-export IPC types
pub use ipc::{DomainReply, DomainRequest, DomainRequestHandler, RequestKind};
