//! Ports Layer - Hexagonal Architecture
//!
//! - `inbound`: the administrative API exposed to the dispatch layer
//! - `outbound`: collaborators the registry drives

pub mod inbound;
pub mod outbound;

pub use inbound::DomainAdminApi;
pub use outbound::{ConfigProvider, ConnectionHooks, DomainInfoSource};
