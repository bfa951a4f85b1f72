//! # IPC Layer
//!
//! Wire-level handling of the domain management requests: argument parsing,
//! dispatch to the registry, and reply encoding.
//!
//! Requests carry no identity of their own. Who is asking, and whether they
//! may write, comes from the `Caller` the dispatch layer attaches.

pub mod handler;
pub mod payloads;

pub use handler::DomainRequestHandler;
pub use payloads::{DomainReply, DomainRequest, RequestKind};
