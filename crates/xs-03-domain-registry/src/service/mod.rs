//! # Domain Registry Service
//!
//! Owns one record per domain id and every resource attached to it: ring
//! mapping, event channel binding, write rate limit account and accounting
//! counters. All state is driven from a single event loop; methods take
//! `&mut self` and never suspend.
//!
//! ## Teardown
//!
//! A domain is retired by whichever path decides first (explicit release,
//! the cleanup sweep, or shutdown). Retirement is one explicit function that
//! runs, in order: unbind the event channel, unmap the ring page, fire
//! `@releaseDomain`, return the domain's credit to the reserve, drop the
//! record. The record is removed from the map before anything else, so a
//! second retirement of the same id is a no-op.

mod accounting;
mod api;
mod core;
mod events;
mod io;
mod special;

pub use self::core::{DomainRegistry, RegistryDependencies, FIRST_DOMAIN_CONNECTION};
pub use events::EventOutcome;
