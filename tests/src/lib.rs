//! # Xenstore Domain Layer Test Suite
//!
//! Cross-crate scenarios that wire the ring transport, the write rate limiter
//! and the domain registry together through the mocks each crate exports
//! behind its `test-utils` feature.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/
//! │   ├── lifecycle.rs     # introduce, re-introduce, release, sweep
//! │   ├── transport.rs     # guest <-> store byte flow, corruption
//! │   ├── admission.rs     # write rate limiting across domains
//! │   └── choreography.rs  # special-node events on the bus, config files
//! └── benches/
//!     └── domain_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p xs-tests
//! cargo test -p xs-tests integration::lifecycle::
//! cargo bench -p xs-tests
//! ```

#![allow(unused_variables)]
#![allow(dead_code)]

pub mod integration;
