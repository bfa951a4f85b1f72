//! # Integration Tests
//!
//! Every scenario builds a fresh `TestHarness`, so registries, reserves and
//! buses never leak between tests.

pub mod admission;
pub mod choreography;
pub mod lifecycle;
pub mod transport;
