//! # Domain Layer for Write Rate Limiting
//!
//! Per-domain account state and the credit transfer primitive. Pure and
//! synchronous; the service owns the global counters.

mod account;
mod credit;

pub use account::*;
pub use credit::*;
