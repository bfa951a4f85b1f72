//! # Shared Types Crate
//!
//! Identifiers, POSIX error codes and node permission records used by every
//! subsystem of the xenstore domain layer.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Newtypes over integers**: a `DomainId` can never be confused with an
//!   `EvtchnPort` or a `FrameId` at a call site.
//! - **No behaviour**: this crate carries data only; the subsystems own the
//!   logic.

pub mod entities;
pub mod errors;
pub mod permissions;

pub use entities::*;
pub use errors::*;
pub use permissions::*;
