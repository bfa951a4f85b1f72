//! # Domain Layer for Ring Transport
//!
//! Pure logic over the shared page: layout, index validation and chunk
//! arithmetic. No I/O and no notification side effects.

mod errors;
mod interface;
mod ring;

pub use errors::*;
pub use interface::*;
pub use ring::*;
