//! # Error Codes
//!
//! POSIX-style error codes returned to the dispatch layer, which formats
//! them into the wire reply.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code carried in an error reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum Errno {
    /// Invalid argument.
    #[error("EINVAL")]
    Einval,
    /// Permission denied.
    #[error("EACCES")]
    Eacces,
    /// No such entity.
    #[error("ENOENT")]
    Enoent,
    /// Out of memory.
    #[error("ENOMEM")]
    Enomem,
    /// I/O error (ring corruption).
    #[error("EIO")]
    Eio,
}

impl Errno {
    /// Numeric value as on Linux.
    pub const fn code(self) -> i32 {
        match self {
            Errno::Einval => 22,
            Errno::Eacces => 13,
            Errno::Enoent => 2,
            Errno::Enomem => 12,
            Errno::Eio => 5,
        }
    }

    /// Symbolic name used in error replies.
    pub const fn name(self) -> &'static str {
        match self {
            Errno::Einval => "EINVAL",
            Errno::Eacces => "EACCES",
            Errno::Enoent => "ENOENT",
            Errno::Enomem => "ENOMEM",
            Errno::Eio => "EIO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_codes() {
        assert_eq!(Errno::Einval.code(), 22);
        assert_eq!(Errno::Eacces.code(), 13);
        assert_eq!(Errno::Enoent.code(), 2);
        assert_eq!(Errno::Enomem.code(), 12);
        assert_eq!(Errno::Eio.code(), 5);
    }

    #[test]
    fn test_errno_display_matches_name() {
        for errno in [Errno::Einval, Errno::Eacces, Errno::Enoent, Errno::Enomem, Errno::Eio] {
            assert_eq!(errno.to_string(), errno.name());
        }
    }
}
