//! # Node Permissions
//!
//! Permission records attached to store nodes. The first entry names the
//! owner; later entries grant access to other domains.

use crate::entities::DomainId;
use serde::{Deserialize, Serialize};

/// Permission bits of a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PermFlags(u8);

impl PermFlags {
    pub const NONE: PermFlags = PermFlags(0);
    pub const READ: PermFlags = PermFlags(1);
    pub const WRITE: PermFlags = PermFlags(2);
    /// Entry refers to a domain that has since gone away.
    pub const IGNORE: PermFlags = PermFlags(4);
    pub const OWNER: PermFlags = PermFlags(8);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: PermFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: PermFlags) -> PermFlags {
        PermFlags(self.0 | other.0)
    }

    pub const fn intersection(self, other: PermFlags) -> PermFlags {
        PermFlags(self.0 & other.0)
    }
}

impl std::ops::BitAnd for PermFlags {
    type Output = PermFlags;

    fn bitand(self, rhs: PermFlags) -> PermFlags {
        self.intersection(rhs)
    }
}

impl std::ops::BitOr for PermFlags {
    type Output = PermFlags;

    fn bitor(self, rhs: PermFlags) -> PermFlags {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for PermFlags {
    fn bitor_assign(&mut self, rhs: PermFlags) {
        *self = self.union(rhs);
    }
}

/// One `(domain, flags)` pair of a node's permission list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePermission {
    pub id: DomainId,
    pub perms: PermFlags,
}

impl NodePermission {
    pub fn new(id: DomainId, perms: PermFlags) -> Self {
        Self { id, perms }
    }
}

/// Permission list of a node. Entry 0 is the owner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodePerms {
    pub entries: Vec<NodePermission>,
}

impl NodePerms {
    pub fn new(entries: Vec<NodePermission>) -> Self {
        Self { entries }
    }

    /// Owner of the node, if the list is non-empty.
    pub fn owner(&self) -> Option<DomainId> {
        self.entries.first().map(|p| p.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_union_and_contains() {
        let mut flags = PermFlags::READ;
        flags |= PermFlags::WRITE;
        assert!(flags.contains(PermFlags::READ));
        assert!(flags.contains(PermFlags::WRITE));
        assert!(!flags.contains(PermFlags::IGNORE));
        assert_eq!((PermFlags::READ | PermFlags::IGNORE).bits(), 5);
        assert_eq!(flags & PermFlags::READ, PermFlags::READ);
        assert_eq!(flags & PermFlags::OWNER, PermFlags::NONE);
    }

    #[test]
    fn test_owner_is_first_entry() {
        let perms = NodePerms::new(vec![
            NodePermission::new(DomainId(3), PermFlags::NONE),
            NodePermission::new(DomainId(0), PermFlags::READ),
        ]);
        assert_eq!(perms.owner(), Some(DomainId(3)));
        assert_eq!(NodePerms::default().owner(), None);
    }
}
