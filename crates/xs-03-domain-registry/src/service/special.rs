//! Permissions of the `@introduceDomain` and `@releaseDomain` special nodes.
//!
//! Neither node exists in the tree, so their permission lists live here.
//! Both start out owned by domain 0 with no access for anyone else.

use crate::domain::{is_unprivileged, DomainError};
use crate::service::DomainRegistry;
use shared_bus::EventTopic;
use shared_types::{Caller, DomainId, NodePermission, NodePerms, PermFlags};
use tracing::debug;

/// Permission lists of the special nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SpecialNodePerms {
    introduce: NodePerms,
    release: NodePerms,
}

impl SpecialNodePerms {
    fn restricted() -> NodePerms {
        NodePerms::new(vec![NodePermission::new(DomainId::CONTROL, PermFlags::NONE)])
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    fn get(&self, node: EventTopic) -> &NodePerms {
        match node {
            EventTopic::IntroduceDomain => &self.introduce,
            EventTopic::ReleaseDomain => &self.release,
        }
    }

    fn get_mut(&mut self, node: EventTopic) -> &mut NodePerms {
        match node {
            EventTopic::IntroduceDomain => &mut self.introduce,
            EventTopic::ReleaseDomain => &mut self.release,
        }
    }
}

impl Default for SpecialNodePerms {
    fn default() -> Self {
        Self {
            introduce: Self::restricted(),
            release: Self::restricted(),
        }
    }
}

impl DomainRegistry {
    /// Permission list of the special node at `path`.
    pub fn get_perms_special(&self, path: &str) -> Option<&NodePerms> {
        EventTopic::from_node_path(path).map(|node| self.special.get(node))
    }

    /// Replace the permission list of a special node.
    ///
    /// # Errors
    /// - `InvalidRequest`: `path` is not a special node, or `perms` is empty
    /// - `PermissionDenied`: caller lacks WRITE and OWNER on the current list
    pub fn set_perms_special(
        &mut self,
        caller: &Caller,
        path: &str,
        perms: NodePerms,
    ) -> Result<(), DomainError> {
        let Some(node) = EventTopic::from_node_path(path) else {
            return Err(DomainError::invalid(format!("{path} is not a special node")));
        };
        if perms.owner().is_none() {
            return Err(DomainError::invalid("empty permission list"));
        }

        let granted = self.perm_for_caller(caller, self.special.get(node));
        if !granted.contains(PermFlags::WRITE | PermFlags::OWNER) {
            return Err(DomainError::PermissionDenied(format!(
                "set permissions of {path}"
            )));
        }

        debug!(node = path, owner = ?perms.owner(), entries = perms.entries.len(), "Special node permissions set");
        *self.special.get_mut(node) = perms;
        Ok(())
    }

    /// Whether `caller` may watch the special node at `path`.
    pub fn check_perms_special(&self, path: &str, caller: &Caller) -> bool {
        self.get_perms_special(path)
            .is_some_and(|perms| self.perm_for_caller(caller, perms).contains(PermFlags::READ))
    }

    /// Access `caller` holds on a node carrying `perms`.
    ///
    /// Privileged callers and the owner get everything. Anyone else gets the
    /// first live entry naming them or the domain they act for, falling back
    /// to the owner entry's flags. Read-only connections never get WRITE.
    pub fn perm_for_caller(&self, caller: &Caller, perms: &NodePerms) -> PermFlags {
        let all = PermFlags::READ | PermFlags::WRITE | PermFlags::OWNER;
        let mask = if caller.can_write {
            all
        } else {
            PermFlags::READ | PermFlags::OWNER
        };
        let Some(owner) = perms.entries.first() else {
            return PermFlags::NONE;
        };

        let domid = caller.domid.unwrap_or(DomainId::CONTROL);
        let target = caller.domid.and_then(|d| self.target_of(d));
        let names_caller = |id: DomainId| id == domid || Some(id) == target;

        if !is_unprivileged(domid, self.config.priv_domid) || names_caller(owner.id) {
            return all & mask;
        }
        perms
            .entries
            .iter()
            .skip(1)
            .filter(|entry| !entry.perms.contains(PermFlags::IGNORE))
            .find(|entry| names_caller(entry.id))
            .map_or(owner.perms, |entry| entry.perms)
            & mask
    }
}
