//! # Inbound Port - DomainAdminApi
//!
//! Operations reachable through domain management requests.
//!
//! | Method | Request | Requires write access |
//! |--------|---------|-----------------------|
//! | `introduce` | `INTRODUCE` | yes |
//! | `release` | `RELEASE` | no |
//! | `resume` | `RESUME` | no |
//! | `set_target` | `SET_TARGET` | yes |
//! | `get_domain_path` | `GET_DOMAIN_PATH` | no |
//! | `is_introduced` | `IS_DOMAIN_INTRODUCED` | no |
//! | `reset_watches` | `RESET_WATCHES` | no |

use crate::domain::DomainError;
use shared_types::{Caller, ConnectionId, DomainId, EvtchnPort, FrameId};

/// Domain management API.
pub trait DomainAdminApi {
    /// Register a domain's ring page and event channel, or rebind the event
    /// channel of an already registered domain.
    ///
    /// # Errors
    /// - `PermissionDenied`: caller is read-only
    /// - `InvalidRequest`: unbound remote port, different frame for a
    ///   registered domain, or a domain re-introducing itself
    /// - `ResourceExhaustion`: mapping or binding failed; nothing changed
    fn introduce(
        &mut self,
        caller: &Caller,
        domid: DomainId,
        frame: FrameId,
        remote_port: EvtchnPort,
    ) -> Result<ConnectionId, DomainError>;

    /// Tear down a registered domain.
    fn release(&mut self, domid: DomainId) -> Result<(), DomainError>;

    /// Clear the shutdown flag of a registered domain.
    fn resume(&mut self, domid: DomainId) -> Result<(), DomainError>;

    /// Make `domid`'s connection act for `target`.
    fn set_target(
        &mut self,
        caller: &Caller,
        domid: DomainId,
        target: DomainId,
    ) -> Result<(), DomainError>;

    /// Home path of any domain id, registered or not.
    fn get_domain_path(&self, domid: DomainId) -> String;

    /// Whether `domid` is registered. `DOMID_SELF` always is.
    fn is_introduced(&self, domid: DomainId) -> bool;

    /// Drop all watches and transactions of the caller's connection.
    fn reset_watches(&mut self, caller: &Caller);
}
