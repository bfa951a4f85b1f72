//! # Request Handler
//!
//! Routes parsed domain management requests to the [`DomainAdminApi`] and
//! turns the outcome into a reply. Errors never escape: every failure
//! becomes `DomainReply::Error` with the matching code.

use crate::domain::DomainError;
use crate::ipc::payloads::{DomainReply, DomainRequest, RequestKind};
use crate::ports::DomainAdminApi;
use shared_types::Caller;
use tracing::debug;

/// Stateless dispatcher for domain management requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomainRequestHandler;

impl DomainRequestHandler {
    pub fn new() -> Self {
        Self
    }

    /// Parse `payload` as a `kind` request and execute it for `caller`.
    pub fn handle<A: DomainAdminApi + ?Sized>(
        &self,
        api: &mut A,
        caller: &Caller,
        kind: RequestKind,
        payload: &[u8],
    ) -> DomainReply {
        let reply = Self::admit(caller, kind, payload)
            .and_then(|()| DomainRequest::parse(kind, payload))
            .and_then(|request| self.execute(api, caller, request))
            .unwrap_or_else(DomainReply::from);

        debug!(
            request = kind.name(),
            conn = %caller.connection,
            error = reply.is_error(),
            "Domain request handled"
        );
        reply
    }

    /// Refuse write requests from read-only callers before their arguments
    /// are interpreted. A short argument list is still EINVAL.
    fn admit(caller: &Caller, kind: RequestKind, payload: &[u8]) -> Result<(), DomainError> {
        if !kind.requires_write() || caller.can_write {
            return Ok(());
        }
        DomainRequest::check_arity(kind, payload)?;
        Err(DomainError::PermissionDenied(kind.name().to_string()))
    }

    /// Execute an already parsed request.
    pub fn execute<A: DomainAdminApi + ?Sized>(
        &self,
        api: &mut A,
        caller: &Caller,
        request: DomainRequest,
    ) -> Result<DomainReply, DomainError> {
        let reply = match request {
            DomainRequest::Introduce { domid, frame, port } => {
                api.introduce(caller, domid, frame, port)?;
                DomainReply::Ack
            }
            DomainRequest::Release(domid) => {
                api.release(domid)?;
                DomainReply::Ack
            }
            DomainRequest::Resume(domid) => {
                api.resume(domid)?;
                DomainReply::Ack
            }
            DomainRequest::SetTarget { domid, target } => {
                api.set_target(caller, domid, target)?;
                DomainReply::Ack
            }
            DomainRequest::GetDomainPath(domid) => DomainReply::Path(api.get_domain_path(domid)),
            DomainRequest::IsDomainIntroduced(domid) => DomainReply::Bool(api.is_introduced(domid)),
            DomainRequest::ResetWatches => {
                api.reset_watches(caller);
                DomainReply::Ack
            }
        };
        Ok(reply)
    }
}
