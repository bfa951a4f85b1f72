use crate::domain::DomainError;
use crate::ports::DomainAdminApi;
use crate::service::core::introduced_mut;
use crate::service::DomainRegistry;
use shared_types::{Caller, ConnectionId, DomainId, EvtchnPort, FrameId};
use tracing::{debug, info, warn};

impl DomainAdminApi for DomainRegistry {
    fn introduce(
        &mut self,
        caller: &Caller,
        domid: DomainId,
        frame: FrameId,
        remote_port: EvtchnPort,
    ) -> Result<ConnectionId, DomainError> {
        if !caller.can_write {
            return Err(DomainError::PermissionDenied(format!(
                "introduce of domain {domid}"
            )));
        }
        if !remote_port.is_bound() {
            return Err(DomainError::invalid("remote port must be positive"));
        }

        let conn = if self.lookup(domid).is_some() {
            self.rebind(caller, domid, frame, remote_port)?
        } else {
            let allocated = !self.domains.contains_key(&domid);
            match self.connect(domid, frame, remote_port) {
                Ok(conn) => conn,
                Err(err) => {
                    if allocated {
                        self.domains.remove(&domid);
                    }
                    warn!(domid = %domid, error = %err, "Introduce failed");
                    return Err(err);
                }
            }
        };

        self.reset_connection_state(domid);
        Ok(conn)
    }

    fn release(&mut self, domid: DomainId) -> Result<(), DomainError> {
        if self.lookup(domid).is_none() {
            return Err(DomainError::NotFound(domid));
        }
        self.retire(domid);
        Ok(())
    }

    fn resume(&mut self, domid: DomainId) -> Result<(), DomainError> {
        let record = introduced_mut(&mut self.domains, domid).ok_or(DomainError::NotFound(domid))?;
        record.set_shutdown(false);
        debug!(domid = %domid, "Domain resumed");
        Ok(())
    }

    fn set_target(
        &mut self,
        caller: &Caller,
        domid: DomainId,
        target: DomainId,
    ) -> Result<(), DomainError> {
        if !caller.can_write {
            return Err(DomainError::PermissionDenied(format!(
                "set target of domain {domid}"
            )));
        }
        if self.lookup(domid).is_none() {
            return Err(DomainError::NotFound(domid));
        }
        if self.lookup(target).is_none() {
            return Err(DomainError::NotFound(target));
        }
        let conn = introduced_mut(&mut self.domains, domid)
            .and_then(|r| r.conn.as_mut())
            .ok_or(DomainError::NotFound(domid))?;
        conn.target = Some(target);

        info!(domid = %domid, target = %target, "Domain target set");
        Ok(())
    }

    fn get_domain_path(&self, domid: DomainId) -> String {
        format!("{}/{}", self.config.domain_path_prefix, domid.as_u32())
    }

    fn is_introduced(&self, domid: DomainId) -> bool {
        domid.is_self_alias() || self.lookup(domid).is_some()
    }

    fn reset_watches(&mut self, caller: &Caller) {
        self.hooks.delete_watches_and_transactions(caller.connection);
    }
}
