use crate::domain::{DomainError, RingMapping};
use crate::service::DomainRegistry;
use crate::sweeper::{SweepAction, SweepReport, SweepTarget};
use shared_bus::DomainEvent;
use shared_types::{ConnectionId, DomainId, EvtchnPort};
use tracing::{debug, info, warn};
use xs_01_ring_transport::MappedPage;
use xs_telemetry::metrics::SWEEP_PASSES;

/// Result of servicing one pending event channel notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Nothing was pending.
    Idle,
    /// The domain-exception interrupt fired and a sweep ran.
    Swept(SweepReport),
    /// A domain kicked its port; its rings should be re-examined.
    DomainReady(DomainId),
    /// A port nobody owns any more.
    Unknown(EvtchnPort),
}

impl DomainRegistry {
    /// Register the master domain over a page the store mapped itself.
    ///
    /// The port is kicked once so the master notices the store is up. Special
    /// node permissions return to their defaults.
    pub fn bootstrap_control_domain(
        &mut self,
        remote_port: EvtchnPort,
        page: Box<dyn MappedPage>,
    ) -> Result<ConnectionId, DomainError> {
        let domid = self.config.master_domid;
        if self.lookup(domid).is_some() {
            return Err(DomainError::invalid(format!(
                "control domain {domid} already registered"
            )));
        }

        let local_port = self.events.bind_interdomain(domid, remote_port)?;
        let conn = self.install_connection(
            domid,
            RingMapping::Bootstrap(page),
            None,
            local_port,
            remote_port,
        );
        self.special.reset();
        self.events.notify(local_port);

        info!(domid = %domid, port = %local_port, "Control domain registered");
        Ok(conn)
    }

    /// Bind the domain-exception interrupt that triggers cleanup sweeps.
    pub fn bind_exception_virq(&mut self) -> Result<EvtchnPort, DomainError> {
        let port = self.events.bind_dom_exc_virq()?;
        self.virq_port = Some(port);
        debug!(port = %port, "Domain exception interrupt bound");
        Ok(port)
    }

    pub fn virq_port(&self) -> Option<EvtchnPort> {
        self.virq_port
    }

    /// Retire every domain and release the exception interrupt.
    pub fn shutdown(&mut self) {
        let ids: Vec<DomainId> = self.domains.keys().copied().collect();
        for domid in ids {
            self.retire(domid);
        }
        if let Some(port) = self.virq_port.take() {
            if let Err(err) = self.events.unbind(port) {
                warn!(port = %port, error = %err, "Unbinding exception interrupt failed");
            }
        }
        info!("Domain registry shut down");
    }

    /// Service one pending notification.
    ///
    /// The exception interrupt triggers a full sweep; any other port names
    /// the domain whose rings changed. The port is always unmasked after.
    pub fn handle_event(&mut self) -> Result<EventOutcome, DomainError> {
        let Some(port) = self.events.pending()? else {
            return Ok(EventOutcome::Idle);
        };

        let outcome = if Some(port) == self.virq_port {
            EventOutcome::Swept(self.sweep())
        } else if let Some(domid) = self.domain_by_port(port) {
            EventOutcome::DomainReady(domid)
        } else {
            debug!(port = %port, "Event on unknown port");
            EventOutcome::Unknown(port)
        };

        self.events.unmask(port)?;
        Ok(outcome)
    }

    /// Run one cleanup sweep over every known domain.
    pub fn sweep(&mut self) -> SweepReport {
        let mut sweeper = std::mem::take(&mut self.sweeper);
        let report = sweeper.run(&mut *self);
        self.sweeper = sweeper;

        SWEEP_PASSES.inc();
        debug!(
            passes = report.passes,
            retired = report.retired.len(),
            fired = report.fired_release,
            "Sweep complete"
        );
        report
    }

    /// Sweeps completed since creation.
    pub fn sweeps_completed(&self) -> u64 {
        self.sweeper.total_sweeps()
    }
}

impl SweepTarget for DomainRegistry {
    fn sweep_candidates(&self) -> Vec<DomainId> {
        self.domains.keys().copied().collect()
    }

    fn sweep_examine(&mut self, domid: DomainId) -> SweepAction {
        let info = self.domain_info.domain_info(domid);
        let Some(record) = self.domains.get_mut(&domid) else {
            return SweepAction::Keep;
        };

        if !record.is_introduced() {
            if info.is_none() {
                self.retire(domid);
                return SweepAction::PlaceholderDropped;
            }
            return SweepAction::Keep;
        }

        let mut action = SweepAction::Keep;
        if let Some(info) = info {
            if info.is_stopped() && !record.is_shutdown() {
                record.set_shutdown(true);
                info!(domid = %domid, crashed = info.crashed, "Domain stopped");
                action = SweepAction::MarkedShutdown;
            }
            if !info.dying {
                return action;
            }
        }

        self.retire(domid);
        SweepAction::Retired
    }

    fn sweep_fire_release(&mut self) {
        self.publisher.publish(DomainEvent::Released(None));
    }
}
