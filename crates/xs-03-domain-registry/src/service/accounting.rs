//! Entry and watch quotas, and write rate limit charging.

use crate::domain::{is_unprivileged, DomainRecord};
use crate::service::core::introduced_mut;
use crate::service::DomainRegistry;
use shared_types::{Caller, DomainId};
use xs_02_write_rate_limit::DebitOutcome;
use xs_telemetry::metrics::{WRL_DEBITS, WRL_THROTTLED};

impl DomainRegistry {
    // =========================================================================
    // ENTRY AND WATCH ACCOUNTING
    // =========================================================================

    /// Charge a new node to its owner.
    ///
    /// `owner` is the first entry of the node's permissions. Inside a
    /// transaction the charge is deferred to the transaction layer.
    pub fn entry_inc(&mut self, caller: &Caller, owner: Option<DomainId>) {
        let caller_domid = caller.domid.unwrap_or(DomainId::CONTROL);
        let charged = match owner {
            Some(owner) if owner != caller_domid => owner,
            _ => match caller.domid {
                Some(domid) => domid,
                None => return,
            },
        };

        if caller.in_transaction {
            self.hooks.transaction_entry_inc(caller.connection, charged);
        } else if let Some(record) = introduced_mut(&mut self.domains, charged) {
            record.entries = record.entries.saturating_add(1);
        }
    }

    /// Refund a deleted node to its owner. Counts never go below zero.
    pub fn entry_dec(&mut self, caller: &Caller, owner: Option<DomainId>) {
        let caller_domid = caller.domid.unwrap_or(DomainId::CONTROL);
        match owner {
            Some(owner) if owner != caller_domid => {
                if caller.in_transaction {
                    self.hooks.transaction_entry_dec(caller.connection, owner);
                } else if let Some(record) = introduced_mut(&mut self.domains, owner) {
                    record.entries = record.entries.saturating_sub(1);
                }
            }
            _ => {
                let Some(domid) = caller.domid else {
                    return;
                };
                let Some(record) = introduced_mut(&mut self.domains, domid) else {
                    return;
                };
                if record.entries == 0 {
                    return;
                }
                if caller.in_transaction {
                    self.hooks.transaction_entry_dec(caller.connection, domid);
                } else {
                    record.entries -= 1;
                }
            }
        }
    }

    /// Apply a batch of entry changes, typically at transaction commit.
    ///
    /// Returns the resulting count for unprivileged domains and zero for
    /// privileged or unknown ones. With `update == false` only the would-be
    /// count is computed, for quota checks.
    pub fn entry_fix(&mut self, domid: DomainId, delta: i64, update: bool) -> u32 {
        let priv_domid = self.config.priv_domid;
        let Some(record) = introduced_mut(&mut self.domains, domid) else {
            return 0;
        };

        let count = (i64::from(record.entries) + delta).clamp(0, i64::from(u32::MAX)) as u32;
        if update {
            record.entries = count;
        }
        if is_unprivileged(domid, priv_domid) {
            count
        } else {
            0
        }
    }

    /// Entries charged to the caller's domain, for quota checks.
    pub fn entry_count(&self, caller: &Caller) -> u32 {
        self.unprivileged_record(caller)
            .map_or(0, DomainRecord::entry_count)
    }

    pub fn watch_inc(&mut self, caller: &Caller) {
        if let Some(record) = caller
            .domid
            .and_then(|domid| introduced_mut(&mut self.domains, domid))
        {
            record.watches = record.watches.saturating_add(1);
        }
    }

    pub fn watch_dec(&mut self, caller: &Caller) {
        if let Some(record) = caller
            .domid
            .and_then(|domid| introduced_mut(&mut self.domains, domid))
        {
            record.watches = record.watches.saturating_sub(1);
        }
    }

    /// Watches held by the caller's domain, for quota checks.
    pub fn watch_count(&self, caller: &Caller) -> u32 {
        self.unprivileged_record(caller)
            .map_or(0, DomainRecord::watch_count)
    }

    fn unprivileged_record(&self, caller: &Caller) -> Option<&DomainRecord> {
        caller
            .domid
            .filter(|domid| is_unprivileged(*domid, self.config.priv_domid))
            .and_then(|domid| self.lookup(domid))
    }

    // =========================================================================
    // WRITE RATE LIMITING
    // =========================================================================

    /// Charge a write made outside a transaction.
    ///
    /// Local connections are exempt. Writes inside a transaction are charged
    /// once at commit instead.
    pub fn debit_direct(&mut self, caller: &Caller) -> DebitOutcome {
        let Some(domid) = caller.domid else {
            return DebitOutcome::Exempt;
        };
        if !self.wrl.debit_direct_in_force(caller.in_transaction) {
            return DebitOutcome::Exempt;
        }
        self.debit(domid)
    }

    /// Charge a transaction commit.
    pub fn debit_transaction_commit(&mut self, caller: &Caller) -> DebitOutcome {
        let Some(domid) = caller.domid else {
            return DebitOutcome::Exempt;
        };
        if !self.wrl.debit_commit_in_force() {
            return DebitOutcome::Exempt;
        }
        self.debit(domid)
    }

    fn debit(&mut self, domid: DomainId) -> DebitOutcome {
        let now = self.clock.now();
        let Some(record) = introduced_mut(&mut self.domains, domid) else {
            return DebitOutcome::Exempt;
        };

        let outcome = self.wrl.apply_debit(domid, &mut record.wrl, now);
        WRL_DEBITS.inc();
        if outcome == DebitOutcome::Throttled {
            WRL_THROTTLED.inc();
        }
        outcome
    }

    pub fn transaction_started(&mut self) {
        self.wrl.transaction_started();
    }

    pub fn transaction_ended(&mut self) {
        self.wrl.transaction_ended();
    }

    /// Tighten `timeout` (milliseconds) to when `domid` stops being
    /// throttled.
    pub fn check_timeout(&mut self, domid: DomainId, timeout: &mut Option<u64>) {
        let now = self.clock.now();
        if let Some(record) = introduced_mut(&mut self.domains, domid) {
            self.wrl.check_timeout(domid, &mut record.wrl, now, timeout);
        }
    }

    /// `check_timeout` over every introduced domain.
    pub fn check_timeouts(&mut self, timeout: &mut Option<u64>) {
        let now = self.clock.now();
        for (domid, record) in self.domains.iter_mut() {
            if record.is_introduced() {
                self.wrl.check_timeout(*domid, &mut record.wrl, now, timeout);
            }
        }
    }

    /// Periodic rate limit log maintenance.
    pub fn log_periodic(&mut self) -> bool {
        let now = self.clock.now();
        self.wrl.log_periodic(now)
    }
}
