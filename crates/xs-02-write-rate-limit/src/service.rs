//! # Write Rate Limiter Service
//!
//! Owns the global reserve and the live-domain/open-transaction counters.
//! Per-domain state lives in each domain record as a `WrlAccount` and is
//! passed in by the caller; the limiter never holds references to domains.
//!
//! All methods take `&mut self` and run to completion: a credit transfer is
//! never split across a suspension point.

use crate::config::WrlConfig;
use crate::domain::{xfer_credit, DebitOutcome, WrlAccount, WrlTimestamp, MAX_ELAPSED_MS};
use shared_types::DomainId;
use tracing::{debug, warn};

/// Credit-based admission controller for write transactions.
#[derive(Debug)]
pub struct WriteRateLimiter {
    config: WrlConfig,
    /// Shared pool, within `[-new_domains_burst, global_burst]`.
    reserve: i64,
    /// Domains currently holding an account.
    live_domains: u64,
    /// Transactions open system-wide.
    open_transactions: u64,
    /// Second of the last warning; `None` when the limiter has been quiet.
    last_warning: Option<u64>,
}

impl WriteRateLimiter {
    /// Create a limiter with default parameters.
    pub fn new() -> Self {
        Self::with_config(WrlConfig::default())
    }

    /// Create a limiter with custom parameters.
    pub fn with_config(config: WrlConfig) -> Self {
        Self {
            config,
            reserve: 0,
            live_domains: 0,
            open_transactions: 0,
            last_warning: None,
        }
    }

    pub fn config(&self) -> &WrlConfig {
        &self.config
    }

    pub fn reserve(&self) -> i64 {
        self.reserve
    }

    pub fn live_domains(&self) -> u64 {
        self.live_domains
    }

    pub fn open_transactions(&self) -> u64 {
        self.open_transactions
    }

    /// Second of the last throttling warning, if the limiter is in force.
    pub fn last_warning(&self) -> Option<u64> {
        self.last_warning
    }

    /// Seed a newly created domain's account from the reserve.
    pub fn domain_created(&mut self, account: &mut WrlAccount, now: WrlTimestamp) {
        account.credit = 0;
        account.timestamp = now;
        account.delay_logged = false;
        self.live_domains += 1;

        xfer_credit(
            &mut self.reserve,
            -self.config.new_domains_burst,
            &mut account.credit,
            self.config.domain_burst,
        );
    }

    /// Return a departing domain's credit to the reserve.
    ///
    /// Time elapsed since the last update is not credited first; the domain
    /// forfeits it.
    pub fn domain_destroyed(&mut self, account: &mut WrlAccount) {
        self.live_domains = self.live_domains.saturating_sub(1);
        xfer_credit(
            &mut account.credit,
            0,
            &mut self.reserve,
            self.config.domain_burst,
        );
    }

    /// Bring `account` up to date at `now`.
    ///
    /// Accrues `elapsed_ms * rate / (live_domains * 1000)`, borrows from the
    /// reserve to climb back to zero, then returns anything above the domain
    /// ceiling to the reserve and discards what the reserve cannot hold.
    pub fn update_credit(&mut self, domid: DomainId, account: &mut WrlAccount, now: WrlTimestamp) {
        let msec = now.millis_since(account.timestamp).min(MAX_ELAPSED_MS);
        let num = i128::from(msec) * i128::from(self.config.rate);
        let denom = i128::from(self.live_domains.max(1)) * 1000;
        let accrued = i64::try_from(num / denom).unwrap_or(self.config.credit_max);

        account.credit = account
            .credit
            .saturating_add(accrued)
            .min(self.config.credit_max);

        xfer_credit(&mut self.reserve, 0, &mut account.credit, 0);

        let mut surplus = 0;
        xfer_credit(
            &mut account.credit,
            self.config.domain_burst,
            &mut surplus,
            self.config.credit_max,
        );
        xfer_credit(&mut surplus, 0, &mut self.reserve, self.config.global_burst);

        account.timestamp = now;

        debug!(
            domid = %domid,
            msec,
            credit = account.credit,
            reserve = self.reserve,
            discard = surplus,
            "wrl: credit updated"
        );
    }

    /// Tighten the caller's wake-up timeout if the domain is throttled.
    ///
    /// `timeout` is in milliseconds: `None` means no deadline yet and
    /// `Some(0)` means an immediate wake-up was already decided, in which
    /// case it is left alone.
    pub fn check_timeout(
        &mut self,
        domid: DomainId,
        account: &mut WrlAccount,
        now: WrlTimestamp,
        timeout: &mut Option<u64>,
    ) {
        self.update_credit(domid, account, now);

        if account.credit >= 0 {
            return;
        }
        if *timeout == Some(0) {
            return;
        }

        let wakeup = self.throttle_delay_ms(account);
        if timeout.map_or(true, |current| wakeup < current) {
            *timeout = Some(wakeup);
        }

        debug!(
            domid = %domid,
            credit = account.credit,
            reserve = self.reserve,
            wakeup,
            "wrl: domain sleeping"
        );
    }

    /// Milliseconds until a negative credit reaches zero at the current
    /// per-domain accrual rate. Rounded up, so always positive when
    /// throttled.
    pub fn throttle_delay_ms(&self, account: &WrlAccount) -> u64 {
        if account.credit >= 0 {
            return 0;
        }
        let num = i128::from(account.credit).unsigned_abs()
            * 1000
            * u128::from(self.live_domains.max(1));
        let denom = u128::from(self.config.rate.max(1).unsigned_abs());
        let wakeup = num.div_ceil(denom);
        u64::try_from(wakeup.min(i32::MAX as u128)).unwrap_or(i32::MAX as u64)
    }

    /// Whether a direct (non-transactional) write is charged right now.
    ///
    /// Writes inside a transaction are charged once at commit; with no
    /// transaction open anywhere nobody is contending.
    pub fn debit_direct_in_force(&self, in_transaction: bool) -> bool {
        !in_transaction && self.open_transactions > 0
    }

    /// Whether a transaction commit is charged right now.
    ///
    /// The committing transaction is itself counted as open.
    pub fn debit_commit_in_force(&self) -> bool {
        self.open_transactions > 1
    }

    /// Charge one write to `account`.
    pub fn apply_debit(
        &mut self,
        domid: DomainId,
        account: &mut WrlAccount,
        now: WrlTimestamp,
    ) -> DebitOutcome {
        self.update_credit(domid, account, now);
        account.credit -= self.config.write_cost;

        debug!(
            domid = %domid,
            credit = account.credit,
            reserve = self.reserve,
            "wrl: debit applied"
        );

        if account.credit >= 0 {
            return DebitOutcome::Charged;
        }

        if !account.delay_logged {
            account.delay_logged = true;
            warn!(domid = %domid, "write rate limit: domain {} is affected", domid);
        } else if self.last_warning.is_none() {
            warn!("write rate limit: rate limiting restarts");
        }
        self.last_warning = Some(now.as_secs());
        DebitOutcome::Throttled
    }

    /// Clear the warning state once the limiter has been quiet for longer
    /// than the suppression window. Returns whether it was cleared.
    pub fn log_periodic(&mut self, now: WrlTimestamp) -> bool {
        match self.last_warning {
            Some(last) if now.as_secs().saturating_sub(last) > self.config.log_every_secs => {
                warn!("write rate limit: not in force recently");
                self.last_warning = None;
                true
            }
            _ => false,
        }
    }

    /// A transaction was opened somewhere.
    pub fn transaction_started(&mut self) {
        self.open_transactions += 1;
    }

    /// A transaction was committed or aborted.
    pub fn transaction_ended(&mut self) {
        self.open_transactions = self.open_transactions.saturating_sub(1);
    }
}

impl Default for WriteRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
