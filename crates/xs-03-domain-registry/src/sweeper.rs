//! # Cleanup Sweeper
//!
//! Reacts to the domain-exception interrupt by scanning every known domain.
//! The interrupt says only that *something* changed, so the sweeper never
//! trusts it to name a domain.
//!
//! ```text
//!            trigger                  pass mutated the list
//!   ┌──────┐ ───────▶ ┌──────────┐ ◀──────────────────────┐
//!   │ Idle │          │ Scanning │ ───────────────────────┘
//!   └──────┘ ◀─────── └──────────┘
//!            pass completed unchanged
//! ```
//!
//! Retiring a domain or discarding a placeholder invalidates the cursor, so
//! the pass restarts from the first domain. Each restart removes one record,
//! which bounds the number of restarts by the number of records.

use shared_types::DomainId;
use tracing::debug;

/// Sweeper state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepState {
    #[default]
    Idle,
    Scanning,
}

/// What examining one domain did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAction {
    /// Nothing changed.
    Keep,
    /// The domain was newly seen crashed or shut down.
    MarkedShutdown,
    /// The domain's connection was torn down. Teardown already fired the
    /// release event for it.
    Retired,
    /// A placeholder for a domain that no longer exists was discarded.
    PlaceholderDropped,
}

impl SweepAction {
    fn mutates_list(self) -> bool {
        matches!(self, SweepAction::Retired | SweepAction::PlaceholderDropped)
    }
}

/// The registry as seen by the sweeper.
pub trait SweepTarget {
    /// Ids of every record, introduced or not, in scan order.
    fn sweep_candidates(&self) -> Vec<DomainId>;

    /// Examine one domain and apply whatever its state requires.
    fn sweep_examine(&mut self, domid: DomainId) -> SweepAction;

    /// Fire the collective release event.
    fn sweep_fire_release(&mut self);
}

/// Summary of one triggered sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Passes started, including restarts.
    pub passes: u32,
    pub retired: Vec<DomainId>,
    pub newly_shutdown: Vec<DomainId>,
    pub placeholders_dropped: Vec<DomainId>,
    /// Whether the collective release event was fired.
    pub fired_release: bool,
}

/// Two-state cleanup machine.
#[derive(Debug, Default)]
pub struct CleanupSweeper {
    state: SweepState,
    total_sweeps: u64,
}

impl CleanupSweeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SweepState {
        self.state
    }

    /// Sweeps run since creation.
    pub fn total_sweeps(&self) -> u64 {
        self.total_sweeps
    }

    /// Run one triggered sweep to completion.
    ///
    /// A domain newly seen stopped schedules one collective release event
    /// for the end of the sweep. A connection teardown cancels it, since the
    /// teardown fires its own.
    pub fn run(&mut self, target: &mut dyn SweepTarget) -> SweepReport {
        self.state = SweepState::Scanning;
        let mut report = SweepReport::default();
        let mut notify = false;

        'again: loop {
            report.passes += 1;
            for domid in target.sweep_candidates() {
                let action = target.sweep_examine(domid);
                match action {
                    SweepAction::Keep => {}
                    SweepAction::MarkedShutdown => {
                        notify = true;
                        report.newly_shutdown.push(domid);
                    }
                    SweepAction::Retired => {
                        notify = false;
                        report.retired.push(domid);
                    }
                    SweepAction::PlaceholderDropped => report.placeholders_dropped.push(domid),
                }
                if action.mutates_list() {
                    debug!(domid = %domid, ?action, "Sweep restarting after mutation");
                    continue 'again;
                }
            }
            break;
        }

        if notify {
            target.sweep_fire_release();
            report.fired_release = true;
        }

        self.state = SweepState::Idle;
        self.total_sweeps += 1;
        report
    }
}
