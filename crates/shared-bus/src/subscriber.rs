//! # Watchers
//!
//! Receiving side of the bus. A watcher that falls more than the bus backlog
//! behind loses the oldest firings; special-node watchers re-read state on
//! every firing, so only the latest matters.

use crate::events::{DomainEvent, EventFilter, EventTopic};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum SubscriptionError {
    /// The bus was dropped.
    #[error("event bus closed")]
    Closed,
}

/// Live watcher count per special node.
#[derive(Debug, Default)]
pub(crate) struct WatcherTally {
    counts: [AtomicUsize; EventTopic::ALL.len()],
}

impl WatcherTally {
    fn admitted(filter: &EventFilter) -> impl Iterator<Item = EventTopic> + '_ {
        EventTopic::ALL
            .into_iter()
            .filter(move |topic| filter.topics.is_empty() || filter.topics.contains(topic))
    }

    pub(crate) fn add(&self, filter: &EventFilter) {
        for topic in Self::admitted(filter) {
            self.counts[topic.slot()].fetch_add(1, Ordering::Relaxed);
        }
    }

    fn remove(&self, filter: &EventFilter) {
        for topic in Self::admitted(filter) {
            self.counts[topic.slot()].fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn get(&self, topic: EventTopic) -> usize {
        self.counts[topic.slot()].load(Ordering::Relaxed)
    }
}

/// A registered watcher. Dropping it unregisters.
pub struct Subscription {
    rx: broadcast::Receiver<DomainEvent>,
    filter: EventFilter,
    tally: Arc<WatcherTally>,
}

impl Subscription {
    pub(crate) fn new(
        rx: broadcast::Receiver<DomainEvent>,
        filter: EventFilter,
        tally: Arc<WatcherTally>,
    ) -> Self {
        Self { rx, filter, tally }
    }

    /// Wait for the next firing this watcher cares about.
    ///
    /// `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    debug!(missed, "Watcher fell behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next pending firing, without waiting.
    pub(crate) fn try_recv(&mut self) -> Result<Option<DomainEvent>, SubscriptionError> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) | Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }

    /// Every pending firing this watcher cares about.
    pub fn drain(&mut self) -> Vec<DomainEvent> {
        std::iter::from_fn(|| self.try_recv().ok().flatten()).collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.tally.remove(&self.filter);
    }
}
