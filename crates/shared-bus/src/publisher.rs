//! # Event Publisher
//!
//! Firing side of the bus. The registry fires special nodes synchronously
//! from inside its own critical sections, so `fire` must never wait.

use crate::events::{DomainEvent, EventFilter, EventTopic};
use crate::subscriber::{Subscription, WatcherTally};
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Sink for special-node firings.
pub trait EventPublisher: Send + Sync {
    /// Fire a special node. Returns how many watchers were handed the event.
    fn publish(&self, event: DomainEvent) -> usize;

    /// Firings so far, watched or not.
    fn fired(&self) -> u64;
}

/// Broadcast bus keeping a tally of watchers per special node.
pub struct InMemoryEventBus {
    tx: broadcast::Sender<DomainEvent>,
    tally: Arc<WatcherTally>,
    fired: AtomicU64,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// `backlog` events are kept per watcher before the oldest are dropped.
    #[must_use]
    pub fn with_capacity(backlog: usize) -> Self {
        let (tx, _) = broadcast::channel(backlog);
        Self {
            tx,
            tally: Arc::new(WatcherTally::default()),
            fired: AtomicU64::new(0),
        }
    }

    /// Register a watcher. Firings before this call are not seen.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.tally.add(&filter);
        debug!(topics = ?filter.topics, "Watcher registered");
        Subscription::new(self.tx.subscribe(), filter, Arc::clone(&self.tally))
    }

    /// Watchers whose filter admits `topic`.
    #[must_use]
    pub fn watchers(&self, topic: EventTopic) -> usize {
        self.tally.get(topic)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: DomainEvent) -> usize {
        self.fired.fetch_add(1, Ordering::Relaxed);
        let node = event.topic().node_path();

        let Ok(receivers) = self.tx.send(event) else {
            trace!(node, "Special node fired, nobody watching");
            return 0;
        };
        debug!(node, domid = ?event.domid(), receivers, "Special node fired");
        receivers
    }

    fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }
}
