//! # Domain Lifecycle Events
//!
//! Each event corresponds to a firing of one special node.

use serde::{Deserialize, Serialize};
use shared_types::DomainId;

/// Events published when the set of connected domains changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A domain was introduced for the first time.
    Introduced(DomainId),

    /// A domain's connection was torn down.
    ///
    /// `None` when the firing covers a whole sweep rather than one domain.
    Released(Option<DomainId>),
}

impl DomainEvent {
    /// Topic this event is published on.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::Introduced(_) => EventTopic::IntroduceDomain,
            Self::Released(_) => EventTopic::ReleaseDomain,
        }
    }

    /// Domain the event concerns, if any.
    #[must_use]
    pub fn domid(&self) -> Option<DomainId> {
        match self {
            Self::Introduced(domid) => Some(*domid),
            Self::Released(domid) => *domid,
        }
    }
}

/// Special node names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    IntroduceDomain,
    ReleaseDomain,
}

impl EventTopic {
    pub const ALL: [EventTopic; 2] = [EventTopic::IntroduceDomain, EventTopic::ReleaseDomain];

    /// Path of the special node watchers register on.
    #[must_use]
    pub fn node_path(&self) -> &'static str {
        match self {
            Self::IntroduceDomain => "@introduceDomain",
            Self::ReleaseDomain => "@releaseDomain",
        }
    }

    /// Special node named by `path`, if any.
    pub fn from_node_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|topic| topic.node_path() == path)
    }

    pub(crate) const fn slot(self) -> usize {
        match self {
            Self::IntroduceDomain => 0,
            Self::ReleaseDomain => 1,
        }
    }
}

/// Filter applied by a subscription.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to receive; empty means all.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Receive every event.
    #[must_use]
    pub fn all() -> Self {
        Self { topics: Vec::new() }
    }

    /// Receive only the given topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Whether `event` passes this filter.
    #[must_use]
    pub fn matches(&self, event: &DomainEvent) -> bool {
        self.topics.is_empty() || self.topics.contains(&event.topic())
    }
}
