//! # Shared Bus - Special Node Notifications
//!
//! Carries the domain lifecycle events that the store exposes to watchers as
//! the special nodes `@introduceDomain` and `@releaseDomain`.
//!
//! ```text
//! ┌─────────────────┐                    ┌──────────────────┐
//! │ Domain Registry │                    │ Watch Dispatcher │
//! │                 │    publish()       │                  │
//! │                 │ ──────┐            │                  │
//! └─────────────────┘       │            └──────────────────┘
//!                           ▼                     ↑
//!                    ┌──────────────┐             │
//!                    │  Event Bus   │             │
//!                    │              │ ────────────┘
//!                    └──────────────┘  subscribe()
//! ```
//!
//! Publishing never blocks and never fails: with no subscriber the event is
//! counted and dropped.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{DomainEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::Subscription;

/// Maximum events to buffer per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
