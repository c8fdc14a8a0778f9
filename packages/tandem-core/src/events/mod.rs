//! Domain events for group lifecycle changes.
//!
//! This module provides:
//! - [`EventEmitter`] trait for domain services to emit events
//! - [`GroupEvent`], one variant per group state transition
//!
//! Events are emitted after the dataset write succeeds, so a listener never
//! sees a transition that was not persisted.

mod emitter;

pub use emitter::{EventEmitter, LoggingEventEmitter, NoopEventEmitter};

use serde::Serialize;

/// Events describing group membership transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GroupEvent {
    /// A group was created by its first member, who leads it.
    Created {
        group: String,
        leader: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A user joined an existing group.
    MemberJoined {
        group: String,
        #[serde(rename = "userId")]
        user_id: String,
        timestamp: u64,
    },
    /// A user left a group by joining another one.
    MemberLeft {
        group: String,
        #[serde(rename = "userId")]
        user_id: String,
        timestamp: u64,
    },
    /// A new leader was elected after the previous one left.
    LeaderElected {
        group: String,
        leader: String,
        previous: String,
        timestamp: u64,
    },
    /// The last member left and the group was removed.
    Dissolved { group: String, timestamp: u64 },
}

impl GroupEvent {
    /// Returns the name of the group the event concerns.
    pub fn group(&self) -> &str {
        match self {
            Self::Created { group, .. }
            | Self::MemberJoined { group, .. }
            | Self::MemberLeft { group, .. }
            | Self::LeaderElected { group, .. }
            | Self::Dissolved { group, .. } => group,
        }
    }
}
