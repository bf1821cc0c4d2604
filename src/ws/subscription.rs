//! Per-connection subscriptions: which events a socket follows, and which
//! kinds of change it wants for each.
//!
//! A venue display only needs the controls of its own event; an admin
//! panel also wants wish and lifecycle traffic. Each subscribed event
//! therefore carries a [`Topics`] set, and the wildcard carries its own.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{EventId, WallEvent};

/// Kind of change a subscriber can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Controls record writes (and the snapshot sent on subscribe).
    Controls,
    /// Wish created, updated or deleted.
    Wishes,
    /// Event created, updated or deleted.
    Lifecycle,
}

impl Topic {
    /// Topic a bus event belongs to.
    #[must_use]
    pub const fn of(event: &WallEvent) -> Self {
        match event {
            WallEvent::ControlsChanged { .. } => Self::Controls,
            WallEvent::WishCreated { .. }
            | WallEvent::WishUpdated { .. }
            | WallEvent::WishDeleted { .. } => Self::Wishes,
            WallEvent::EventCreated { .. }
            | WallEvent::EventUpdated { .. }
            | WallEvent::EventDeleted { .. } => Self::Lifecycle,
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Controls => 0b001,
            Self::Wishes => 0b010,
            Self::Lifecycle => 0b100,
        }
    }
}

/// Set of [`Topic`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Topics(u8);

impl Topics {
    /// Every topic.
    pub const ALL: Self = Self(0b111);

    /// Builds a set from a request list; an empty list means every topic.
    #[must_use]
    pub fn from_request(topics: &[Topic]) -> Self {
        if topics.is_empty() {
            return Self::ALL;
        }
        Self(topics.iter().fold(0, |bits, topic| bits | topic.bit()))
    }

    /// Returns `true` if `topic` is in the set.
    #[must_use]
    pub const fn contains(self, topic: Topic) -> bool {
        self.0 & topic.bit() != 0
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Topics in the set, in declaration order.
    #[must_use]
    pub fn to_vec(self) -> Vec<Topic> {
        [Topic::Controls, Topic::Wishes, Topic::Lifecycle]
            .into_iter()
            .filter(|topic| self.contains(*topic))
            .collect()
    }
}

/// Subscriptions of a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    events: HashMap<EventId, Topics>,
    /// Topics followed for every event; empty when no wildcard is active.
    wildcard: Topics,
}

impl SubscriptionManager {
    /// Creates a manager that matches nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Follows `topics` for each of `ids`, and for every event when
    /// `wildcard` is set. Topics add up across repeated subscribes.
    pub fn subscribe(&mut self, ids: &[EventId], wildcard: bool, topics: Topics) {
        if wildcard {
            self.wildcard = self.wildcard.union(topics);
        }
        for id in ids {
            let entry = self.events.entry(*id).or_default();
            *entry = entry.union(topics);
        }
    }

    /// Stops following `ids` entirely, and drops the wildcard when
    /// `wildcard` is set.
    pub fn unsubscribe(&mut self, ids: &[EventId], wildcard: bool) {
        if wildcard {
            self.wildcard = Topics::default();
        }
        for id in ids {
            self.events.remove(id);
        }
    }

    /// Topics followed for `event_id`, wildcard included.
    #[must_use]
    pub fn topics_for(&self, event_id: EventId) -> Topics {
        let explicit = self.events.get(&event_id).copied().unwrap_or_default();
        explicit.union(self.wildcard)
    }

    /// Returns `true` if `event` should be forwarded to this connection.
    #[must_use]
    pub fn matches(&self, event: &WallEvent) -> bool {
        self.topics_for(event.event_id()).contains(Topic::of(event))
    }

    /// Number of explicitly subscribed events.
    #[must_use]
    pub fn count(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if the wildcard is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        !self.wildcard.is_empty()
    }
}
