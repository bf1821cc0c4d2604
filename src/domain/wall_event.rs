//! Change notifications emitted by every store mutation.
//!
//! Each [`WallEvent`] goes through the [`super::EventBus`]. Controls
//! changes carry the complete snapshot rather than a delta, so a receiver
//! that misses messages can always re-derive its state from the next one.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Controls, EventId, WishId};

/// Change notification for one event's data.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum WallEvent {
    /// The controls record of an event was written.
    ControlsChanged {
        /// Owning event.
        event_id: EventId,
        /// Full snapshot after the write.
        controls: Controls,
        /// Write timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A new event was created.
    EventCreated {
        /// Event identifier.
        event_id: EventId,
        /// Event name.
        name: String,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Event fields were updated.
    EventUpdated {
        /// Event identifier.
        event_id: EventId,
        /// Active flag after the update.
        is_active: bool,
        /// Update timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An event was deleted. Its wishes are not cascaded.
    EventDeleted {
        /// Event identifier.
        event_id: EventId,
        /// Deletion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A wish was submitted.
    WishCreated {
        /// Owning event.
        event_id: EventId,
        /// Wish identifier.
        wish_id: WishId,
        /// Whether the wish can already be played.
        eligible: bool,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A wish was edited or moderated.
    WishUpdated {
        /// Owning event.
        event_id: EventId,
        /// Wish identifier.
        wish_id: WishId,
        /// Whether the wish can be played after the update.
        eligible: bool,
        /// Update timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A wish was deleted.
    WishDeleted {
        /// Owning event.
        event_id: EventId,
        /// Wish identifier.
        wish_id: WishId,
        /// Deletion timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl WallEvent {
    /// Returns the event ID this change belongs to.
    #[must_use]
    pub fn event_id(&self) -> EventId {
        match self {
            Self::ControlsChanged { event_id, .. }
            | Self::EventCreated { event_id, .. }
            | Self::EventUpdated { event_id, .. }
            | Self::EventDeleted { event_id, .. }
            | Self::WishCreated { event_id, .. }
            | Self::WishUpdated { event_id, .. }
            | Self::WishDeleted { event_id, .. } => *event_id,
        }
    }

    /// Returns the change type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::ControlsChanged { .. } => "controls_changed",
            Self::EventCreated { .. } => "event_created",
            Self::EventUpdated { .. } => "event_updated",
            Self::EventDeleted { .. } => "event_deleted",
            Self::WishCreated { .. } => "wish_created",
            Self::WishUpdated { .. } => "wish_updated",
            Self::WishDeleted { .. } => "wish_deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controls_changed_serializes_snapshot() {
        let event = WallEvent::ControlsChanged {
            event_id: EventId::new(),
            controls: Controls {
                start: true,
                redirect: Some("/final".to_string()),
                reload_at: None,
            },
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(json["event_type"], "controls_changed");
        assert_eq!(json["controls"]["redirect"], "/final");
        assert_eq!(event.event_type_str(), "controls_changed");
    }

    #[test]
    fn event_id_accessor() {
        let id = EventId::new();
        let event = WallEvent::WishDeleted {
            event_id: id,
            wish_id: WishId::new(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_id(), id);
    }
}
