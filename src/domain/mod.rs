//! Domain layer: identifiers, the controls record, events, wishes,
//! cursors, and the change-notification bus.

pub mod controls;
pub mod cursor;
pub mod event;
pub mod event_bus;
pub mod ids;
pub mod wall_event;
pub mod wish;

pub use controls::{Controls, ControlsPatch};
pub use cursor::{
    CursorList, CursorParseError, EventCursor, TimeCursor, WishCursor, truncate_to_micros,
};
pub use event::{Event, EventPatch, EventSettings, NewEvent};
pub use event_bus::EventBus;
pub use ids::{EventId, WishId};
pub use wall_event::WallEvent;
pub use wish::{DeviceType, GeoPoint, NewWish, Wish, WishPatch};
