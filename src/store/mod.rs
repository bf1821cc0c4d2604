//! External collaborators: the realtime controls tree and the ordered
//! content store.
//!
//! The core only talks to these through [`ControlsStore`] and
//! [`ContentStore`]. [`memory`] implements both in-process;
//! [`postgres`] implements the content store on PostgreSQL.

pub mod memory;
pub mod postgres;
pub mod subscription;

use async_trait::async_trait;

use crate::domain::{
    Controls, ControlsPatch, Event, EventCursor, EventId, EventPatch, NewEvent, NewWish, Wish,
    WishCursor, WishId, WishPatch,
};
use crate::error::WallError;

pub use memory::{InMemoryContentStore, InMemoryControlsStore};
pub use postgres::PostgresContentStore;
pub use subscription::ControlsSubscription;

/// Which wishes a query may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WishFilter {
    /// Every wish of the event.
    #[default]
    All,
    /// `approved == true`.
    Approved,
    /// `approved == true AND public == true`: playable on displays.
    Eligible,
}

impl WishFilter {
    /// Returns `true` if `wish` passes the filter.
    #[must_use]
    pub const fn matches(&self, wish: &Wish) -> bool {
        match self {
            Self::All => true,
            Self::Approved => wish.approved,
            Self::Eligible => wish.is_eligible(),
        }
    }
}

/// Sort direction on `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest first.
    #[default]
    Desc,
    /// Oldest first.
    Asc,
}

/// Range bound of a cursor query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorRange<C> {
    /// No bound: start at the head of the chosen ordering.
    #[default]
    Unbounded,
    /// Strictly before the cursor.
    Before(C),
    /// Strictly after the cursor.
    After(C),
}

impl<C: PartialOrd> CursorRange<C> {
    /// Returns `true` if `position` lies inside the range.
    pub fn contains(&self, position: &C) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Before(bound) => position < bound,
            Self::After(bound) => position > bound,
        }
    }
}

/// Range query over an event's wishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WishQuery {
    /// Server-side filter.
    pub filter: WishFilter,
    /// Cursor bound.
    pub range: CursorRange<WishCursor>,
    /// Ordering on `created_at`.
    pub order: SortOrder,
    /// Maximum number of results.
    pub limit: u32,
}

impl WishQuery {
    /// Newest-first page of all wishes.
    #[must_use]
    pub fn latest(limit: u32) -> Self {
        Self {
            filter: WishFilter::All,
            range: CursorRange::Unbounded,
            order: SortOrder::Desc,
            limit,
        }
    }

    /// Replaces the filter.
    #[must_use]
    pub const fn with_filter(mut self, filter: WishFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Replaces the range.
    #[must_use]
    pub const fn with_range(mut self, range: CursorRange<WishCursor>) -> Self {
        self.range = range;
        self
    }

    /// Replaces the ordering.
    #[must_use]
    pub const fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }
}

/// Newest-first page query over events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventQuery {
    /// Only return events with `is_active == true`.
    pub active_only: bool,
    /// Resume strictly after this cursor (in newest-first order).
    pub after: Option<EventCursor>,
    /// Maximum number of results.
    pub limit: u32,
}

/// Realtime key-value tree holding one [`Controls`] record per event.
///
/// Writes are partial and last-write-wins per field. Subscriptions yield
/// the current value first, then every later value.
#[async_trait]
pub trait ControlsStore: Send + Sync + std::fmt::Debug {
    /// Reads the current controls of an event (defaults if never written).
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Store`] if the store is unreachable.
    async fn get(&self, event_id: EventId) -> Result<Controls, WallError>;

    /// Applies a partial update and returns the resulting snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Store`] if the write fails.
    async fn update(&self, event_id: EventId, patch: ControlsPatch)
    -> Result<Controls, WallError>;

    /// Subscribes to the controls of an event.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Store`] if the subscription cannot be opened.
    async fn subscribe(&self, event_id: EventId) -> Result<ControlsSubscription, WallError>;

    /// Drops the controls record of a deleted event. Returns `true` if a
    /// record existed.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Store`] if the write fails.
    async fn remove(&self, event_id: EventId) -> Result<bool, WallError>;
}

/// Ordered document store for events and their wishes.
#[async_trait]
pub trait ContentStore: Send + Sync + std::fmt::Debug {
    /// Stores a new, already validated event.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Store`] on write failure.
    async fn create_event(&self, new: NewEvent) -> Result<Event, WallError>;

    /// Reads one event.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Store`] on read failure.
    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, WallError>;

    /// Reads a page of events, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Store`] on read failure.
    async fn list_events(&self, query: EventQuery) -> Result<Vec<Event>, WallError>;

    /// Counts events, optionally only active ones.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Store`] on read failure.
    async fn count_events(&self, active_only: bool) -> Result<u64, WallError>;

    /// Applies a partial update to an event.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::EventNotFound`] if the event does not exist.
    async fn update_event(&self, event_id: EventId, patch: EventPatch)
    -> Result<Event, WallError>;

    /// Deletes an event. Its wishes are left in place.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::EventNotFound`] if the event does not exist.
    async fn delete_event(&self, event_id: EventId) -> Result<(), WallError>;

    /// Stores a new wish with a server-assigned timestamp and increments
    /// the event's `total_wishes` in the same operation.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::EventNotFound`] if the event does not exist.
    async fn create_wish(&self, event_id: EventId, new: NewWish) -> Result<Wish, WallError>;

    /// Reads one wish.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Store`] on read failure.
    async fn get_wish(&self, event_id: EventId, wish_id: WishId)
    -> Result<Option<Wish>, WallError>;

    /// Applies a partial update to a wish.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::WishNotFound`] if the wish does not exist.
    async fn update_wish(
        &self,
        event_id: EventId,
        wish_id: WishId,
        patch: WishPatch,
    ) -> Result<Wish, WallError>;

    /// Deletes a wish and decrements the event's `total_wishes` (never
    /// below zero).
    ///
    /// # Errors
    ///
    /// Returns [`WallError::WishNotFound`] if the wish does not exist.
    async fn delete_wish(&self, event_id: EventId, wish_id: WishId) -> Result<(), WallError>;

    /// Runs a filtered, ordered, cursor-bounded range query.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Store`] on read failure.
    async fn query_wishes(&self, event_id: EventId, query: WishQuery)
    -> Result<Vec<Wish>, WallError>;

    /// Counts the wishes of an event that pass `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Store`] on read failure.
    async fn count_wishes(&self, event_id: EventId, filter: WishFilter) -> Result<u64, WallError>;
}
