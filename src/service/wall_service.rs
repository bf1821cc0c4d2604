//! Wall service: validates input, talks to the content store and emits
//! change events.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    Event, EventBus, EventCursor, EventId, EventPatch, NewEvent, NewWish, WallEvent, Wish,
    WishCursor, WishId, WishPatch,
};
use crate::error::WallError;
use crate::store::{ContentStore, CursorRange, EventQuery, WishFilter, WishQuery};

/// Largest page a list call returns.
pub const MAX_PER_PAGE: u32 = 100;

/// One page of a newest-first listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Whether another page follows.
    pub has_next: bool,
    /// Token of the last item, to request the next page with.
    pub next_cursor: Option<String>,
    /// Number of items across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    /// Builds a page from a `limit + 1` fetch: the extra item only proves
    /// that a next page exists and is dropped.
    fn from_probe<C: ToString>(
        mut items: Vec<T>,
        per_page: u32,
        total: u64,
        cursor_of: impl Fn(&T) -> C,
    ) -> Self {
        let per_page = usize::try_from(per_page).unwrap_or(usize::MAX);
        let has_next = items.len() > per_page;
        items.truncate(per_page);
        let next_cursor = if has_next {
            items.last().map(|item| cursor_of(item).to_string())
        } else {
            None
        };
        Self {
            items,
            has_next,
            next_cursor,
            total,
        }
    }
}

/// Orchestration layer for events and wishes.
///
/// Stateless coordinator over a [`ContentStore`] and the [`EventBus`].
/// Every mutation follows the same shape: validate, write, emit, return.
/// Nothing reaches the store until validation passed.
#[derive(Debug, Clone)]
pub struct WallService {
    content: Arc<dyn ContentStore>,
    event_bus: EventBus,
}

impl WallService {
    /// Creates a new `WallService`.
    #[must_use]
    pub fn new(content: Arc<dyn ContentStore>, event_bus: EventBus) -> Self {
        Self { content, event_bus }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub const fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns the content store.
    #[must_use]
    pub const fn content(&self) -> &Arc<dyn ContentStore> {
        &self.content
    }

    /// Creates an event.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Validation`] for invalid input, or a store
    /// error.
    pub async fn create_event(&self, new: NewEvent) -> Result<Event, WallError> {
        WallError::check(new.validate())?;
        let event = self.content.create_event(new).await?;

        let _ = self.event_bus.publish(WallEvent::EventCreated {
            event_id: event.id,
            name: event.name.clone(),
            timestamp: Utc::now(),
        });

        tracing::info!(event_id = %event.id, name = %event.name, "event created");
        Ok(event)
    }

    /// Reads one event.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::EventNotFound`] if the id does not resolve.
    pub async fn get_event(&self, event_id: EventId) -> Result<Event, WallError> {
        self.content
            .get_event(event_id)
            .await?
            .ok_or(WallError::EventNotFound(event_id))
    }

    /// Lists events newest first, resuming after `after`.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn list_events(
        &self,
        active_only: bool,
        after: Option<EventCursor>,
        per_page: u32,
    ) -> Result<Page<Event>, WallError> {
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        let items = self
            .content
            .list_events(EventQuery {
                active_only,
                after,
                limit: per_page + 1,
            })
            .await?;
        let total = self.content.count_events(active_only).await?;
        Ok(Page::from_probe(items, per_page, total, Event::cursor))
    }

    /// Applies a partial update to an event.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::EventNotFound`] or [`WallError::Validation`].
    pub async fn update_event(
        &self,
        event_id: EventId,
        patch: EventPatch,
    ) -> Result<Event, WallError> {
        let current = self.get_event(event_id).await?;
        WallError::check(patch.validate(&current))?;
        let event = self.content.update_event(event_id, patch).await?;

        let _ = self.event_bus.publish(WallEvent::EventUpdated {
            event_id,
            is_active: event.is_active,
            timestamp: Utc::now(),
        });

        tracing::info!(%event_id, is_active = event.is_active, "event updated");
        Ok(event)
    }

    /// Flips the active flag of an event.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::EventNotFound`] if the id does not resolve.
    pub async fn toggle_event_active(&self, event_id: EventId) -> Result<Event, WallError> {
        let current = self.get_event(event_id).await?;
        self.update_event(event_id, EventPatch::active(!current.is_active))
            .await
    }

    /// Deletes an event. Its wishes are left in the store.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::EventNotFound`] if the id does not resolve.
    pub async fn delete_event(&self, event_id: EventId) -> Result<(), WallError> {
        self.content.delete_event(event_id).await?;

        let _ = self.event_bus.publish(WallEvent::EventDeleted {
            event_id,
            timestamp: Utc::now(),
        });

        tracing::info!(%event_id, "event deleted");
        Ok(())
    }

    /// Submits a wish. Validation runs before any store access.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Validation`] for invalid input or
    /// [`WallError::EventNotFound`] if the event does not exist.
    pub async fn create_wish(&self, event_id: EventId, new: NewWish) -> Result<Wish, WallError> {
        WallError::check(new.validate())?;
        let wish = self.content.create_wish(event_id, new).await?;

        let _ = self.event_bus.publish(WallEvent::WishCreated {
            event_id,
            wish_id: wish.id,
            eligible: wish.is_eligible(),
            timestamp: Utc::now(),
        });

        tracing::info!(%event_id, wish_id = %wish.id, eligible = wish.is_eligible(), "wish created");
        Ok(wish)
    }

    /// Reads one wish.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::WishNotFound`] if the id does not resolve.
    pub async fn get_wish(&self, event_id: EventId, wish_id: WishId) -> Result<Wish, WallError> {
        self.content
            .get_wish(event_id, wish_id)
            .await?
            .ok_or(WallError::WishNotFound(wish_id))
    }

    /// Lists an event's wishes newest first, resuming after `after`.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::EventNotFound`] if the event does not exist.
    pub async fn list_wishes(
        &self,
        event_id: EventId,
        after: Option<WishCursor>,
        per_page: u32,
        approved_only: bool,
    ) -> Result<Page<Wish>, WallError> {
        self.get_event(event_id).await?;
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        let filter = if approved_only {
            WishFilter::Approved
        } else {
            WishFilter::All
        };
        let query = WishQuery::latest(per_page + 1)
            .with_filter(filter)
            .with_range(after.map_or(CursorRange::Unbounded, CursorRange::Before));
        let items = self.content.query_wishes(event_id, query).await?;
        let total = self.content.count_wishes(event_id, filter).await?;
        Ok(Page::from_probe(items, per_page, total, Wish::cursor))
    }

    /// Applies a partial update to a wish.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::Validation`] or [`WallError::WishNotFound`].
    pub async fn update_wish(
        &self,
        event_id: EventId,
        wish_id: WishId,
        patch: WishPatch,
    ) -> Result<Wish, WallError> {
        WallError::check(patch.validate())?;
        let wish = self.content.update_wish(event_id, wish_id, patch).await?;

        let _ = self.event_bus.publish(WallEvent::WishUpdated {
            event_id,
            wish_id,
            eligible: wish.is_eligible(),
            timestamp: Utc::now(),
        });

        tracing::info!(%event_id, %wish_id, approved = wish.approved, "wish updated");
        Ok(wish)
    }

    /// Flips the approval flag of a wish.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::WishNotFound`] if the id does not resolve.
    pub async fn toggle_wish_approval(
        &self,
        event_id: EventId,
        wish_id: WishId,
    ) -> Result<Wish, WallError> {
        let current = self.get_wish(event_id, wish_id).await?;
        self.update_wish(event_id, wish_id, WishPatch::approved(!current.approved))
            .await
    }

    /// Deletes a wish and decrements the event counter.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::WishNotFound`] if the id does not resolve.
    pub async fn delete_wish(&self, event_id: EventId, wish_id: WishId) -> Result<(), WallError> {
        self.content.delete_wish(event_id, wish_id).await?;

        let _ = self.event_bus.publish(WallEvent::WishDeleted {
            event_id,
            wish_id,
            timestamp: Utc::now(),
        });

        tracing::info!(%event_id, %wish_id, "wish deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::store::InMemoryContentStore;
    use crate::store::memory::tests::{new_event, new_wish};

    fn make_service() -> WallService {
        WallService::new(Arc::new(InMemoryContentStore::new()), EventBus::new(1000))
    }

    async fn make_event(service: &WallService) -> Event {
        let Ok(event) = service.create_event(new_event("gala")).await else {
            panic!("event creation failed");
        };
        event
    }

    #[tokio::test]
    async fn create_event_emits_event() {
        let service = make_service();
        let mut rx = service.event_bus().subscribe();
        let event = make_event(&service).await;

        let Ok(WallEvent::EventCreated { event_id, name, .. }) = rx.try_recv() else {
            panic!("expected EventCreated");
        };
        assert_eq!(event_id, event.id);
        assert_eq!(name, "gala");
    }

    #[tokio::test]
    async fn invalid_event_is_rejected_before_writing() {
        let service = make_service();
        let mut rx = service.event_bus().subscribe();
        let result = service.create_event(NewEvent::default()).await;
        let Err(WallError::Validation(errors)) = result else {
            panic!("expected validation error");
        };
        assert!(errors.len() >= 3);
        assert!(rx.try_recv().is_err());
        let Ok(page) = service.list_events(false, None, 10).await else {
            panic!("listing failed");
        };
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn toggle_event_active_flips_flag() {
        let service = make_service();
        let event = make_event(&service).await;
        let Ok(toggled) = service.toggle_event_active(event.id).await else {
            panic!("toggle failed");
        };
        assert_eq!(toggled.is_active, !event.is_active);
    }

    #[tokio::test]
    async fn missing_event_is_not_found() {
        let service = make_service();
        let missing = EventId::new();
        assert!(matches!(
            service.get_event(missing).await,
            Err(WallError::EventNotFound(id)) if id == missing
        ));
        assert!(matches!(
            service.create_wish(missing, new_wish("ana", true)).await,
            Err(WallError::EventNotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_wish_never_reaches_the_store() {
        let service = make_service();
        let event = make_event(&service).await;
        let mut wish = new_wish("ana", true);
        wish.message = "x".repeat(501);
        assert!(matches!(
            service.create_wish(event.id, wish).await,
            Err(WallError::Validation(_))
        ));
        let Ok(event) = service.get_event(event.id).await else {
            panic!("event should exist");
        };
        assert_eq!(event.total_wishes, 0);
    }

    #[tokio::test]
    async fn wish_counter_follows_create_and_delete() {
        let service = make_service();
        let event = make_event(&service).await;
        let Ok(wish) = service.create_wish(event.id, new_wish("ana", false)).await else {
            panic!("wish creation failed");
        };
        let Ok(after_create) = service.get_event(event.id).await else {
            panic!("event should exist");
        };
        assert_eq!(after_create.total_wishes, 1);

        let Ok(()) = service.delete_wish(event.id, wish.id).await else {
            panic!("delete failed");
        };
        let Ok(after_delete) = service.get_event(event.id).await else {
            panic!("event should exist");
        };
        assert_eq!(after_delete.total_wishes, 0);
    }

    #[tokio::test]
    async fn toggle_wish_approval_reports_eligibility() {
        let service = make_service();
        let event = make_event(&service).await;
        let Ok(wish) = service.create_wish(event.id, new_wish("ana", false)).await else {
            panic!("wish creation failed");
        };
        let mut rx = service.event_bus().subscribe();
        let Ok(toggled) = service.toggle_wish_approval(event.id, wish.id).await else {
            panic!("toggle failed");
        };
        assert!(toggled.approved);
        let Ok(WallEvent::WishUpdated { eligible, .. }) = rx.try_recv() else {
            panic!("expected WishUpdated");
        };
        assert!(eligible);
    }

    #[tokio::test]
    async fn wish_listing_pages_with_probe() {
        let service = make_service();
        let event = make_event(&service).await;
        for i in 0..5 {
            let Ok(_) = service
                .create_wish(event.id, new_wish(&format!("g{i}"), i % 2 == 0))
                .await
            else {
                panic!("wish creation failed");
            };
        }

        let Ok(first) = service.list_wishes(event.id, None, 2, false).await else {
            panic!("listing failed");
        };
        assert_eq!(first.items.len(), 2);
        assert!(first.has_next);
        assert_eq!(first.total, 5);
        assert_eq!(first.items.first().map(|w| w.user_name.as_str()), Some("g4"));

        let Some(token) = first.next_cursor else {
            panic!("expected a next cursor");
        };
        let Ok(cursor) = token.parse::<WishCursor>() else {
            panic!("cursor token should parse");
        };
        let Ok(second) = service.list_wishes(event.id, Some(cursor), 2, false).await else {
            panic!("listing failed");
        };
        assert_eq!(second.items.first().map(|w| w.user_name.as_str()), Some("g2"));

        let Ok(approved) = service.list_wishes(event.id, None, 10, true).await else {
            panic!("listing failed");
        };
        assert_eq!(approved.total, 3);
        assert!(!approved.has_next);
        assert!(approved.next_cursor.is_none());
    }
}
