//! In-process implementations of the controls tree and the content store.
//!
//! Both keep their state behind a [`tokio::sync::RwLock`]. The controls
//! store publishes every write on the [`EventBus`] while still holding the
//! write lock, so subscribers see snapshots in the order they were
//! applied.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::{
    ContentStore, ControlsStore, ControlsSubscription, CursorRange, EventQuery, SortOrder,
    WishFilter, WishQuery,
};
use crate::domain::{
    Controls, ControlsPatch, Event, EventBus, EventId, EventPatch, NewEvent, NewWish, WallEvent,
    Wish, WishCursor, WishId, WishPatch, truncate_to_micros,
};
use crate::error::WallError;

/// Realtime controls tree kept in memory.
#[derive(Debug)]
pub struct InMemoryControlsStore {
    records: RwLock<HashMap<EventId, Controls>>,
    event_bus: EventBus,
}

impl InMemoryControlsStore {
    /// Creates an empty tree that publishes changes on `event_bus`.
    #[must_use]
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            event_bus,
        }
    }
}

#[async_trait]
impl ControlsStore for InMemoryControlsStore {
    async fn get(&self, event_id: EventId) -> Result<Controls, WallError> {
        Ok(self
            .records
            .read()
            .await
            .get(&event_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update(
        &self,
        event_id: EventId,
        patch: ControlsPatch,
    ) -> Result<Controls, WallError> {
        let mut records = self.records.write().await;
        let entry = records.entry(event_id).or_default();
        *entry = entry.patched(&patch);
        let controls = entry.clone();
        self.event_bus.publish(WallEvent::ControlsChanged {
            event_id,
            controls: controls.clone(),
            timestamp: Utc::now(),
        });
        Ok(controls)
    }

    async fn subscribe(&self, event_id: EventId) -> Result<ControlsSubscription, WallError> {
        let rx = self.event_bus.subscribe();
        let current = self.get(event_id).await?;
        Ok(ControlsSubscription::new(event_id, current, rx))
    }

    async fn remove(&self, event_id: EventId) -> Result<bool, WallError> {
        Ok(self.records.write().await.remove(&event_id).is_some())
    }
}

/// Wishes of one event, ordered by creation and indexed by id.
#[derive(Debug, Default)]
struct EventWishes {
    by_time: BTreeMap<WishCursor, Wish>,
    index: HashMap<WishId, WishCursor>,
}

#[derive(Debug, Default)]
struct ContentTables {
    events: HashMap<EventId, Event>,
    wishes: HashMap<EventId, EventWishes>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl ContentTables {
    /// Server timestamp: microsecond precision, strictly increasing.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = truncate_to_micros(Utc::now());
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }
}

/// Ordered document store kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    tables: RwLock<ContentTables>,
}

impl InMemoryContentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn range_bounds(range: CursorRange<WishCursor>) -> (Bound<WishCursor>, Bound<WishCursor>) {
    match range {
        CursorRange::Unbounded => (Bound::Unbounded, Bound::Unbounded),
        CursorRange::Before(cursor) => (Bound::Unbounded, Bound::Excluded(cursor)),
        CursorRange::After(cursor) => (Bound::Excluded(cursor), Bound::Unbounded),
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn create_event(&self, new: NewEvent) -> Result<Event, WallError> {
        let mut tables = self.tables.write().await;
        let now = tables.next_timestamp();
        let event = Event::from_new(EventId::new(), new, now);
        tables.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, WallError> {
        Ok(self.tables.read().await.events.get(&event_id).cloned())
    }

    async fn list_events(&self, query: EventQuery) -> Result<Vec<Event>, WallError> {
        let tables = self.tables.read().await;
        let mut events: Vec<&Event> = tables
            .events
            .values()
            .filter(|e| !query.active_only || e.is_active)
            .filter(|e| query.after.is_none_or(|after| e.cursor() < after))
            .collect();
        events.sort_by_key(|e| std::cmp::Reverse(e.cursor()));
        Ok(events
            .into_iter()
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn count_events(&self, active_only: bool) -> Result<u64, WallError> {
        let tables = self.tables.read().await;
        let count = tables
            .events
            .values()
            .filter(|e| !active_only || e.is_active)
            .count();
        Ok(count as u64)
    }

    async fn update_event(
        &self,
        event_id: EventId,
        patch: EventPatch,
    ) -> Result<Event, WallError> {
        let mut tables = self.tables.write().await;
        let now = truncate_to_micros(Utc::now());
        let event = tables
            .events
            .get_mut(&event_id)
            .ok_or(WallError::EventNotFound(event_id))?;
        event.apply(patch, now);
        Ok(event.clone())
    }

    async fn delete_event(&self, event_id: EventId) -> Result<(), WallError> {
        let mut tables = self.tables.write().await;
        tables
            .events
            .remove(&event_id)
            .map(|_| ())
            .ok_or(WallError::EventNotFound(event_id))
    }

    async fn create_wish(&self, event_id: EventId, new: NewWish) -> Result<Wish, WallError> {
        let mut tables = self.tables.write().await;
        if !tables.events.contains_key(&event_id) {
            return Err(WallError::EventNotFound(event_id));
        }
        let now = tables.next_timestamp();
        let wish = Wish::from_new(WishId::new(), event_id, new, now);
        let cursor = wish.cursor();

        let bucket = tables.wishes.entry(event_id).or_default();
        bucket.index.insert(wish.id, cursor);
        bucket.by_time.insert(cursor, wish.clone());

        if let Some(event) = tables.events.get_mut(&event_id) {
            event.total_wishes = event.total_wishes.saturating_add(1);
        }
        Ok(wish)
    }

    async fn get_wish(
        &self,
        event_id: EventId,
        wish_id: WishId,
    ) -> Result<Option<Wish>, WallError> {
        let tables = self.tables.read().await;
        Ok(tables.wishes.get(&event_id).and_then(|bucket| {
            bucket
                .index
                .get(&wish_id)
                .and_then(|cursor| bucket.by_time.get(cursor))
                .cloned()
        }))
    }

    async fn update_wish(
        &self,
        event_id: EventId,
        wish_id: WishId,
        patch: WishPatch,
    ) -> Result<Wish, WallError> {
        let mut tables = self.tables.write().await;
        let bucket = tables
            .wishes
            .get_mut(&event_id)
            .ok_or(WallError::WishNotFound(wish_id))?;
        let cursor = *bucket
            .index
            .get(&wish_id)
            .ok_or(WallError::WishNotFound(wish_id))?;
        let wish = bucket
            .by_time
            .get_mut(&cursor)
            .ok_or(WallError::WishNotFound(wish_id))?;
        wish.apply(patch);
        Ok(wish.clone())
    }

    async fn delete_wish(&self, event_id: EventId, wish_id: WishId) -> Result<(), WallError> {
        let mut tables = self.tables.write().await;
        let bucket = tables
            .wishes
            .get_mut(&event_id)
            .ok_or(WallError::WishNotFound(wish_id))?;
        let cursor = bucket
            .index
            .remove(&wish_id)
            .ok_or(WallError::WishNotFound(wish_id))?;
        bucket.by_time.remove(&cursor);

        if let Some(event) = tables.events.get_mut(&event_id) {
            event.total_wishes = event.total_wishes.saturating_sub(1);
        }
        Ok(())
    }

    async fn query_wishes(
        &self,
        event_id: EventId,
        query: WishQuery,
    ) -> Result<Vec<Wish>, WallError> {
        let tables = self.tables.read().await;
        let Some(bucket) = tables.wishes.get(&event_id) else {
            return Ok(Vec::new());
        };
        let limit = query.limit as usize;
        let window = bucket
            .by_time
            .range(range_bounds(query.range))
            .map(|(_, wish)| wish)
            .filter(|wish| query.filter.matches(wish));
        let page = match query.order {
            SortOrder::Desc => window.rev().take(limit).cloned().collect(),
            SortOrder::Asc => window.take(limit).cloned().collect(),
        };
        Ok(page)
    }

    async fn count_wishes(&self, event_id: EventId, filter: WishFilter) -> Result<u64, WallError> {
        let tables = self.tables.read().await;
        let count = tables.wishes.get(&event_id).map_or(0, |bucket| {
            bucket
                .by_time
                .values()
                .filter(|wish| filter.matches(wish))
                .count()
        });
        Ok(count as u64)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::DeviceType;

    pub(crate) fn new_event(name: &str) -> NewEvent {
        let now = Utc::now();
        NewEvent {
            name: name.to_string(),
            description: "test event".to_string(),
            theme: "gold".to_string(),
            start_date: Some(now - Duration::hours(1)),
            end_date: Some(now + Duration::hours(1)),
            is_active: true,
            ..NewEvent::default()
        }
    }

    pub(crate) fn new_wish(user: &str, approved: bool) -> NewWish {
        NewWish {
            user_name: user.to_string(),
            message: format!("wish from {user}"),
            photo_url: Some(format!("https://storage.example/{user}.png")),
            approved,
            public: true,
            device_type: DeviceType::Web,
            location: None,
            color_theme: None,
        }
    }

    async fn seeded(count: usize) -> (InMemoryContentStore, EventId, Vec<Wish>) {
        let store = InMemoryContentStore::new();
        let Ok(event) = store.create_event(new_event("gala")).await else {
            panic!("event creation failed");
        };
        let mut wishes = Vec::new();
        for i in 0..count {
            let Ok(wish) = store.create_wish(event.id, new_wish(&format!("u{i}"), true)).await
            else {
                panic!("wish creation failed");
            };
            wishes.push(wish);
        }
        (store, event.id, wishes)
    }

    #[tokio::test]
    async fn controls_default_then_patch() {
        let store = InMemoryControlsStore::new(EventBus::new(16));
        let id = EventId::new();
        assert_eq!(store.get(id).await.ok(), Some(Controls::default()));

        let Ok(after) = store.update(id, ControlsPatch::start(true)).await else {
            panic!("update failed");
        };
        assert!(after.start);
        let Ok(after) = store.update(id, ControlsPatch::reload_at(7)).await else {
            panic!("update failed");
        };
        assert!(after.start);
        assert_eq!(after.reload_at, Some(7));
    }

    #[tokio::test]
    async fn remove_forgets_the_record() {
        let store = InMemoryControlsStore::new(EventBus::new(16));
        let id = EventId::new();
        let _ = store.update(id, ControlsPatch::start(true)).await;

        assert_eq!(store.remove(id).await.ok(), Some(true));
        assert_eq!(store.remove(id).await.ok(), Some(false));
        assert_eq!(store.get(id).await.ok(), Some(Controls::default()));
    }

    #[tokio::test]
    async fn subscription_yields_current_then_changes_for_its_event_only() {
        let store = InMemoryControlsStore::new(EventBus::new(16));
        let id = EventId::new();
        let other = EventId::new();
        let _ = store.update(id, ControlsPatch::start(true)).await;

        let Ok(mut sub) = store.subscribe(id).await else {
            panic!("subscribe failed");
        };
        assert_eq!(sub.next().await.map(|c| c.start), Some(true));

        let _ = store.update(other, ControlsPatch::start(true)).await;
        let _ = store.update(id, ControlsPatch::redirect(Some("/final".into()))).await;
        let Some(next) = sub.next().await else {
            panic!("expected snapshot");
        };
        assert_eq!(next.redirect.as_deref(), Some("/final"));
        assert!(next.start);
    }

    #[tokio::test]
    async fn lagging_subscription_continues_with_latest() {
        let store = InMemoryControlsStore::new(EventBus::new(2));
        let id = EventId::new();
        let Ok(mut sub) = store.subscribe(id).await else {
            panic!("subscribe failed");
        };
        let _ = sub.next().await;
        for tag in 1..=10 {
            let _ = store.update(id, ControlsPatch::reload_at(tag)).await;
        }
        let mut last = None;
        for _ in 0..2 {
            last = sub.next().await;
        }
        assert_eq!(last.and_then(|c| c.reload_at), Some(10));
    }

    #[tokio::test]
    async fn create_and_delete_maintain_counter() {
        let (store, event_id, wishes) = seeded(3).await;
        let total = store.get_event(event_id).await.ok().flatten().map(|e| e.total_wishes);
        assert_eq!(total, Some(3));

        assert!(store.delete_wish(event_id, wishes[0].id).await.is_ok());
        let total = store.get_event(event_id).await.ok().flatten().map(|e| e.total_wishes);
        assert_eq!(total, Some(2));
        assert!(matches!(
            store.delete_wish(event_id, wishes[0].id).await,
            Err(WallError::WishNotFound(_))
        ));
    }

    #[tokio::test]
    async fn wish_requires_existing_event() {
        let store = InMemoryContentStore::new();
        let result = store.create_wish(EventId::new(), new_wish("a", true)).await;
        assert!(matches!(result, Err(WallError::EventNotFound(_))));
    }

    #[tokio::test]
    async fn timestamps_strictly_increase() {
        let (_, _, wishes) = seeded(20).await;
        for pair in wishes.windows(2) {
            assert!(pair[0].created_at < pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn backward_query_walks_history() {
        let (store, event_id, wishes) = seeded(25).await;
        let query = WishQuery::latest(10).with_filter(WishFilter::Eligible);

        let Ok(first) = store.query_wishes(event_id, query).await else {
            panic!("query failed");
        };
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].id, wishes[24].id);

        let Some(oldest) = first.last().map(Wish::cursor) else {
            panic!("non-empty page");
        };
        let Ok(second) = store
            .query_wishes(event_id, query.with_range(CursorRange::Before(oldest)))
            .await
        else {
            panic!("query failed");
        };
        assert_eq!(second.len(), 10);
        assert_eq!(second[0].id, wishes[14].id);
    }

    #[tokio::test]
    async fn forward_query_ascends_after_cursor() {
        let (store, event_id, wishes) = seeded(5).await;
        let query = WishQuery::latest(10)
            .with_order(SortOrder::Asc)
            .with_range(CursorRange::After(wishes[1].cursor()));
        let Ok(page) = store.query_wishes(event_id, query).await else {
            panic!("query failed");
        };
        let ids: Vec<WishId> = page.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![wishes[2].id, wishes[3].id, wishes[4].id]);
    }

    #[tokio::test]
    async fn filters_apply_before_limit() {
        let (store, event_id, _) = seeded(2).await;
        let _ = store.create_wish(event_id, new_wish("hidden", false)).await;
        let query = WishQuery::latest(10).with_filter(WishFilter::Eligible);
        let page = store.query_wishes(event_id, query).await.unwrap_or_default();
        assert_eq!(page.len(), 2);
        assert_eq!(
            store.count_wishes(event_id, WishFilter::All).await.ok(),
            Some(3)
        );
    }

    #[tokio::test]
    async fn events_list_newest_first_with_cursor() {
        let store = InMemoryContentStore::new();
        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            let Ok(event) = store.create_event(new_event(name)).await else {
                panic!("create failed");
            };
            ids.push(event.id);
        }
        let query = EventQuery {
            active_only: false,
            after: None,
            limit: 2,
        };
        let page = store.list_events(query).await.unwrap_or_default();
        assert_eq!(page.iter().map(|e| e.id).collect::<Vec<_>>(), vec![ids[2], ids[1]]);

        let after = page.last().map(Event::cursor);
        let rest = store
            .list_events(EventQuery { after, ..query })
            .await
            .unwrap_or_default();
        assert_eq!(rest.iter().map(|e| e.id).collect::<Vec<_>>(), vec![ids[0]]);
    }

    #[tokio::test]
    async fn deleting_event_leaves_wishes_orphaned() {
        let (store, event_id, wishes) = seeded(1).await;
        assert!(store.delete_event(event_id).await.is_ok());
        let orphan = store.get_wish(event_id, wishes[0].id).await.ok().flatten();
        assert!(orphan.is_some());
    }
}
