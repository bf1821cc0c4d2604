//! Cursor walk that keeps a display queue fed.
//!
//! The engine starts in [`FetchMode::Backfill`], walking eligible wishes
//! newest-to-oldest one batch per tick. The first empty backfill batch
//! switches it to [`FetchMode::Forward`], where it tails wishes created
//! after the newest one seen, oldest first, so a burst larger than one batch
//! is drained over several ticks without gaps.

use serde::Serialize;

use crate::domain::{CursorList, Wish, WishCursor};
use crate::store::{CursorRange, SortOrder, WishFilter, WishQuery};

/// Which direction the next query walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Fetch older history.
    #[default]
    Backfill,
    /// Tail content newer than anything seen.
    Forward,
}

/// What applying a batch did to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The batch should be appended to the queue.
    Appended(usize),
    /// History is exhausted; the engine now tails new content.
    SwitchedToForward,
    /// Forward poll found nothing new.
    Idle,
    /// The batch was fetched in a mode the engine has since left.
    Stale,
}

/// Backward/forward cursor walk over one event's eligible wishes.
#[derive(Debug, Clone)]
pub struct PaginationEngine {
    mode: FetchMode,
    batch_size: u32,
    oldest: Option<WishCursor>,
    newest: Option<WishCursor>,
    /// Diagnostic only: queries never read it, they resume from `oldest`.
    backfill_pages: CursorList<WishCursor>,
}

impl PaginationEngine {
    /// Creates an engine in backfill mode with no cursors.
    #[must_use]
    pub fn new(batch_size: u32) -> Self {
        Self {
            mode: FetchMode::Backfill,
            batch_size: batch_size.max(1),
            oldest: None,
            newest: None,
            backfill_pages: CursorList::new(),
        }
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> FetchMode {
        self.mode
    }

    /// Oldest wish seen while backfilling.
    #[must_use]
    pub const fn oldest(&self) -> Option<&WishCursor> {
        self.oldest.as_ref()
    }

    /// Newest wish seen in either mode.
    #[must_use]
    pub const fn newest(&self) -> Option<&WishCursor> {
        self.newest.as_ref()
    }

    /// Cursor at the end of every backfill batch, by batch number. Kept
    /// for logging and inspection; the walk itself only needs `oldest`.
    #[must_use]
    pub const fn backfill_pages(&self) -> &CursorList<WishCursor> {
        &self.backfill_pages
    }

    /// Query for the next tick.
    #[must_use]
    pub fn next_query(&self) -> WishQuery {
        let base = WishQuery::latest(self.batch_size).with_filter(WishFilter::Eligible);
        match self.mode {
            FetchMode::Backfill => base.with_range(
                self.oldest
                    .map_or(CursorRange::Unbounded, CursorRange::Before),
            ),
            FetchMode::Forward => base
                .with_order(SortOrder::Asc)
                .with_range(self.newest.map_or(CursorRange::Unbounded, CursorRange::After)),
        }
    }

    /// Folds a batch fetched in `mode` into the cursors.
    ///
    /// Backfill batches are newest-first, forward batches oldest-first, so
    /// in both cases the last item is the new boundary.
    pub fn apply(&mut self, mode: FetchMode, batch: &[Wish]) -> BatchOutcome {
        if mode != self.mode {
            return BatchOutcome::Stale;
        }
        let (Some(first), Some(last)) = (batch.first(), batch.last()) else {
            return match self.mode {
                FetchMode::Backfill => {
                    self.mode = FetchMode::Forward;
                    BatchOutcome::SwitchedToForward
                }
                FetchMode::Forward => BatchOutcome::Idle,
            };
        };

        match self.mode {
            FetchMode::Backfill => {
                if self.newest.is_none() {
                    self.newest = Some(first.cursor());
                }
                let boundary = last.cursor();
                self.oldest = Some(self.oldest.map_or(boundary, |seen| seen.min(boundary)));
                let page = self.backfill_pages.furthest_page() + 1;
                self.backfill_pages.record(page, boundary);
            }
            FetchMode::Forward => {
                let boundary = last.cursor();
                self.newest = Some(self.newest.map_or(boundary, |seen| seen.max(boundary)));
            }
        }
        BatchOutcome::Appended(batch.len())
    }

    /// Forgets every cursor and returns to backfill mode.
    pub fn reset(&mut self) {
        self.mode = FetchMode::Backfill;
        self.oldest = None;
        self.newest = None;
        self.backfill_pages.clear();
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::store::memory::tests::{new_event, new_wish};
    use crate::store::{ContentStore, InMemoryContentStore};

    async fn seeded(count: usize) -> (InMemoryContentStore, crate::domain::EventId, Vec<Wish>) {
        let store = InMemoryContentStore::new();
        let Ok(event) = store.create_event(new_event("wall")).await else {
            panic!("event should be created");
        };
        let mut created = Vec::new();
        for i in 0..count {
            let Ok(wish) = store.create_wish(event.id, new_wish(&format!("g{i}"), true)).await
            else {
                panic!("wish should be created");
            };
            created.push(wish);
        }
        (store, event.id, created)
    }

    async fn tick(
        engine: &mut PaginationEngine,
        store: &InMemoryContentStore,
        event_id: crate::domain::EventId,
    ) -> (BatchOutcome, usize) {
        let mode = engine.mode();
        let Ok(batch) = store.query_wishes(event_id, engine.next_query()).await else {
            panic!("query should succeed");
        };
        (engine.apply(mode, &batch), batch.len())
    }

    #[test]
    fn first_backfill_query_is_unbounded_newest_first() {
        let engine = PaginationEngine::new(10);
        let query = engine.next_query();
        assert_eq!(query.filter, WishFilter::Eligible);
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!(query.range, CursorRange::Unbounded);
        assert_eq!(query.limit, 10);
    }

    #[tokio::test]
    async fn backfills_in_batches_then_switches_to_forward() {
        let (store, event_id, _) = seeded(25).await;
        let mut engine = PaginationEngine::new(10);

        let mut sizes = Vec::new();
        for _ in 0..3 {
            let (outcome, len) = tick(&mut engine, &store, event_id).await;
            assert_eq!(outcome, BatchOutcome::Appended(len));
            sizes.push(len);
        }
        assert_eq!(sizes, vec![10, 10, 5]);
        assert_eq!(engine.mode(), FetchMode::Backfill);
        assert_eq!(engine.backfill_pages().furthest_page(), 3);

        let (outcome, _) = tick(&mut engine, &store, event_id).await;
        assert_eq!(outcome, BatchOutcome::SwitchedToForward);
        assert_eq!(engine.mode(), FetchMode::Forward);
    }

    #[tokio::test]
    async fn cursors_are_monotonic() {
        let (store, event_id, created) = seeded(23).await;
        let mut engine = PaginationEngine::new(5);

        let mut previous_oldest: Option<WishCursor> = None;
        while engine.mode() == FetchMode::Backfill {
            tick(&mut engine, &store, event_id).await;
            if let (Some(prev), Some(now)) = (previous_oldest, engine.oldest().copied()) {
                assert!(now <= prev);
            }
            previous_oldest = engine.oldest().copied();
        }
        assert_eq!(engine.newest().copied(), created.last().map(Wish::cursor));
        assert_eq!(engine.oldest().copied(), created.first().map(Wish::cursor));

        let mut previous_newest = engine.newest().copied();
        for i in 0..12 {
            let Ok(_) = store.create_wish(event_id, new_wish(&format!("late{i}"), true)).await
            else {
                panic!("wish should be created");
            };
        }
        for _ in 0..4 {
            tick(&mut engine, &store, event_id).await;
            let now = engine.newest().copied();
            assert!(now >= previous_newest);
            previous_newest = now;
        }
    }

    #[tokio::test]
    async fn forward_drains_bursts_larger_than_a_batch() {
        let (store, event_id, _) = seeded(0).await;
        let mut engine = PaginationEngine::new(4);
        assert_eq!(
            tick(&mut engine, &store, event_id).await.0,
            BatchOutcome::SwitchedToForward
        );

        let mut burst = Vec::new();
        for i in 0..10 {
            let Ok(wish) = store.create_wish(event_id, new_wish(&format!("b{i}"), true)).await
            else {
                panic!("wish should be created");
            };
            burst.push(wish.id);
        }

        let mut seen = Vec::new();
        loop {
            let mode = engine.mode();
            let Ok(batch) = store.query_wishes(event_id, engine.next_query()).await else {
                panic!("query should succeed");
            };
            if engine.apply(mode, &batch) == BatchOutcome::Idle {
                break;
            }
            seen.extend(batch.iter().map(|w| w.id));
        }
        assert_eq!(seen, burst);
    }

    #[tokio::test]
    async fn ineligible_wishes_stay_hidden_until_approved() {
        let (store, event_id, _) = seeded(2).await;
        let Ok(hidden) = store.create_wish(event_id, new_wish("shy", false)).await else {
            panic!("wish should be created");
        };
        let mut engine = PaginationEngine::new(10);
        let (outcome, len) = tick(&mut engine, &store, event_id).await;
        assert_eq!(outcome, BatchOutcome::Appended(2));
        assert_eq!(len, 2);

        let Ok(_) = store
            .update_wish(event_id, hidden.id, crate::domain::WishPatch::approved(true))
            .await
        else {
            panic!("approval should succeed");
        };

        // Newer than everything seen, so the forward tail picks it up.
        tick(&mut engine, &store, event_id).await;
        assert_eq!(engine.mode(), FetchMode::Forward);
        let mode = engine.mode();
        let Ok(batch) = store.query_wishes(event_id, engine.next_query()).await else {
            panic!("query should succeed");
        };
        assert_eq!(engine.apply(mode, &batch), BatchOutcome::Appended(1));
        assert_eq!(batch.first().map(|w| w.id), Some(hidden.id));
    }

    #[test]
    fn batches_from_a_previous_mode_are_stale() {
        let mut engine = PaginationEngine::new(10);
        assert_eq!(engine.apply(FetchMode::Backfill, &[]), BatchOutcome::SwitchedToForward);
        assert_eq!(engine.apply(FetchMode::Backfill, &[]), BatchOutcome::Stale);
    }

    #[test]
    fn reset_returns_to_backfill() {
        let mut engine = PaginationEngine::new(10);
        engine.apply(FetchMode::Backfill, &[]);
        engine.reset();
        assert_eq!(engine.mode(), FetchMode::Backfill);
        assert!(engine.oldest().is_none());
        assert!(engine.newest().is_none());
        assert!(engine.backfill_pages().is_empty());
    }
}
