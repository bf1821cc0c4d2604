//! "Jump to page N" over cursor-paginated listings.
//!
//! Cursor stores cannot seek by offset, so the pager remembers the cursor
//! at the end of every page it has loaded. Pages up to one past the
//! furthest known page resolve with a single query; anything beyond walks
//! forward from the furthest known page.

use async_trait::async_trait;

use crate::domain::{CursorList, Event, EventCursor, EventId, Wish, WishCursor};
use crate::error::WallError;
use crate::service::WallService;

/// A listing that can be read one page at a time after a cursor.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Listed item.
    type Item: Send;
    /// Position of an item in the listing.
    type Cursor: Clone + Send + Sync + std::fmt::Debug;

    /// Reads up to `limit` items strictly after `after`.
    async fn fetch(
        &self,
        after: Option<Self::Cursor>,
        limit: u32,
    ) -> Result<Vec<Self::Item>, WallError>;

    /// Cursor of an item.
    fn cursor_of(item: &Self::Item) -> Self::Cursor;
}

/// Page navigator backed by a [`CursorList`].
#[derive(Debug)]
pub struct CursorPager<S: PageSource> {
    source: S,
    per_page: u32,
    pages: CursorList<S::Cursor>,
}

impl<S: PageSource> CursorPager<S> {
    /// Creates a pager with `per_page` items per page.
    #[must_use]
    pub fn new(source: S, per_page: u32) -> Self {
        Self {
            source,
            per_page: per_page.max(1),
            pages: CursorList::new(),
        }
    }

    /// Highest page whose end cursor is known.
    #[must_use]
    pub fn furthest_page(&self) -> u32 {
        self.pages.furthest_page()
    }

    /// Forgets every cursor, e.g. after the listing was filtered.
    pub fn reset(&mut self) {
        self.pages.clear();
    }

    /// Loads page `page` (1-based; 0 is treated as 1). Returns an empty
    /// list for pages past the end.
    ///
    /// # Errors
    ///
    /// Propagates the source's error.
    pub async fn page(&mut self, page: u32) -> Result<Vec<S::Item>, WallError> {
        let page = page.max(1);
        let mut next = match self.pages.cursor_before(page) {
            Some(_) => page,
            None => self.pages.furthest_page() + 1,
        };
        loop {
            let Some(after) = self.pages.cursor_before(next) else {
                return Ok(Vec::new());
            };
            let items = self.source.fetch(after, self.per_page).await?;
            let full = u32::try_from(items.len()).is_ok_and(|n| n >= self.per_page);
            match items.last() {
                Some(last) => self.pages.record(next, S::cursor_of(last)),
                None => self.pages.truncate_after(next.saturating_sub(1)),
            }
            if !full {
                self.pages.truncate_after(next);
            }
            if next >= page {
                return Ok(items);
            }
            if !full {
                tracing::debug!(requested = page, last = next, "page past the end of the listing");
                return Ok(Vec::new());
            }
            next += 1;
        }
    }
}

/// Wishes of one event, newest first, as seen by the admin table.
#[derive(Debug, Clone)]
pub struct WishPages {
    service: WallService,
    event_id: EventId,
    approved_only: bool,
}

impl WishPages {
    /// Creates a source over `event_id`'s wishes.
    #[must_use]
    pub const fn new(service: WallService, event_id: EventId, approved_only: bool) -> Self {
        Self {
            service,
            event_id,
            approved_only,
        }
    }
}

#[async_trait]
impl PageSource for WishPages {
    type Item = Wish;
    type Cursor = WishCursor;

    async fn fetch(&self, after: Option<WishCursor>, limit: u32) -> Result<Vec<Wish>, WallError> {
        let page = self
            .service
            .list_wishes(self.event_id, after, limit, self.approved_only)
            .await?;
        Ok(page.items)
    }

    fn cursor_of(item: &Wish) -> WishCursor {
        item.cursor()
    }
}

/// Events, newest first, as seen by the admin table.
#[derive(Debug, Clone)]
pub struct EventPages {
    service: WallService,
    active_only: bool,
}

impl EventPages {
    /// Creates a source over all (or only active) events.
    #[must_use]
    pub const fn new(service: WallService, active_only: bool) -> Self {
        Self {
            service,
            active_only,
        }
    }
}

#[async_trait]
impl PageSource for EventPages {
    type Item = Event;
    type Cursor = EventCursor;

    async fn fetch(&self, after: Option<EventCursor>, limit: u32) -> Result<Vec<Event>, WallError> {
        let page = self
            .service
            .list_events(self.active_only, after, limit)
            .await?;
        Ok(page.items)
    }

    fn cursor_of(item: &Event) -> EventCursor {
        item.cursor()
    }
}
