//! Positions in creation-time ordered collections and the per-page cursor
//! list used for non-sequential pagination.
//!
//! A [`TimeCursor`] orders by `created_at` first and by id second, so two
//! documents written in the same microsecond never straddle a page
//! boundary ambiguously. Its string token (`"<micros>:<uuid>"`) is opaque
//! to clients.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::{EventId, WishId};

/// Position of a document in a `created_at`-ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeCursor<I> {
    /// Creation timestamp of the document.
    pub created_at: DateTime<Utc>,
    /// Document id, used as tie-breaker.
    pub id: I,
}

/// Cursor over the wishes of an event.
pub type WishCursor = TimeCursor<WishId>;

/// Cursor over events.
pub type EventCursor = TimeCursor<EventId>;

impl<I> TimeCursor<I> {
    /// Creates a cursor.
    #[must_use]
    pub const fn new(created_at: DateTime<Utc>, id: I) -> Self {
        Self { created_at, id }
    }
}

impl<I: fmt::Display> fmt::Display for TimeCursor<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.created_at.timestamp_micros(), self.id)
    }
}

/// Error returned when a cursor token cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed cursor token: {0}")]
pub struct CursorParseError(String);

impl<I: FromStr> FromStr for TimeCursor<I> {
    type Err = CursorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CursorParseError(s.to_string());
        let (micros, id) = s.split_once(':').ok_or_else(malformed)?;
        let micros: i64 = micros.parse().map_err(|_| malformed())?;
        let created_at = DateTime::from_timestamp_micros(micros).ok_or_else(malformed)?;
        let id = id.parse().map_err(|_| malformed())?;
        Ok(Self { created_at, id })
    }
}

/// Truncates a timestamp to the microsecond precision cursors carry.
///
/// Stores apply this to every server-assigned `created_at` so a cursor
/// decoded from its token compares equal to the document it came from.
#[must_use]
pub fn truncate_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(ts.timestamp_micros()).unwrap_or(ts)
}

/// Ordered map from page number (1-based) to the cursor of the last
/// document on that page.
///
/// Jumping to page `n` resumes after the cursor recorded for page `n - 1`
/// instead of re-scanning from the start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorList<C> {
    pages: BTreeMap<u32, C>,
}

impl<C: Clone> CursorList<C> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
        }
    }

    /// Records the cursor at the end of `page`, replacing any earlier one.
    pub fn record(&mut self, page: u32, cursor: C) {
        self.pages.insert(page, cursor);
    }

    /// Cursor to resume from when loading `page`.
    ///
    /// Page 1 (and 0) starts from the beginning, so `Some(None)` is
    /// returned. `None` means the end of page `page - 1` is unknown.
    #[must_use]
    pub fn cursor_before(&self, page: u32) -> Option<Option<C>> {
        if page <= 1 {
            return Some(None);
        }
        self.pages.get(&(page - 1)).cloned().map(Some)
    }

    /// Cursor recorded for `page`.
    #[must_use]
    pub fn get(&self, page: u32) -> Option<&C> {
        self.pages.get(&page)
    }

    /// Highest page with a recorded cursor and that cursor.
    #[must_use]
    pub fn last(&self) -> Option<(u32, &C)> {
        self.pages.iter().next_back().map(|(page, cursor)| (*page, cursor))
    }

    /// Highest page with a recorded cursor, `0` when empty.
    #[must_use]
    pub fn furthest_page(&self) -> u32 {
        self.last().map_or(0, |(page, _)| page)
    }

    /// Drops every cursor after `page`. Used when a page comes back short,
    /// since later pages no longer exist.
    pub fn truncate_after(&mut self, page: u32) {
        self.pages.retain(|p, _| *p <= page);
    }

    /// Number of recorded pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Forgets every cursor.
    pub fn clear(&mut self) {
        self.pages.clear();
    }
}

impl<C: Clone> Default for CursorList<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn token_round_trip() {
        let cursor = WishCursor::new(truncate_to_micros(Utc::now()), WishId::new());
        let Ok(parsed) = cursor.to_string().parse::<WishCursor>() else {
            panic!("token should parse");
        };
        assert_eq!(parsed, cursor);
    }

    #[test]
    fn malformed_tokens_fail() {
        assert!("".parse::<WishCursor>().is_err());
        assert!("123".parse::<WishCursor>().is_err());
        assert!("abc:def".parse::<WishCursor>().is_err());
        assert!(format!("12:{}", "nope").parse::<EventCursor>().is_err());
    }

    #[test]
    fn orders_by_time_then_id() {
        let now = Utc::now();
        let a = WishCursor::new(now, WishId::new());
        let b = WishCursor::new(now + Duration::microseconds(1), WishId::new());
        assert!(a < b);

        let (lo, hi) = {
            let x = WishId::new();
            let y = WishId::new();
            if x < y { (x, y) } else { (y, x) }
        };
        assert!(WishCursor::new(now, lo) < WishCursor::new(now, hi));
    }

    #[test]
    fn first_page_starts_from_scratch() {
        let list: CursorList<u32> = CursorList::new();
        assert_eq!(list.cursor_before(1), Some(None));
        assert_eq!(list.cursor_before(2), None);
    }

    #[test]
    fn jump_uses_previous_page_cursor() {
        let mut list = CursorList::new();
        list.record(1, "c1");
        list.record(2, "c2");
        assert_eq!(list.cursor_before(3), Some(Some("c2")));
        assert_eq!(list.cursor_before(2), Some(Some("c1")));
        assert_eq!(list.furthest_page(), 2);
        assert_eq!(list.last(), Some((2, &"c2")));
    }

    #[test]
    fn truncate_and_clear() {
        let mut list = CursorList::new();
        for page in 1..=4 {
            list.record(page, page * 10);
        }
        list.truncate_after(2);
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(3), None);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.furthest_page(), 0);
    }
}
