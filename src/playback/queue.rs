//! Growing playback queue with a fixed-cadence play index.

use std::fmt;
use std::str::FromStr;

use super::FetchMode;
use crate::domain::Wish;

/// What the advancer does when the index would run past the queue end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndOfQueuePolicy {
    /// Wrap to the start while older content is still being backfilled;
    /// once live-tailing, hold on the last item until new content arrives.
    #[default]
    LoopWhileBackfilling,
    /// Always wrap to the start.
    AlwaysLoop,
    /// Always hold on the last item.
    Freeze,
}

impl EndOfQueuePolicy {
    /// Stable configuration name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LoopWhileBackfilling => "loop_while_backfilling",
            Self::AlwaysLoop => "always_loop",
            Self::Freeze => "freeze",
        }
    }

    const fn wraps(self, mode: FetchMode) -> bool {
        match self {
            Self::LoopWhileBackfilling => matches!(mode, FetchMode::Backfill),
            Self::AlwaysLoop => true,
            Self::Freeze => false,
        }
    }
}

impl fmt::Display for EndOfQueuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unknown policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown end-of-queue policy '{0}' (expected loop_while_backfilling, always_loop or freeze)")]
pub struct UnknownPolicy(String);

impl FromStr for EndOfQueuePolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "loop_while_backfilling" => Ok(Self::LoopWhileBackfilling),
            "always_loop" | "loop" => Ok(Self::AlwaysLoop),
            "freeze" => Ok(Self::Freeze),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

/// Ordered, append-only sequence of wishes plus the index on screen.
#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    items: Vec<Wish>,
    index: usize,
    policy: EndOfQueuePolicy,
}

impl PlaybackQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new(policy: EndOfQueuePolicy) -> Self {
        Self {
            items: Vec::new(),
            index: 0,
            policy,
        }
    }

    /// Appends a batch to the tail.
    pub fn extend(&mut self, batch: impl IntoIterator<Item = Wish>) {
        self.items.extend(batch);
    }

    /// Moves the index one step. At the end the policy decides between
    /// wrapping to 0 and holding on the last item. Returns the new index.
    pub fn advance(&mut self, mode: FetchMode) -> usize {
        if self.items.is_empty() {
            self.index = 0;
            return 0;
        }
        let next = self.index + 1;
        if next < self.items.len() {
            self.index = next;
        } else if self.policy.wraps(mode) {
            self.index = 0;
        } else {
            self.index = self.items.len() - 1;
        }
        self.index
    }

    /// Empties the queue and rewinds the index.
    pub fn reset(&mut self) {
        self.items.clear();
        self.index = 0;
    }

    /// Item under the index.
    #[must_use]
    pub fn current(&self) -> Option<&Wish> {
        self.items.get(self.index)
    }

    /// Current index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Active policy.
    #[must_use]
    pub const fn policy(&self) -> EndOfQueuePolicy {
        self.policy
    }

    /// Queued items in play order.
    #[must_use]
    pub fn items(&self) -> &[Wish] {
        &self.items
    }
}
