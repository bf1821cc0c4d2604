//! Display-side playback: the cursor walk that feeds the queue, the queue
//! itself, and the player that drives both from the controls record.

pub mod pagination;
pub mod player;
pub mod player_core;
pub mod queue;
pub mod registry;

use std::time::Duration;

pub use pagination::{BatchOutcome, FetchMode, PaginationEngine};
pub use player::{DisplayPlayer, PlayerHandle};
pub use player_core::{FetchOutcome, FetchTicket, PlayerCore, PlayerView};
pub use queue::{EndOfQueuePolicy, PlaybackQueue, UnknownPolicy};
pub use registry::DisplayRegistry;

/// Timing and sizing of a display player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSettings {
    /// Time between content polls.
    pub fetch_interval: Duration,
    /// Time each wish stays on screen.
    pub advance_interval: Duration,
    /// Wishes per content query.
    pub batch_size: u32,
    /// End-of-queue behaviour.
    pub end_of_queue_policy: EndOfQueuePolicy,
    /// Join link shown while waiting.
    pub public_base_url: String,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            fetch_interval: Duration::from_secs(5),
            advance_interval: Duration::from_secs(5),
            batch_size: 10,
            end_of_queue_policy: EndOfQueuePolicy::default(),
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}
