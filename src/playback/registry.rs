//! Headless displays run by the gateway itself.
//!
//! The first request for an event's display spawns a [`DisplayPlayer`]
//! for it; later requests read the view it publishes. Navigation and
//! reload signals have nowhere to go on the server and are only logged.
//! A display whose task has ended is evicted and restarted on the next
//! request.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use tokio_util::sync::CancellationToken;

use super::player::DisplayPlayer;
use super::player_core::PlayerView;
use super::PlayerSettings;
use crate::domain::EventId;
use crate::store::{ContentStore, ControlsStore};

#[derive(Debug)]
struct RunningDisplay {
    view: watch::Receiver<PlayerView>,
    cancel: CancellationToken,
}

impl RunningDisplay {
    /// The player task owns the sender; it is dropped when the task ends.
    fn is_running(&self) -> bool {
        self.view.has_changed().is_ok()
    }
}

/// Lazily started displays, one per event.
#[derive(Debug)]
pub struct DisplayRegistry {
    displays: RwLock<HashMap<EventId, RunningDisplay>>,
    settings: PlayerSettings,
    controls: Arc<dyn ControlsStore>,
    content: Arc<dyn ContentStore>,
    cancel: CancellationToken,
}

impl DisplayRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(
        settings: PlayerSettings,
        controls: Arc<dyn ControlsStore>,
        content: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            displays: RwLock::new(HashMap::new()),
            settings,
            controls,
            content,
            cancel: CancellationToken::new(),
        }
    }

    /// Current view of `event_id`'s display, starting it if needed.
    pub async fn view(&self, event_id: EventId) -> PlayerView {
        if let Some(display) = self.displays.read().await.get(&event_id)
            && display.is_running()
        {
            return display.view.borrow().clone();
        }

        let mut displays = self.displays.write().await;
        if let Some(display) = displays.get(&event_id) {
            if display.is_running() {
                return display.view.borrow().clone();
            }
            tracing::warn!(%event_id, "headless display exited, restarting");
        }
        let display = self.start(event_id);
        let current = display.view.borrow().clone();
        displays.insert(event_id, display);
        current
    }

    fn start(&self, event_id: EventId) -> RunningDisplay {
        let cancel = self.cancel.child_token();
        let mut handle = DisplayPlayer::new(
            event_id,
            self.settings.clone(),
            Arc::clone(&self.controls),
            Arc::clone(&self.content),
        )
        .spawn(cancel.clone());
        let view = handle.watch_view();
        tokio::spawn(async move {
            while let Some(signal) = handle.next_signal().await {
                tracing::info!(%event_id, ?signal, "headless display ignored signal");
            }
        });
        tracing::info!(%event_id, "headless display started");
        RunningDisplay { view, cancel }
    }

    /// Stops and forgets the display of `event_id`. Returns `true` if one
    /// was registered.
    pub async fn stop(&self, event_id: EventId) -> bool {
        let Some(display) = self.displays.write().await.remove(&event_id) else {
            return false;
        };
        display.cancel.cancel();
        tracing::info!(%event_id, "headless display stopped");
        true
    }

    /// Number of running displays.
    pub async fn len(&self) -> usize {
        self.displays
            .read()
            .await
            .values()
            .filter(|display| display.is_running())
            .count()
    }

    /// Returns `true` if no display is running.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Stops every display.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
