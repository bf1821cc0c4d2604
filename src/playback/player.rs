//! Background task that runs one display.
//!
//! [`DisplayPlayer`] drives a [`PlayerCore`] from three independent
//! sources: the controls subscription, the content poll interval and the
//! advance interval. Queries run on spawned tasks and report back over a
//! channel; the core decides whether a result is still current.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::player_core::{FetchTicket, PlayerCore, PlayerView};
use super::PlayerSettings;
use crate::domain::{EventId, Wish};
use crate::error::WallError;
use crate::session::SessionSignal;
use crate::store::{ContentStore, ControlsStore};

type FetchResult = (FetchTicket, Result<Vec<Wish>, WallError>);

/// A display for one event, ready to be spawned.
#[derive(Debug)]
pub struct DisplayPlayer {
    core: PlayerCore,
    settings: PlayerSettings,
    controls: Arc<dyn ControlsStore>,
    content: Arc<dyn ContentStore>,
}

/// Handle to a running [`DisplayPlayer`].
#[derive(Debug)]
pub struct PlayerHandle {
    view: watch::Receiver<PlayerView>,
    signals: mpsc::UnboundedReceiver<SessionSignal>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PlayerHandle {
    /// What the display currently renders.
    #[must_use]
    pub fn view(&self) -> PlayerView {
        self.view.borrow().clone()
    }

    /// Receiver that is notified whenever the view changes.
    #[must_use]
    pub fn watch_view(&self) -> watch::Receiver<PlayerView> {
        self.view.clone()
    }

    /// Waits for the next `Navigate` or `Reload` instruction.
    pub async fn next_signal(&mut self) -> Option<SessionSignal> {
        self.signals.recv().await
    }

    /// Stops the player and waits for its task to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "display player task ended abnormally");
        }
    }
}

fn ticker(period: std::time::Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

impl DisplayPlayer {
    /// Creates a player for `event_id`.
    #[must_use]
    pub fn new(
        event_id: EventId,
        settings: PlayerSettings,
        controls: Arc<dyn ControlsStore>,
        content: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            core: PlayerCore::new(event_id, &settings),
            settings,
            controls,
            content,
        }
    }

    /// Sets the route the display starts on, so a redirect to it is not
    /// treated as navigation.
    #[must_use]
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.core.observer_mut().set_route(route);
        self
    }

    /// Spawns the player on the current runtime. It runs until `cancel`
    /// fires or the controls feed closes.
    #[must_use]
    pub fn spawn(self, cancel: CancellationToken) -> PlayerHandle {
        let (view_tx, view) = watch::channel(self.core.view());
        let (signal_tx, signals) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(cancel.clone(), view_tx, signal_tx));
        PlayerHandle {
            view,
            signals,
            cancel,
            task,
        }
    }

    async fn run(
        mut self,
        cancel: CancellationToken,
        view_tx: watch::Sender<PlayerView>,
        signal_tx: mpsc::UnboundedSender<SessionSignal>,
    ) {
        let event_id = self.core.event_id();
        let mut subscription = match self.controls.subscribe(event_id).await {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::error!(%event_id, error = %e, "failed to subscribe to controls");
                return;
            }
        };

        let (result_tx, mut result_rx) = mpsc::channel::<FetchResult>(4);
        let mut fetch_tick = ticker(self.settings.fetch_interval);
        let mut advance_tick = ticker(self.settings.advance_interval);

        tracing::info!(%event_id, "display player started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!(%event_id, "display player cancelled");
                    break;
                }
                snapshot = subscription.next() => {
                    let Some(controls) = snapshot else {
                        tracing::warn!(%event_id, "controls feed closed, stopping display");
                        break;
                    };
                    let generation = self.core.generation();
                    for signal in self.core.on_controls(&controls) {
                        if matches!(signal, SessionSignal::Navigate(_) | SessionSignal::Reload)
                            && signal_tx.send(signal).is_err()
                        {
                            tracing::debug!(%event_id, "no listener for display signals");
                        }
                    }
                    if self.core.generation() != generation {
                        fetch_tick.reset();
                        advance_tick.reset();
                        self.spawn_fetch(&result_tx);
                    }
                }
                _ = fetch_tick.tick() => self.spawn_fetch(&result_tx),
                Some((ticket, result)) = result_rx.recv() => {
                    self.core.on_fetch_result(&ticket, result);
                }
                _ = advance_tick.tick() => {
                    self.core.on_advance_tick();
                }
            }

            let view = self.core.view();
            view_tx.send_if_modified(|current| {
                if *current == view {
                    false
                } else {
                    *current = view;
                    true
                }
            });
        }
    }

    fn spawn_fetch(&mut self, results: &mpsc::Sender<FetchResult>) {
        let Some(ticket) = self.core.begin_fetch() else {
            return;
        };
        let event_id = self.core.event_id();
        let content = Arc::clone(&self.content);
        let results = results.clone();
        tokio::spawn(async move {
            let result = content.query_wishes(event_id, ticket.query).await;
            if results.send((ticket, result)).await.is_err() {
                tracing::debug!(%event_id, "display stopped before fetch completed");
            }
        });
    }
}
