//! Synchronous heart of a display: observer, state machine, cursor walk and
//! queue composed behind a session generation counter.
//!
//! Every fetch is issued as a [`FetchTicket`] stamped with the generation
//! current at issue time. Any reset (start, stop, reload) bumps the
//! generation, so a result that resolves after the reset is recognised as
//! stale and dropped instead of leaking old content into the new session.

use serde::Serialize;
use utoipa::ToSchema;

use super::pagination::{BatchOutcome, FetchMode, PaginationEngine};
use super::queue::PlaybackQueue;
use super::PlayerSettings;
use crate::domain::{Controls, EventId, Wish};
use crate::error::WallError;
use crate::session::{
    ControlsObserver, SessionEvent, SessionSignal, SessionState, transition,
};
use crate::store::WishQuery;

/// A content query issued on behalf of one session generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    /// Generation that issued the query.
    pub generation: u64,
    /// Engine mode at issue time.
    pub mode: FetchMode,
    /// The query to run.
    pub query: WishQuery,
}

/// What happened to a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result belonged to the current session and was folded in.
    Applied(BatchOutcome),
    /// The query failed; the next tick retries.
    Failed,
    /// The session was reset after the query was issued.
    Stale,
}

/// What a display should render.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum PlayerView {
    /// Not started: show the join link.
    Waiting {
        /// URL attendees use to submit wishes.
        join_url: String,
    },
    /// Started, waiting for the first content.
    Preparing,
    /// Showing `wish`, item `index` of `queue_len`.
    Playing {
        /// Play index.
        index: usize,
        /// Queue length.
        queue_len: usize,
        /// Wish on screen.
        wish: Wish,
    },
}

/// Display state for one event.
#[derive(Debug, Clone)]
pub struct PlayerCore {
    event_id: EventId,
    join_url: String,
    state: SessionState,
    observer: ControlsObserver,
    engine: PaginationEngine,
    queue: PlaybackQueue,
    generation: u64,
    in_flight: bool,
}

impl PlayerCore {
    /// Creates a waiting display for `event_id`.
    #[must_use]
    pub fn new(event_id: EventId, settings: &PlayerSettings) -> Self {
        Self {
            event_id,
            join_url: settings.public_base_url.clone(),
            state: SessionState::Waiting,
            observer: ControlsObserver::new(),
            engine: PaginationEngine::new(settings.batch_size),
            queue: PlaybackQueue::new(settings.end_of_queue_policy),
            generation: 0,
            in_flight: false,
        }
    }

    /// Event this display plays.
    #[must_use]
    pub const fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Session state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Current session generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// The queue.
    #[must_use]
    pub const fn queue(&self) -> &PlaybackQueue {
        &self.queue
    }

    /// The cursor walk.
    #[must_use]
    pub const fn engine(&self) -> &PaginationEngine {
        &self.engine
    }

    /// Returns `true` while a fetch of the current generation is pending.
    #[must_use]
    pub const fn has_fetch_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Mutable access to the observer, for route bookkeeping.
    pub fn observer_mut(&mut self) -> &mut ControlsObserver {
        &mut self.observer
    }

    /// Folds a controls snapshot into the session and returns every signal
    /// it produced. Start, stop and reload are already applied to the core
    /// when this returns; navigation is left to the caller.
    pub fn on_controls(&mut self, controls: &Controls) -> Vec<SessionSignal> {
        let signals = self.observer.observe(controls);
        if signals.contains(&SessionSignal::Reload) {
            self.reload(controls);
            return signals;
        }
        for signal in &signals {
            match signal {
                SessionSignal::Start => self.apply(SessionEvent::Started),
                SessionSignal::Stop => self.apply(SessionEvent::Stopped),
                SessionSignal::Navigate(_) | SessionSignal::Reload => {}
            }
        }
        signals
    }

    /// Full reset, then re-derives the session from `controls`.
    fn reload(&mut self, controls: &Controls) {
        tracing::info!(event_id = %self.event_id, "display reload requested");
        self.reset_content();
        self.state = SessionState::Waiting;
        if controls.start {
            self.apply(SessionEvent::Started);
        }
    }

    fn apply(&mut self, event: SessionEvent) {
        let t = transition(self.state, event);
        if t.reset {
            self.reset_content();
        }
        if t.state != self.state {
            tracing::debug!(
                event_id = %self.event_id,
                from = ?self.state,
                to = ?t.state,
                "session transition"
            );
        }
        self.state = t.state;
    }

    fn reset_content(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.in_flight = false;
        self.engine.reset();
        self.queue.reset();
    }

    /// Issues the next query, unless the session is waiting or a query of
    /// this generation is still pending.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if self.state == SessionState::Waiting || self.in_flight {
            return None;
        }
        self.in_flight = true;
        Some(FetchTicket {
            generation: self.generation,
            mode: self.engine.mode(),
            query: self.engine.next_query(),
        })
    }

    /// Applies the result of `ticket`, dropping it if the session has been
    /// reset since the ticket was issued.
    pub fn on_fetch_result(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<Wish>, WallError>,
    ) -> FetchOutcome {
        if ticket.generation != self.generation {
            tracing::debug!(
                event_id = %self.event_id,
                ticket = ticket.generation,
                current = self.generation,
                "dropping stale fetch result"
            );
            return FetchOutcome::Stale;
        }
        self.in_flight = false;

        let batch = match result {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(
                    event_id = %self.event_id,
                    mode = ?ticket.mode,
                    error = %e,
                    "content fetch failed, retrying on next tick"
                );
                return FetchOutcome::Failed;
            }
        };

        let outcome = self.engine.apply(ticket.mode, &batch);
        match outcome {
            BatchOutcome::Appended(count) => {
                self.queue.extend(batch);
                tracing::debug!(
                    event_id = %self.event_id,
                    count,
                    queue_len = self.queue.len(),
                    "queued wishes"
                );
                self.apply(SessionEvent::ContentLoaded);
            }
            BatchOutcome::SwitchedToForward => {
                tracing::info!(
                    event_id = %self.event_id,
                    queue_len = self.queue.len(),
                    backfill_pages = self.engine.backfill_pages().furthest_page(),
                    "history exhausted, tailing new wishes"
                );
            }
            BatchOutcome::Idle | BatchOutcome::Stale => {}
        }
        FetchOutcome::Applied(outcome)
    }

    /// Moves the play index one step while playing.
    pub fn on_advance_tick(&mut self) -> Option<usize> {
        (self.state == SessionState::Playing).then(|| self.queue.advance(self.engine.mode()))
    }

    /// What to render now.
    #[must_use]
    pub fn view(&self) -> PlayerView {
        match (self.state, self.queue.current()) {
            (SessionState::Waiting, _) => PlayerView::Waiting {
                join_url: self.join_url.clone(),
            },
            (SessionState::Playing, Some(wish)) => PlayerView::Playing {
                index: self.queue.index(),
                queue_len: self.queue.len(),
                wish: wish.clone(),
            },
            _ => PlayerView::Preparing,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{EventId, WishPatch};
    use crate::store::memory::tests::{new_event, new_wish};
    use crate::store::{ContentStore, InMemoryContentStore};

    fn controls(start: bool, reload_at: Option<i64>) -> Controls {
        Controls {
            start,
            redirect: None,
            reload_at,
        }
    }

    async fn seeded(count: usize) -> (InMemoryContentStore, EventId) {
        let store = InMemoryContentStore::new();
        let Ok(event) = store.create_event(new_event("wall")).await else {
            panic!("event should be created");
        };
        for i in 0..count {
            let Ok(_) = store.create_wish(event.id, new_wish(&format!("g{i}"), true)).await else {
                panic!("wish should be created");
            };
        }
        (store, event.id)
    }

    async fn run_tick(core: &mut PlayerCore, store: &InMemoryContentStore) -> FetchOutcome {
        let Some(ticket) = core.begin_fetch() else {
            panic!("a fetch should be issued");
        };
        let result = store.query_wishes(core.event_id(), ticket.query).await;
        core.on_fetch_result(&ticket, result)
    }

    #[test]
    fn waiting_display_shows_join_link_and_never_fetches() {
        let mut core = PlayerCore::new(EventId::new(), &PlayerSettings::default());
        core.on_controls(&controls(false, None));
        assert_eq!(
            core.view(),
            PlayerView::Waiting {
                join_url: "http://localhost:3000".to_string()
            }
        );
        assert!(core.begin_fetch().is_none());
        assert!(core.on_advance_tick().is_none());
    }

    #[tokio::test]
    async fn start_backfills_then_tails() {
        let (store, event_id) = seeded(25).await;
        let mut core = PlayerCore::new(event_id, &PlayerSettings::default());
        core.on_controls(&controls(true, None));
        assert_eq!(core.state(), SessionState::Preparing);
        assert!(core.queue().is_empty());
        assert_eq!(core.view(), PlayerView::Preparing);

        let mut lengths = Vec::new();
        for _ in 0..3 {
            let outcome = run_tick(&mut core, &store).await;
            assert!(matches!(outcome, FetchOutcome::Applied(BatchOutcome::Appended(_))));
            lengths.push(core.queue().len());
        }
        assert_eq!(lengths, vec![10, 20, 25]);
        assert_eq!(core.state(), SessionState::Playing);

        assert_eq!(
            run_tick(&mut core, &store).await,
            FetchOutcome::Applied(BatchOutcome::SwitchedToForward)
        );
        assert_eq!(core.engine().mode(), FetchMode::Forward);
        assert_eq!(core.engine().backfill_pages().furthest_page(), 3);
    }

    #[tokio::test]
    async fn restart_always_begins_empty() {
        let (store, event_id) = seeded(12).await;
        let mut core = PlayerCore::new(event_id, &PlayerSettings::default());
        for _ in 0..3 {
            core.on_controls(&controls(true, None));
            assert!(core.queue().is_empty());
            assert_eq!(core.queue().index(), 0);
            run_tick(&mut core, &store).await;
            core.on_advance_tick();
            core.on_controls(&controls(false, None));
            assert!(core.queue().is_empty());
        }
    }

    #[tokio::test]
    async fn one_fetch_in_flight_per_generation() {
        let (_store, event_id) = seeded(0).await;
        let mut core = PlayerCore::new(event_id, &PlayerSettings::default());
        core.on_controls(&controls(true, None));
        assert!(core.begin_fetch().is_some());
        assert!(core.begin_fetch().is_none());
        assert!(core.has_fetch_in_flight());
    }

    #[tokio::test]
    async fn reload_discards_in_flight_results() {
        let (store, event_id) = seeded(15).await;
        let mut core = PlayerCore::new(event_id, &PlayerSettings::default());
        core.on_controls(&controls(true, Some(1000)));
        run_tick(&mut core, &store).await;
        assert_eq!(core.queue().len(), 10);

        let Some(ticket) = core.begin_fetch() else {
            panic!("a fetch should be issued");
        };
        let late = store.query_wishes(event_id, ticket.query).await;

        let signals = core.on_controls(&controls(true, Some(1001)));
        assert_eq!(signals, vec![SessionSignal::Reload]);
        assert!(core.queue().is_empty());
        assert_eq!(core.state(), SessionState::Preparing);

        assert_eq!(core.on_fetch_result(&ticket, late), FetchOutcome::Stale);
        assert!(core.queue().is_empty());

        // The new generation starts over from the newest batch.
        run_tick(&mut core, &store).await;
        assert_eq!(core.queue().len(), 10);
    }

    #[tokio::test]
    async fn stop_discards_in_flight_results() {
        let (store, event_id) = seeded(5).await;
        let mut core = PlayerCore::new(event_id, &PlayerSettings::default());
        core.on_controls(&controls(true, None));
        let Some(ticket) = core.begin_fetch() else {
            panic!("a fetch should be issued");
        };
        core.on_controls(&controls(false, None));
        let late = store.query_wishes(event_id, ticket.query).await;
        assert_eq!(core.on_fetch_result(&ticket, late), FetchOutcome::Stale);
        assert!(matches!(core.view(), PlayerView::Waiting { .. }));
    }

    #[tokio::test]
    async fn failed_fetch_is_retried_on_next_tick() {
        let (_store, event_id) = seeded(0).await;
        let mut core = PlayerCore::new(event_id, &PlayerSettings::default());
        core.on_controls(&controls(true, None));
        let Some(ticket) = core.begin_fetch() else {
            panic!("a fetch should be issued");
        };
        let outcome = core.on_fetch_result(&ticket, Err(WallError::Store("offline".into())));
        assert_eq!(outcome, FetchOutcome::Failed);
        let Some(retry) = core.begin_fetch() else {
            panic!("retry should be issued");
        };
        assert_eq!(retry.mode, FetchMode::Backfill);
        assert_eq!(retry.query, ticket.query);
    }

    #[tokio::test]
    async fn approved_wish_appears_on_next_poll() {
        let (store, event_id) = seeded(1).await;
        let Ok(pending) = store.create_wish(event_id, new_wish("late", false)).await else {
            panic!("wish should be created");
        };
        let mut core = PlayerCore::new(event_id, &PlayerSettings::default());
        core.on_controls(&controls(true, None));
        run_tick(&mut core, &store).await;
        run_tick(&mut core, &store).await;
        assert_eq!(core.queue().len(), 1);
        assert!(core.queue().items().iter().all(|w| w.id != pending.id));

        let Ok(_) = store
            .update_wish(event_id, pending.id, WishPatch::approved(true))
            .await
        else {
            panic!("approval should succeed");
        };
        run_tick(&mut core, &store).await;
        assert_eq!(core.queue().len(), 2);
        assert!(core.queue().items().iter().any(|w| w.id == pending.id));
    }

    #[tokio::test]
    async fn playing_view_tracks_the_index() {
        let (store, event_id) = seeded(3).await;
        let mut core = PlayerCore::new(event_id, &PlayerSettings::default());
        core.on_controls(&controls(true, None));
        run_tick(&mut core, &store).await;
        assert_eq!(core.on_advance_tick(), Some(1));
        let PlayerView::Playing {
            index, queue_len, ..
        } = core.view()
        else {
            panic!("display should be playing");
        };
        assert_eq!((index, queue_len), (1, 3));
    }
}
