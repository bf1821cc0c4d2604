//! Writes that drive every display of an event.
//!
//! Each command is a single partial update of the controls record. The
//! emitter never waits for displays to react; the store is the only source
//! of truth.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::domain::{Controls, ControlsPatch, EventId};
use crate::error::WallError;
use crate::store::ControlsStore;

/// Issues start, redirect and reload commands.
#[derive(Debug, Clone)]
pub struct AdminCommandEmitter {
    controls: Arc<dyn ControlsStore>,
    redirect_clear_after: Duration,
}

impl AdminCommandEmitter {
    /// Creates an emitter. A zero `redirect_clear_after` disables the
    /// automatic clear.
    #[must_use]
    pub fn new(controls: Arc<dyn ControlsStore>, redirect_clear_after: Duration) -> Self {
        Self {
            controls,
            redirect_clear_after,
        }
    }

    /// Reads the current controls of an event.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn current(&self, event_id: EventId) -> Result<Controls, WallError> {
        self.controls.get(event_id).await
    }

    /// Starts or stops playback.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn set_start(&self, event_id: EventId, start: bool) -> Result<Controls, WallError> {
        let controls = self
            .controls
            .update(event_id, ControlsPatch::start(start))
            .await?;
        tracing::info!(%event_id, start, "start command sent");
        Ok(controls)
    }

    /// Points displays at `target`, then clears the field after the
    /// configured delay so the same target can be sent again. The clear is
    /// skipped if someone wrote a different target in the meantime.
    ///
    /// # Errors
    ///
    /// Returns [`WallError::InvalidRequest`] for a blank target, or a
    /// store error.
    pub async fn redirect(&self, event_id: EventId, target: &str) -> Result<Controls, WallError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(WallError::InvalidRequest(
                "redirect target cannot be blank".to_string(),
            ));
        }
        let controls = self
            .controls
            .update(event_id, ControlsPatch::redirect(Some(target.to_string())))
            .await?;
        tracing::info!(%event_id, target, "redirect command sent");

        if !self.redirect_clear_after.is_zero() {
            tokio::spawn(clear_redirect_later(
                Arc::clone(&self.controls),
                event_id,
                target.to_string(),
                self.redirect_clear_after,
            ));
        }
        Ok(controls)
    }

    /// Clears the redirect field immediately.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn clear_redirect(&self, event_id: EventId) -> Result<Controls, WallError> {
        self.controls
            .update(event_id, ControlsPatch::redirect(None))
            .await
    }

    /// Forces every display to reload by writing a fresh `reloadAt` tag:
    /// the current time in milliseconds, or one past the stored tag if the
    /// clock has not moved beyond it.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn force_reload(&self, event_id: EventId) -> Result<Controls, WallError> {
        let previous = self.controls.get(event_id).await?.reload_at;
        let now = Utc::now().timestamp_millis();
        let tag = previous.map_or(now, |prev| now.max(prev.saturating_add(1)));
        let controls = self
            .controls
            .update(event_id, ControlsPatch::reload_at(tag))
            .await?;
        tracing::info!(%event_id, reload_at = tag, "reload command sent");
        Ok(controls)
    }
}

async fn clear_redirect_later(
    controls: Arc<dyn ControlsStore>,
    event_id: EventId,
    target: String,
    delay: Duration,
) {
    tokio::time::sleep(delay).await;
    let current = match controls.get(event_id).await {
        Ok(current) => current,
        Err(e) => {
            tracing::warn!(%event_id, error = %e, "failed to read controls for redirect clear");
            return;
        }
    };
    if current.redirect.as_deref() != Some(target.as_str()) {
        tracing::debug!(%event_id, %target, "redirect changed, skipping clear");
        return;
    }
    match controls.update(event_id, ControlsPatch::redirect(None)).await {
        Ok(_) => tracing::debug!(%event_id, %target, "redirect cleared"),
        Err(e) => tracing::warn!(%event_id, error = %e, "failed to clear redirect"),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::EventBus;
    use crate::session::{ControlsObserver, SessionSignal};
    use crate::store::InMemoryControlsStore;

    fn make_emitter() -> (AdminCommandEmitter, Arc<InMemoryControlsStore>) {
        let store = Arc::new(InMemoryControlsStore::new(EventBus::new(64)));
        let emitter = AdminCommandEmitter::new(
            Arc::clone(&store) as Arc<dyn ControlsStore>,
            Duration::from_millis(1500),
        );
        (emitter, store)
    }

    async fn current(store: &InMemoryControlsStore, event_id: EventId) -> Controls {
        let Ok(controls) = store.get(event_id).await else {
            panic!("controls read failed");
        };
        controls
    }

    #[tokio::test]
    async fn set_start_only_touches_start() {
        let (emitter, store) = make_emitter();
        let event_id = EventId::new();
        let Ok(_) = store.update(event_id, ControlsPatch::reload_at(7)).await else {
            panic!("seed write failed");
        };
        let Ok(controls) = emitter.set_start(event_id, true).await else {
            panic!("start failed");
        };
        assert!(controls.start);
        assert_eq!(controls.reload_at, Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn redirect_clears_itself() {
        let (emitter, store) = make_emitter();
        let event_id = EventId::new();
        let Ok(controls) = emitter.redirect(event_id, "/final").await else {
            panic!("redirect failed");
        };
        assert_eq!(controls.redirect.as_deref(), Some("/final"));

        tokio::time::sleep(Duration::from_millis(1400)).await;
        assert_eq!(current(&store, event_id).await.redirect.as_deref(), Some("/final"));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(current(&store, event_id).await.redirect, None);

        // A display subscribing after the clear never navigates.
        let mut late = ControlsObserver::at_route("/finalmsn");
        let signals = late.observe(&current(&store, event_id).await);
        assert!(!signals.iter().any(|s| matches!(s, SessionSignal::Navigate(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_skips_a_newer_target() {
        let (emitter, store) = make_emitter();
        let event_id = EventId::new();
        let Ok(_) = emitter.redirect(event_id, "/final").await else {
            panic!("redirect failed");
        };
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let Ok(_) = store
            .update(event_id, ControlsPatch::redirect(Some("/finalmsn".to_string())))
            .await
        else {
            panic!("write failed");
        };
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(
            current(&store, event_id).await.redirect.as_deref(),
            Some("/finalmsn")
        );
    }

    #[tokio::test]
    async fn blank_redirect_is_rejected() {
        let (emitter, _) = make_emitter();
        assert!(matches!(
            emitter.redirect(EventId::new(), "   ").await,
            Err(WallError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn force_reload_always_changes_the_tag() {
        let (emitter, store) = make_emitter();
        let event_id = EventId::new();
        let future = Utc::now().timestamp_millis() + 60_000;
        let Ok(_) = store.update(event_id, ControlsPatch::reload_at(future)).await else {
            panic!("seed write failed");
        };

        let Ok(first) = emitter.force_reload(event_id).await else {
            panic!("reload failed");
        };
        assert_eq!(first.reload_at, Some(future + 1));
        let Ok(second) = emitter.force_reload(event_id).await else {
            panic!("reload failed");
        };
        assert_eq!(second.reload_at, Some(future + 2));
    }

    #[tokio::test]
    async fn reload_signals_running_displays_once() {
        let (emitter, store) = make_emitter();
        let event_id = EventId::new();
        let mut observer = ControlsObserver::new();

        let Ok(_) = emitter.force_reload(event_id).await else {
            panic!("reload failed");
        };
        assert!(observer.observe(&current(&store, event_id).await).is_empty());

        let Ok(_) = emitter.force_reload(event_id).await else {
            panic!("reload failed");
        };
        let snapshot = current(&store, event_id).await;
        assert_eq!(observer.observe(&snapshot), vec![SessionSignal::Reload]);
        assert!(observer.observe(&snapshot).is_empty());
    }
}
