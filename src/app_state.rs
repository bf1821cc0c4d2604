//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::admin::AdminCommandEmitter;
use crate::config::WallConfig;
use crate::domain::EventBus;
use crate::playback::DisplayRegistry;
use crate::service::WallService;
use crate::store::{ContentStore, ControlsStore, InMemoryContentStore, InMemoryControlsStore};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event and wish service.
    pub wall_service: Arc<WallService>,
    /// Realtime controls tree.
    pub controls: Arc<dyn ControlsStore>,
    /// Admin command emitter writing to `controls`.
    pub emitter: Arc<AdminCommandEmitter>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Headless displays, started on first request.
    pub displays: Arc<DisplayRegistry>,
}

impl AppState {
    /// Wires the service layer over the given stores. `event_bus` must be
    /// the bus `controls` publishes on.
    #[must_use]
    pub fn new(
        config: &WallConfig,
        content: Arc<dyn ContentStore>,
        controls: Arc<dyn ControlsStore>,
        event_bus: EventBus,
    ) -> Self {
        let displays = Arc::new(DisplayRegistry::new(
            config.player_settings(),
            Arc::clone(&controls),
            Arc::clone(&content),
        ));
        let wall_service = Arc::new(WallService::new(content, event_bus.clone()));
        let emitter = Arc::new(AdminCommandEmitter::new(
            Arc::clone(&controls),
            config.redirect_clear_after(),
        ));
        Self {
            wall_service,
            controls,
            emitter,
            event_bus,
            displays,
        }
    }

    /// State backed entirely by in-memory stores.
    #[must_use]
    pub fn in_memory(config: &WallConfig) -> Self {
        let event_bus = EventBus::new(config.event_bus_capacity);
        let controls = Arc::new(InMemoryControlsStore::new(event_bus.clone()));
        Self::new(
            config,
            Arc::new(InMemoryContentStore::new()),
            controls,
            event_bus,
        )
    }
}
