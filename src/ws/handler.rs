//! Axum WebSocket upgrade handler.
//!
//! Admin panels connect to `/ws` and subscribe with commands. A venue
//! display connects to `/ws?event_id=<uuid>` and is followed for its
//! event's controls straight away, without sending anything.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::EventId;
use crate::error::WallError;

/// Query parameters of the upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    /// Event whose controls this connection follows from the start.
    #[serde(default)]
    pub event_id: Option<EventId>,
}

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// # Errors
///
/// Returns [`WallError::EventNotFound`] when `event_id` names an unknown
/// event; the connection is not upgraded.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> Result<impl IntoResponse, WallError> {
    if let Some(event_id) = params.event_id {
        state.wall_service.get_event(event_id).await?;
        tracing::debug!(%event_id, "display connecting");
    }
    let event_rx = state.event_bus.subscribe();
    let controls = Arc::clone(&state.controls);

    Ok(ws.on_upgrade(move |socket| run_connection(socket, event_rx, controls, params.event_id)))
}
