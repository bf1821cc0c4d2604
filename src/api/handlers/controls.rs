//! Controls handlers: the admin remote for every display of an event.
//!
//! Commands are fire-and-forget writes; the response is the snapshot right
//! after the write, not an acknowledgement from any display. Every route
//! answers 404 for an event that does not exist, so no record is created
//! for it.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{ControlsResponse, RedirectRequest, StartRequest};
use crate::app_state::AppState;
use crate::domain::EventId;
use crate::error::{ErrorResponse, WallError};
use crate::playback::PlayerView;

/// `GET /events/{id}/controls` — Read the controls record.
///
/// # Errors
///
/// Returns [`WallError::EventNotFound`] for an unknown event.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/controls",
    tag = "Controls",
    summary = "Read controls",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Current controls", body = ControlsResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_controls(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> Result<impl IntoResponse, WallError> {
    state.wall_service.get_event(event_id).await?;
    let controls = state.emitter.current(event_id).await?;
    Ok(Json(ControlsResponse { event_id, controls }))
}

/// `POST /events/{id}/controls/start` — Start or stop playback.
///
/// # Errors
///
/// Returns [`WallError::EventNotFound`] for an unknown event.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/controls/start",
    tag = "Controls",
    summary = "Start or stop playback",
    description = "Stopping discards every display's queue; starting again begins from the newest wishes.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    request_body = StartRequest,
    responses(
        (status = 200, description = "Controls after the write", body = ControlsResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn set_start(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    Json(req): Json<StartRequest>,
) -> Result<impl IntoResponse, WallError> {
    state.wall_service.get_event(event_id).await?;
    let controls = state.emitter.set_start(event_id, req.start).await?;
    Ok(Json(ControlsResponse { event_id, controls }))
}

/// `POST /events/{id}/controls/redirect` — Send displays to a route.
///
/// # Errors
///
/// Returns [`WallError::EventNotFound`] for an unknown event or
/// [`WallError::InvalidRequest`] for a blank target.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/controls/redirect",
    tag = "Controls",
    summary = "Redirect displays",
    description = "Writes the target route; the field clears itself after a short delay so the same command can be repeated.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    request_body = RedirectRequest,
    responses(
        (status = 200, description = "Controls after the write", body = ControlsResponse),
        (status = 400, description = "Blank target", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn redirect(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    Json(req): Json<RedirectRequest>,
) -> Result<impl IntoResponse, WallError> {
    state.wall_service.get_event(event_id).await?;
    let controls = state.emitter.redirect(event_id, &req.target).await?;
    Ok(Json(ControlsResponse { event_id, controls }))
}

/// `POST /events/{id}/controls/reload` — Force every display to reload.
///
/// # Errors
///
/// Returns [`WallError::EventNotFound`] for an unknown event.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/controls/reload",
    tag = "Controls",
    summary = "Force reload",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Controls after the write", body = ControlsResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn force_reload(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> Result<impl IntoResponse, WallError> {
    state.wall_service.get_event(event_id).await?;
    let controls = state.emitter.force_reload(event_id).await?;
    Ok(Json(ControlsResponse { event_id, controls }))
}

/// `GET /events/{id}/display` — View of the gateway's headless display.
///
/// The first call starts a display for the event; it then follows the
/// controls record like any screen at the venue.
///
/// # Errors
///
/// Returns [`WallError::EventNotFound`] for an unknown event.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/display",
    tag = "Controls",
    summary = "Headless display view",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "What the display is showing", body = PlayerView),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn display_view(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> Result<impl IntoResponse, WallError> {
    state.wall_service.get_event(event_id).await?;
    Ok(Json(state.displays.view(event_id).await))
}

/// Controls routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{id}/controls", get(get_controls))
        .route("/events/{id}/controls/start", post(set_start))
        .route("/events/{id}/controls/redirect", post(redirect))
        .route("/events/{id}/controls/reload", post(force_reload))
        .route("/events/{id}/display", get(display_view))
}
