//! Event handlers: create, list, get, update, delete, toggle.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{EventListParams, EventListResponse, parse_cursor, split_page};
use crate::app_state::AppState;
use crate::domain::{Event, EventCursor, EventId, EventPatch, NewEvent};
use crate::error::{ErrorResponse, WallError};

/// `POST /events` — Create an event.
///
/// # Errors
///
/// Returns [`WallError::Validation`] if required fields are missing or the
/// dates are reversed.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Create an event",
    description = "Creates a photo-wall event. Name, description, theme and both dates are required; the start date must not be after the end date.",
    request_body = NewEvent,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Validation failed", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<NewEvent>,
) -> Result<impl IntoResponse, WallError> {
    let event = state.wall_service.create_event(req).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /events` — List events newest first.
///
/// # Errors
///
/// Returns [`WallError::InvalidCursor`] for a malformed cursor token.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "List events",
    description = "Returns events newest first. Pass `next_cursor` from a page as `cursor` to load the following page.",
    params(EventListParams),
    responses(
        (status = 200, description = "One page of events", body = EventListResponse),
        (status = 400, description = "Malformed cursor", body = ErrorResponse),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<EventListParams>,
) -> Result<impl IntoResponse, WallError> {
    let after = parse_cursor::<EventCursor>(params.cursor.as_deref())?;
    let page = state
        .wall_service
        .list_events(params.active_only, after, params.per_page)
        .await?;
    let (data, pagination) = split_page(page, params.per_page);
    Ok(Json(EventListResponse { data, pagination }))
}

/// `GET /events/{id}` — Get one event.
///
/// # Errors
///
/// Returns [`WallError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Get an event",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Event details", body = Event),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, WallError> {
    Ok(Json(state.wall_service.get_event(id).await?))
}

/// `PATCH /events/{id}` — Update an event.
///
/// # Errors
///
/// Returns [`WallError::EventNotFound`] or [`WallError::Validation`].
#[utoipa::path(
    patch,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Update an event",
    description = "Applies a partial update. Changed dates are validated against the stored ones.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    request_body = EventPatch,
    responses(
        (status = 200, description = "Updated event", body = Event),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<EventId>,
    Json(patch): Json<EventPatch>,
) -> Result<impl IntoResponse, WallError> {
    Ok(Json(state.wall_service.update_event(id, patch).await?))
}

/// `DELETE /events/{id}` — Delete an event.
///
/// # Errors
///
/// Returns [`WallError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Delete an event",
    description = "Deletes the event document, stops its headless display and drops its controls record. Its wishes are not removed.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, WallError> {
    state.wall_service.delete_event(id).await?;
    state.displays.stop(id).await;
    state.controls.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /events/{id}/toggle-active` — Flip the active flag.
///
/// # Errors
///
/// Returns [`WallError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/toggle-active",
    tag = "Events",
    summary = "Toggle event active flag",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Updated event", body = Event),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn toggle_event_active(
    State(state): State<AppState>,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, WallError> {
    Ok(Json(state.wall_service.toggle_event_active(id).await?))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event).get(list_events))
        .route(
            "/events/{id}",
            get(get_event).patch(update_event).delete(delete_event),
        )
        .route("/events/{id}/toggle-active", post(toggle_event_active))
}
