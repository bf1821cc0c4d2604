//! Wish handlers: submit, list, get, update, delete, moderate.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{WishListParams, WishListResponse, parse_cursor, split_page};
use crate::app_state::AppState;
use crate::domain::{EventId, NewWish, Wish, WishCursor, WishId, WishPatch};
use crate::error::{ErrorResponse, WallError};

/// `POST /events/{id}/wishes` — Submit a wish.
///
/// The photo must already be uploaded; `photo_url` points at it.
///
/// # Errors
///
/// Returns [`WallError::Validation`] or [`WallError::EventNotFound`].
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/wishes",
    tag = "Wishes",
    summary = "Submit a wish",
    description = "Stores the wish metadata with a server-assigned timestamp and increments the event's wish counter. Inline image data is rejected.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    request_body = NewWish,
    responses(
        (status = 201, description = "Wish stored", body = Wish),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn create_wish(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    Json(req): Json<NewWish>,
) -> Result<impl IntoResponse, WallError> {
    let wish = state.wall_service.create_wish(event_id, req).await?;
    Ok((StatusCode::CREATED, Json(wish)))
}

/// `GET /events/{id}/wishes` — List wishes newest first.
///
/// # Errors
///
/// Returns [`WallError::EventNotFound`] or [`WallError::InvalidCursor`].
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/wishes",
    tag = "Wishes",
    summary = "List wishes",
    description = "Returns one page of the event's wishes, newest first, optionally only approved ones.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        WishListParams,
    ),
    responses(
        (status = 200, description = "One page of wishes", body = WishListResponse),
        (status = 400, description = "Malformed cursor", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn list_wishes(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    Query(params): Query<WishListParams>,
) -> Result<impl IntoResponse, WallError> {
    let after = parse_cursor::<WishCursor>(params.cursor.as_deref())?;
    let page = state
        .wall_service
        .list_wishes(event_id, after, params.per_page, params.approved_only)
        .await?;
    let (data, pagination) = split_page(page, params.per_page);
    Ok(Json(WishListResponse { data, pagination }))
}

/// `GET /events/{id}/wishes/{wish_id}` — Get one wish.
///
/// # Errors
///
/// Returns [`WallError::WishNotFound`] if the wish does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/wishes/{wish_id}",
    tag = "Wishes",
    summary = "Get a wish",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        ("wish_id" = uuid::Uuid, Path, description = "Wish UUID"),
    ),
    responses(
        (status = 200, description = "Wish details", body = Wish),
        (status = 404, description = "Wish not found", body = ErrorResponse),
    )
)]
pub async fn get_wish(
    State(state): State<AppState>,
    Path((event_id, wish_id)): Path<(EventId, WishId)>,
) -> Result<impl IntoResponse, WallError> {
    Ok(Json(state.wall_service.get_wish(event_id, wish_id).await?))
}

/// `PATCH /events/{id}/wishes/{wish_id}` — Edit or moderate a wish.
///
/// # Errors
///
/// Returns [`WallError::Validation`] or [`WallError::WishNotFound`].
#[utoipa::path(
    patch,
    path = "/api/v1/events/{id}/wishes/{wish_id}",
    tag = "Wishes",
    summary = "Update a wish",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        ("wish_id" = uuid::Uuid, Path, description = "Wish UUID"),
    ),
    request_body = WishPatch,
    responses(
        (status = 200, description = "Updated wish", body = Wish),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Wish not found", body = ErrorResponse),
    )
)]
pub async fn update_wish(
    State(state): State<AppState>,
    Path((event_id, wish_id)): Path<(EventId, WishId)>,
    Json(patch): Json<WishPatch>,
) -> Result<impl IntoResponse, WallError> {
    Ok(Json(
        state
            .wall_service
            .update_wish(event_id, wish_id, patch)
            .await?,
    ))
}

/// `DELETE /events/{id}/wishes/{wish_id}` — Delete a wish.
///
/// # Errors
///
/// Returns [`WallError::WishNotFound`] if the wish does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}/wishes/{wish_id}",
    tag = "Wishes",
    summary = "Delete a wish",
    description = "Deletes the wish and decrements the event's wish counter.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        ("wish_id" = uuid::Uuid, Path, description = "Wish UUID"),
    ),
    responses(
        (status = 204, description = "Wish deleted"),
        (status = 404, description = "Wish not found", body = ErrorResponse),
    )
)]
pub async fn delete_wish(
    State(state): State<AppState>,
    Path((event_id, wish_id)): Path<(EventId, WishId)>,
) -> Result<impl IntoResponse, WallError> {
    state.wall_service.delete_wish(event_id, wish_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /events/{id}/wishes/{wish_id}/toggle-approval` — Flip approval.
///
/// # Errors
///
/// Returns [`WallError::WishNotFound`] if the wish does not exist.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/wishes/{wish_id}/toggle-approval",
    tag = "Wishes",
    summary = "Toggle wish approval",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
        ("wish_id" = uuid::Uuid, Path, description = "Wish UUID"),
    ),
    responses(
        (status = 200, description = "Updated wish", body = Wish),
        (status = 404, description = "Wish not found", body = ErrorResponse),
    )
)]
pub async fn toggle_wish_approval(
    State(state): State<AppState>,
    Path((event_id, wish_id)): Path<(EventId, WishId)>,
) -> Result<impl IntoResponse, WallError> {
    Ok(Json(
        state
            .wall_service
            .toggle_wish_approval(event_id, wish_id)
            .await?,
    ))
}

/// Wish routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{id}/wishes", post(create_wish).get(list_wishes))
        .route(
            "/events/{id}/wishes/{wish_id}",
            get(get_wish).patch(update_wish).delete(delete_wish),
        )
        .route(
            "/events/{id}/wishes/{wish_id}/toggle-approval",
            post(toggle_wish_approval),
        )
}
