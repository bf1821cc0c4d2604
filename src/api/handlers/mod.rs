//! REST endpoint handlers organized by resource.

pub mod controls;
pub mod events;
pub mod system;
pub mod wishes;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(events::routes())
        .merge(wishes::routes())
        .merge(controls::routes())
}
