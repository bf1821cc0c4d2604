//! Event and wish listing DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use super::CursorPageMeta;
use crate::domain::{Event, Wish};

/// Response body for `GET /events`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    /// Events on this page, newest first.
    pub data: Vec<Event>,
    /// Pagination metadata.
    pub pagination: CursorPageMeta,
}

/// Response body for `GET /events/{id}/wishes`.
#[derive(Debug, Serialize, ToSchema)]
pub struct WishListResponse {
    /// Wishes on this page, newest first.
    pub data: Vec<Wish>,
    /// Pagination metadata.
    pub pagination: CursorPageMeta,
}
