//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::WallError;
use crate::service::{MAX_PER_PAGE, Page};

/// Cursor pagination query parameters for event listings.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventListParams {
    /// Opaque token from a previous page's `next_cursor`.
    #[serde(default)]
    pub cursor: Option<String>,
    /// Items per page (max 100). Defaults to 10.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Only list events whose active flag is set.
    #[serde(default)]
    pub active_only: bool,
}

/// Cursor pagination query parameters for wish listings.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WishListParams {
    /// Opaque token from a previous page's `next_cursor`.
    #[serde(default)]
    pub cursor: Option<String>,
    /// Items per page (max 100). Defaults to 10.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Only list approved wishes.
    #[serde(default)]
    pub approved_only: bool,
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CursorPageMeta {
    /// Items per page after clamping.
    pub per_page: u32,
    /// Total number of items across all pages.
    pub total: u64,
    /// Whether another page follows.
    pub has_next: bool,
    /// Token to pass as `cursor` for the next page.
    pub next_cursor: Option<String>,
}

const fn default_per_page() -> u32 {
    10
}

/// Decodes an optional cursor token.
///
/// # Errors
///
/// Returns [`WallError::InvalidCursor`] for a malformed token.
pub fn parse_cursor<C>(token: Option<&str>) -> Result<Option<C>, WallError>
where
    C: std::str::FromStr<Err = crate::domain::CursorParseError>,
{
    token
        .filter(|t| !t.is_empty())
        .map(str::parse)
        .transpose()
        .map_err(WallError::from)
}

/// Splits a service page into its items and the response metadata.
pub fn split_page<T>(page: Page<T>, per_page: u32) -> (Vec<T>, CursorPageMeta) {
    let meta = CursorPageMeta {
        per_page: per_page.clamp(1, MAX_PER_PAGE),
        total: page.total,
        has_next: page.has_next,
        next_cursor: page.next_cursor,
    };
    (page.items, meta)
}
