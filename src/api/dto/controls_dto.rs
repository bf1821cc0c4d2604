//! Controls command DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Controls, EventId};

/// Request body for `POST /events/{id}/controls/start`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StartRequest {
    /// `true` starts playback on every display, `false` stops it.
    pub start: bool,
}

/// Request body for `POST /events/{id}/controls/redirect`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RedirectRequest {
    /// Route displays should switch to, e.g. `"/final"`.
    pub target: String,
}

/// Controls snapshot of one event.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ControlsResponse {
    /// Event identifier.
    pub event_id: EventId,
    /// Snapshot after the command.
    pub controls: Controls,
}
