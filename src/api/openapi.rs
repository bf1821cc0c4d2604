//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::handlers::{controls, events, system, wishes};

/// Generated OpenAPI description, served by Swagger UI when the
/// `swagger-ui` feature is enabled.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "wishwall-gateway",
        description = "Events, wishes and realtime display controls for the photo wall."
    ),
    paths(
        system::health_handler,
        events::create_event,
        events::list_events,
        events::get_event,
        events::update_event,
        events::delete_event,
        events::toggle_event_active,
        wishes::create_wish,
        wishes::list_wishes,
        wishes::get_wish,
        wishes::update_wish,
        wishes::delete_wish,
        wishes::toggle_wish_approval,
        controls::get_controls,
        controls::set_start,
        controls::redirect,
        controls::force_reload,
        controls::display_view,
    ),
    tags(
        (name = "System", description = "Service health"),
        (name = "Events", description = "Photo-wall events"),
        (name = "Wishes", description = "Submitted photos and messages"),
        (name = "Controls", description = "Remote control of every display of an event"),
    )
)]
pub struct ApiDoc;
