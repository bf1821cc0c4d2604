//! Service layer: business logic orchestration.
//!
//! [`WallService`] validates event and wish input, delegates storage to a
//! [`crate::store::ContentStore`], and emits events through the
//! [`super::domain::EventBus`].

pub mod wall_service;

pub use wall_service::{MAX_PER_PAGE, Page, WallService};
