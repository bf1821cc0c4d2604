//! Data Transfer Objects for REST request/response serialization.
//!
//! Create and update bodies reuse the domain input types
//! ([`crate::domain::NewEvent`], [`crate::domain::WishPatch`], ...) directly.

pub mod common_dto;
pub mod controls_dto;
pub mod event_dto;

pub use common_dto::*;
pub use controls_dto::*;
pub use event_dto::*;
