//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` lets admin panels and displays follow
//! the controls and wish feed of the events they subscribe to.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
