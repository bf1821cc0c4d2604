//! # wishwall-gateway
//!
//! Realtime coordination service for an event photo wall: attendees submit
//! wishes (a photo and a message), displays replay the approved ones in a
//! loop, and an admin remote starts, stops, redirects and reloads every
//! display of an event at once.
//!
//! The only shared mutable object is each event's small controls record
//! (`start`, `redirect`, `reloadAt`). Displays never receive commands
//! directly; they subscribe to the record and re-derive their state from
//! every snapshot. Content reaches them by polling the wish feed with a
//! backward/forward cursor walk.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)          ── AdminCommandEmitter (admin/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── WallService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── ControlsStore / ContentStore (store/)
//!     │       ├── in-memory
//!     │       └── PostgreSQL content store
//!     │
//!     └── DisplayRegistry → DisplayPlayer (playback/) ── session (session/)
//! ```

pub mod admin;
pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod playback;
pub mod service;
pub mod session;
pub mod store;
pub mod ws;
