//! Per-display session lifecycle derived from the controls record.
//!
//! [`state`] holds the explicit `Waiting | Preparing | Playing` machine and
//! its pure transition function. [`observer`] turns raw controls snapshots
//! into the edge-triggered signals that drive it.

pub mod observer;
pub mod state;

pub use observer::{ControlsObserver, SessionSignal};
pub use state::{SessionEvent, SessionState, Transition, transition};
