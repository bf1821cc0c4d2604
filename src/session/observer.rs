//! Edge detection over controls snapshots.
//!
//! Every snapshot is treated as a full re-statement of the record, never as
//! a delta, so a redelivered snapshot produces no signals.

use serde::Serialize;

use crate::domain::Controls;

/// Instruction derived from a change in the controls record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "signal", content = "target", rename_all = "snake_case")]
pub enum SessionSignal {
    /// `start` flipped to `true`.
    Start,
    /// `start` flipped to `false`.
    Stop,
    /// Present a different client route.
    Navigate(String),
    /// Perform a full reload.
    Reload,
}

/// Remembers what a display has already seen of its controls record.
#[derive(Debug, Clone, Default)]
pub struct ControlsObserver {
    started: bool,
    last_redirect: Option<String>,
    reload_baseline: Option<i64>,
    current_route: Option<String>,
    last_snapshot: Option<Controls>,
}

impl ControlsObserver {
    /// Creates an observer for a client that has seen nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an observer for a client currently presenting `route`.
    #[must_use]
    pub fn at_route(route: impl Into<String>) -> Self {
        Self {
            current_route: Some(route.into()),
            ..Self::default()
        }
    }

    /// Route the client is presenting, if known.
    #[must_use]
    pub fn current_route(&self) -> Option<&str> {
        self.current_route.as_deref()
    }

    /// Records that the client moved to another route on its own.
    pub fn set_route(&mut self, route: impl Into<String>) {
        self.current_route = Some(route.into());
    }

    /// Last snapshot passed to [`observe`](Self::observe).
    #[must_use]
    pub const fn last_snapshot(&self) -> Option<&Controls> {
        self.last_snapshot.as_ref()
    }

    /// Whether the last observed `start` was `true`.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Folds a snapshot into the observer and returns the signals it
    /// implies, `Reload` first.
    pub fn observe(&mut self, controls: &Controls) -> Vec<SessionSignal> {
        let mut signals = Vec::new();

        if let Some(reload_at) = controls.reload_at {
            match self.reload_baseline {
                None => self.reload_baseline = Some(reload_at),
                Some(seen) if seen != reload_at => {
                    self.reload_baseline = Some(reload_at);
                    signals.push(SessionSignal::Reload);
                }
                Some(_) => {}
            }
        }

        if controls.start != self.started {
            self.started = controls.start;
            signals.push(if controls.start {
                SessionSignal::Start
            } else {
                SessionSignal::Stop
            });
        }

        let redirect = controls.redirect.as_deref().filter(|r| !r.trim().is_empty());
        if redirect != self.last_redirect.as_deref() {
            self.last_redirect = redirect.map(str::to_string);
            if let Some(target) = redirect.filter(|t| self.current_route.as_deref() != Some(*t)) {
                self.current_route = Some(target.to_string());
                signals.push(SessionSignal::Navigate(target.to_string()));
            }
        }

        self.last_snapshot = Some(controls.clone());
        signals
    }
}
