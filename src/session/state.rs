//! Session state machine of a single display.

use serde::Serialize;

/// Lifecycle state of a display session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Playback is not started; the display shows its join screen.
    #[default]
    Waiting,
    /// Playback was started but no content has been loaded yet.
    Preparing,
    /// Content is loaded and the play index is advancing.
    Playing,
}

/// Inputs of the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// `start` went from `false` to `true`.
    Started,
    /// `start` went from `true` to `false`.
    Stopped,
    /// The first non-empty batch of content reached the queue.
    ContentLoaded,
}

/// Result of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State after the event.
    pub state: SessionState,
    /// The caller must discard every cached item and cursor.
    pub reset: bool,
}

impl Transition {
    const fn stay(state: SessionState) -> Self {
        Self {
            state,
            reset: false,
        }
    }

    const fn reset_to(state: SessionState) -> Self {
        Self { state, reset: true }
    }
}

/// Pure transition function.
///
/// Starting and stopping both discard all progress; there is no pause.
/// Any pair not listed below leaves the state untouched.
///
/// | from        | event           | to          | reset |
/// |-------------|-----------------|-------------|-------|
/// | `Waiting`   | `Started`       | `Preparing` | yes   |
/// | `Preparing` | `Stopped`       | `Waiting`   | yes   |
/// | `Playing`   | `Stopped`       | `Waiting`   | yes   |
/// | `Preparing` | `ContentLoaded` | `Playing`   | no    |
#[must_use]
pub const fn transition(state: SessionState, event: SessionEvent) -> Transition {
    match (state, event) {
        (SessionState::Waiting, SessionEvent::Started) => {
            Transition::reset_to(SessionState::Preparing)
        }
        (SessionState::Preparing | SessionState::Playing, SessionEvent::Stopped) => {
            Transition::reset_to(SessionState::Waiting)
        }
        (SessionState::Preparing, SessionEvent::ContentLoaded) => {
            Transition::stay(SessionState::Playing)
        }
        (state, _) => Transition::stay(state),
    }
}
