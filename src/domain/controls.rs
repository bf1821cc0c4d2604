//! The shared playback controls record and its partial updates.
//!
//! One [`Controls`] record exists per event. Its three fields are
//! independent last-write-wins scalars: the store offers no cross-field
//! transaction, so readers must tolerate seeing a half-applied admin
//! action (for example `redirect` written while `start` is still stale).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Snapshot of `events/{eventId}/controls`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Controls {
    /// Whether playback should be running on the displays.
    #[serde(default)]
    pub start: bool,
    /// Route the displays should switch to (e.g. `"/final"`). Cleared by
    /// the writer shortly after being set so the command can be repeated.
    #[serde(default)]
    pub redirect: Option<String>,
    /// Reload tag. Any change after the first observed value forces a full
    /// reload of every display.
    #[serde(default)]
    pub reload_at: Option<i64>,
}

impl Controls {
    /// Returns the controls with `patch` applied. Fields absent from the
    /// patch keep their current value.
    #[must_use]
    pub fn patched(&self, patch: &ControlsPatch) -> Self {
        let mut next = self.clone();
        if let Some(start) = patch.start {
            next.start = start;
        }
        if let Some(redirect) = &patch.redirect {
            next.redirect.clone_from(redirect);
        }
        if let Some(reload_at) = patch.reload_at {
            next.reload_at = reload_at;
        }
        next
    }
}

/// Partial update of a [`Controls`] record.
///
/// `None` leaves a field untouched; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlsPatch {
    /// New value for `start`.
    pub start: Option<bool>,
    /// New value for `redirect`.
    pub redirect: Option<Option<String>>,
    /// New value for `reloadAt`.
    pub reload_at: Option<Option<i64>>,
}

impl ControlsPatch {
    /// Patch that only writes `start`.
    #[must_use]
    pub fn start(value: bool) -> Self {
        Self {
            start: Some(value),
            ..Self::default()
        }
    }

    /// Patch that only writes `redirect`.
    #[must_use]
    pub fn redirect(target: Option<String>) -> Self {
        Self {
            redirect: Some(target),
            ..Self::default()
        }
    }

    /// Patch that only writes `reloadAt`.
    #[must_use]
    pub fn reload_at(tag: i64) -> Self {
        Self {
            reload_at: Some(Some(tag)),
            ..Self::default()
        }
    }

    /// Returns `true` if the patch would not change anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.redirect.is_none() && self.reload_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_touches_only_named_fields() {
        let controls = Controls {
            start: true,
            redirect: Some("/final".to_string()),
            reload_at: Some(1000),
        };
        let next = controls.patched(&ControlsPatch::start(false));
        assert!(!next.start);
        assert_eq!(next.redirect.as_deref(), Some("/final"));
        assert_eq!(next.reload_at, Some(1000));
    }

    #[test]
    fn redirect_patch_can_clear() {
        let controls = Controls {
            redirect: Some("/finalmsn".to_string()),
            ..Controls::default()
        };
        let next = controls.patched(&ControlsPatch::redirect(None));
        assert_eq!(next.redirect, None);
    }

    #[test]
    fn empty_patch_is_identity() {
        let controls = Controls {
            start: true,
            redirect: None,
            reload_at: Some(5),
        };
        let patch = ControlsPatch::default();
        assert!(patch.is_empty());
        assert_eq!(controls.patched(&patch), controls);
    }

    #[test]
    fn uses_store_field_names() {
        let controls = Controls {
            start: true,
            redirect: None,
            reload_at: Some(1001),
        };
        let json = serde_json::to_value(&controls).unwrap_or_default();
        assert_eq!(json["reloadAt"], 1001);
        assert_eq!(json["start"], true);
        assert!(json["redirect"].is_null());
    }

    #[test]
    fn missing_fields_default() {
        let parsed: Result<Controls, _> = serde_json::from_str("{}");
        assert_eq!(parsed.ok(), Some(Controls::default()));
    }
}
