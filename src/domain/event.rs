//! Photo-wall events: one deployed instance of the experience.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EventCursor, EventId};

/// Display settings shared by every client of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventSettings {
    /// CSS background colour of the display.
    pub background_color: String,
    /// Background music URL.
    #[serde(default)]
    pub music: String,
    /// Text shown at the end of the show.
    #[serde(default)]
    pub text_final: String,
    /// Photo frame overlay used by capture clients.
    #[serde(default)]
    pub frame_url: Option<String>,
    /// Desktop background image.
    #[serde(default)]
    pub background_url: Option<String>,
    /// Mobile background image.
    #[serde(default)]
    pub mobile_background_url: Option<String>,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            background_color: "#000000".to_string(),
            music: String::new(),
            text_final: String::new(),
            frame_url: None,
            background_url: None,
            mobile_background_url: None,
        }
    }
}

/// A stored event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Event {
    /// Event identifier.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Visual theme tag.
    pub theme: String,
    /// When the event opens.
    pub start_date: Option<DateTime<Utc>>,
    /// When the event closes.
    pub end_date: Option<DateTime<Utc>>,
    /// Manual on/off switch.
    pub is_active: bool,
    /// Denormalised wish counter, maintained on wish create/delete.
    pub total_wishes: u64,
    /// Intro video URL.
    pub video_url: Option<String>,
    /// Preview image URL.
    pub preview_url: Option<String>,
    /// Display settings.
    pub settings: EventSettings,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Builds a stored event from a validated [`NewEvent`].
    #[must_use]
    pub fn from_new(id: EventId, new: NewEvent, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
            theme: new.theme,
            start_date: new.start_date,
            end_date: new.end_date,
            is_active: new.is_active,
            total_wishes: 0,
            video_url: new.video_url,
            preview_url: new.preview_url,
            settings: new.settings,
            created_at: now,
            updated_at: now,
        }
    }

    /// Position of this event in the creation-time ordering.
    #[must_use]
    pub fn cursor(&self) -> EventCursor {
        EventCursor::new(self.created_at, self.id)
    }

    /// Returns `true` if the event is switched on and `now` falls inside its
    /// date window. Without a complete window the flag alone decides.
    #[must_use]
    pub fn is_currently_active(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => start <= now && now <= end,
            _ => true,
        }
    }

    /// Applies a partial update and bumps `updated_at`.
    pub fn apply(&mut self, patch: EventPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = Some(start_date);
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = Some(end_date);
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if let Some(video_url) = patch.video_url {
            self.video_url = Some(video_url);
        }
        if let Some(preview_url) = patch.preview_url {
            self.preview_url = Some(preview_url);
        }
        if let Some(settings) = patch.settings {
            self.settings = settings;
        }
        self.updated_at = now;
    }
}

/// Input for creating an event.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewEvent {
    /// Display name (required).
    #[serde(default)]
    pub name: String,
    /// Description (required).
    #[serde(default)]
    pub description: String,
    /// Theme tag (required).
    #[serde(default)]
    pub theme: String,
    /// Opening date (required).
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    /// Closing date (required, not before `start_date`).
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Manual on/off switch.
    #[serde(default)]
    pub is_active: bool,
    /// Intro video URL.
    #[serde(default)]
    pub video_url: Option<String>,
    /// Preview image URL.
    #[serde(default)]
    pub preview_url: Option<String>,
    /// Display settings.
    #[serde(default)]
    pub settings: EventSettings,
}

impl NewEvent {
    /// Returns every validation problem; empty when the input is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("event name is required".to_string());
        }
        if self.description.trim().is_empty() {
            errors.push("event description is required".to_string());
        }
        if self.theme.trim().is_empty() {
            errors.push("event theme is required".to_string());
        }
        if self.start_date.is_none() {
            errors.push("start date is required".to_string());
        }
        if self.end_date.is_none() {
            errors.push("end date is required".to_string());
        }
        errors.extend(date_order_error(self.start_date, self.end_date));
        errors
    }
}

/// Partial update of an event. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EventPatch {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New theme.
    #[serde(default)]
    pub theme: Option<String>,
    /// New opening date.
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    /// New closing date.
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// New active flag.
    #[serde(default)]
    pub is_active: Option<bool>,
    /// New intro video URL.
    #[serde(default)]
    pub video_url: Option<String>,
    /// New preview image URL.
    #[serde(default)]
    pub preview_url: Option<String>,
    /// Replacement settings object.
    #[serde(default)]
    pub settings: Option<EventSettings>,
}

impl EventPatch {
    /// Patch that only flips the active flag.
    #[must_use]
    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }

    /// Validates the patch against the event it will be applied to.
    #[must_use]
    pub fn validate(&self, current: &Event) -> Vec<String> {
        let mut errors = Vec::new();
        for (field, value) in [
            ("name", &self.name),
            ("description", &self.description),
            ("theme", &self.theme),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                errors.push(format!("event {field} cannot be blank"));
            }
        }
        let start = self.start_date.or(current.start_date);
        let end = self.end_date.or(current.end_date);
        errors.extend(date_order_error(start, end));
        errors
    }
}

fn date_order_error(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Option<String> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => {
            Some("start date must not be after end date".to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn valid_new_event() -> NewEvent {
        let now = Utc::now();
        NewEvent {
            name: "Gala".to_string(),
            description: "Year-end gala".to_string(),
            theme: "christmas".to_string(),
            start_date: Some(now - Duration::hours(1)),
            end_date: Some(now + Duration::hours(1)),
            is_active: true,
            ..NewEvent::default()
        }
    }

    #[test]
    fn valid_event_has_no_errors() {
        assert!(valid_new_event().validate().is_empty());
    }

    #[test]
    fn blank_fields_are_reported() {
        let new = NewEvent::default();
        let errors = new.validate();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let mut new = valid_new_event();
        std::mem::swap(&mut new.start_date, &mut new.end_date);
        assert_eq!(new.validate(), vec!["start date must not be after end date"]);
    }

    #[test]
    fn active_window() {
        let now = Utc::now();
        let mut event = Event::from_new(EventId::new(), valid_new_event(), now);
        assert!(event.is_currently_active(now));
        assert!(!event.is_currently_active(now + Duration::hours(2)));

        event.end_date = None;
        assert!(event.is_currently_active(now + Duration::hours(2)));

        event.is_active = false;
        assert!(!event.is_currently_active(now));
    }

    #[test]
    fn patch_validation_checks_merged_dates() {
        let now = Utc::now();
        let event = Event::from_new(EventId::new(), valid_new_event(), now);
        let patch = EventPatch {
            start_date: Some(now + Duration::days(1)),
            ..EventPatch::default()
        };
        assert_eq!(patch.validate(&event).len(), 1);

        let blank = EventPatch {
            name: Some("  ".to_string()),
            ..EventPatch::default()
        };
        assert_eq!(blank.validate(&event), vec!["event name cannot be blank"]);
    }

    #[test]
    fn apply_bumps_updated_at() {
        let now = Utc::now();
        let mut event = Event::from_new(EventId::new(), valid_new_event(), now);
        let later = now + Duration::minutes(5);
        event.apply(EventPatch::active(false), later);
        assert!(!event.is_active);
        assert_eq!(event.updated_at, later);
        assert_eq!(event.created_at, now);
    }
}
