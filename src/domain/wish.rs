//! Wishes: one attendee's photo + message, owned by an event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EventId, WishCursor, WishId};

/// Maximum length of a wish message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Colour theme applied when the capture client does not send one.
pub const DEFAULT_COLOR_THEME: &str = "gold";

/// Kind of device a wish was captured on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Phone.
    Mobile,
    /// Tablet.
    Tablet,
    /// Desktop browser.
    Desktop,
    /// Generic web client.
    Web,
    /// Anything else, including unrecognised tags.
    #[default]
    #[serde(other)]
    Unknown,
}

impl DeviceType {
    /// Returns the stored tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Desktop => "desktop",
            Self::Web => "web",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a stored tag. Unrecognised tags map to [`DeviceType::Unknown`].
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "mobile" => Self::Mobile,
            "tablet" => Self::Tablet,
            "desktop" => Self::Desktop,
            "web" => Self::Web,
            _ => Self::Unknown,
        }
    }
}

/// Optional capture location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// A stored wish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Wish {
    /// Wish identifier.
    pub id: WishId,
    /// Owning event.
    pub event_id: EventId,
    /// Author name.
    pub user_name: String,
    /// Message text (at most [`MAX_MESSAGE_CHARS`]).
    pub message: String,
    /// Blob storage URL of the framed photo.
    pub photo_url: Option<String>,
    /// Server-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Moderation flag.
    pub approved: bool,
    /// Visibility flag.
    pub public: bool,
    /// Capture device tag.
    pub device_type: DeviceType,
    /// Capture location, if shared.
    pub location: Option<GeoPoint>,
    /// Colour theme tag.
    pub color_theme: String,
}

impl Wish {
    /// Builds a stored wish from a validated [`NewWish`].
    #[must_use]
    pub fn from_new(id: WishId, event_id: EventId, new: NewWish, now: DateTime<Utc>) -> Self {
        Self {
            id,
            event_id,
            user_name: new.user_name,
            message: new.message,
            photo_url: new.photo_url,
            created_at: now,
            approved: new.approved,
            public: new.public,
            device_type: new.device_type,
            location: new.location,
            color_theme: new
                .color_theme
                .unwrap_or_else(|| DEFAULT_COLOR_THEME.to_string()),
        }
    }

    /// Only approved, public wishes may be played on a display.
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        self.approved && self.public
    }

    /// Position of this wish in the creation-time ordering.
    #[must_use]
    pub fn cursor(&self) -> WishCursor {
        WishCursor::new(self.created_at, self.id)
    }

    /// Applies a partial update. `created_at` and ownership never change.
    pub fn apply(&mut self, patch: WishPatch) {
        if let Some(user_name) = patch.user_name {
            self.user_name = user_name;
        }
        if let Some(message) = patch.message {
            self.message = message;
        }
        if let Some(photo_url) = patch.photo_url {
            self.photo_url = Some(photo_url);
        }
        if let Some(approved) = patch.approved {
            self.approved = approved;
        }
        if let Some(public) = patch.public {
            self.public = public;
        }
        if let Some(device_type) = patch.device_type {
            self.device_type = device_type;
        }
        if let Some(location) = patch.location {
            self.location = Some(location);
        }
        if let Some(color_theme) = patch.color_theme {
            self.color_theme = color_theme;
        }
    }
}

/// Input for submitting a wish.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewWish {
    /// Author name (required).
    #[serde(default)]
    pub user_name: String,
    /// Message (required, at most [`MAX_MESSAGE_CHARS`]).
    #[serde(default)]
    pub message: String,
    /// URL of the already-uploaded photo.
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Initial moderation flag.
    #[serde(default)]
    pub approved: bool,
    /// Initial visibility flag.
    #[serde(default = "default_public")]
    pub public: bool,
    /// Capture device tag.
    #[serde(default)]
    pub device_type: DeviceType,
    /// Capture location.
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// Colour theme tag; defaults to [`DEFAULT_COLOR_THEME`].
    #[serde(default)]
    pub color_theme: Option<String>,
}

const fn default_public() -> bool {
    true
}

impl NewWish {
    /// Returns every validation problem; empty when the input is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.user_name.trim().is_empty() {
            errors.push("user name is required".to_string());
        }
        if self.message.trim().is_empty() {
            errors.push("message is required".to_string());
        }
        errors.extend(message_length_error(&self.message));
        errors.extend(photo_url_error(self.photo_url.as_deref()));
        errors
    }
}

/// Partial update of a wish (admin edit / moderation).
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct WishPatch {
    /// New author name.
    #[serde(default)]
    pub user_name: Option<String>,
    /// New message.
    #[serde(default)]
    pub message: Option<String>,
    /// New photo URL.
    #[serde(default)]
    pub photo_url: Option<String>,
    /// New moderation flag.
    #[serde(default)]
    pub approved: Option<bool>,
    /// New visibility flag.
    #[serde(default)]
    pub public: Option<bool>,
    /// New device tag.
    #[serde(default)]
    pub device_type: Option<DeviceType>,
    /// New location.
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// New colour theme.
    #[serde(default)]
    pub color_theme: Option<String>,
}

impl WishPatch {
    /// Patch that only sets the moderation flag.
    #[must_use]
    pub fn approved(approved: bool) -> Self {
        Self {
            approved: Some(approved),
            ..Self::default()
        }
    }

    /// Returns every validation problem of the fields being changed.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.user_name.as_deref().is_some_and(|v| v.trim().is_empty()) {
            errors.push("user name cannot be blank".to_string());
        }
        if let Some(message) = &self.message {
            if message.trim().is_empty() {
                errors.push("message cannot be blank".to_string());
            }
            errors.extend(message_length_error(message));
        }
        errors.extend(photo_url_error(self.photo_url.as_deref()));
        errors
    }
}

fn message_length_error(message: &str) -> Option<String> {
    (message.chars().count() > MAX_MESSAGE_CHARS)
        .then(|| format!("message cannot exceed {MAX_MESSAGE_CHARS} characters"))
}

fn photo_url_error(photo_url: Option<&str>) -> Option<String> {
    let url = photo_url?;
    if url.starts_with("https://") || url.starts_with("http://") {
        None
    } else {
        Some("photo url must point to uploaded storage (http or https)".to_string())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn new_wish() -> NewWish {
        NewWish {
            user_name: "Ana".to_string(),
            message: "Feliz navidad".to_string(),
            photo_url: Some("https://storage.example/wishes/ana.png".to_string()),
            approved: false,
            public: true,
            device_type: DeviceType::Mobile,
            location: None,
            color_theme: None,
        }
    }

    #[test]
    fn valid_wish_passes() {
        assert!(new_wish().validate().is_empty());
    }

    #[test]
    fn message_limit_counts_characters() {
        let mut wish = new_wish();
        wish.message = "ñ".repeat(MAX_MESSAGE_CHARS);
        assert!(wish.validate().is_empty());
        wish.message.push('ñ');
        assert_eq!(wish.validate().len(), 1);
    }

    #[test]
    fn inline_photo_is_rejected() {
        let mut wish = new_wish();
        wish.photo_url = Some("data:image/png;base64,AAAA".to_string());
        assert_eq!(wish.validate().len(), 1);
    }

    #[test]
    fn blank_author_and_message_are_rejected() {
        let mut wish = new_wish();
        wish.user_name = " ".to_string();
        wish.message = String::new();
        assert_eq!(wish.validate().len(), 2);
    }

    #[test]
    fn eligibility_needs_both_flags() {
        let mut wish = Wish::from_new(WishId::new(), EventId::new(), new_wish(), Utc::now());
        assert!(!wish.is_eligible());
        wish.apply(WishPatch::approved(true));
        assert!(wish.is_eligible());
        wish.public = false;
        assert!(!wish.is_eligible());
    }

    #[test]
    fn defaults_fill_in() {
        let json = r#"{"user_name":"Ana","message":"hola","device_type":"smart-tv"}"#;
        let Ok(parsed) = serde_json::from_str::<NewWish>(json) else {
            panic!("should parse");
        };
        assert!(parsed.public);
        assert!(!parsed.approved);
        assert_eq!(parsed.device_type, DeviceType::Unknown);
        let wish = Wish::from_new(WishId::new(), EventId::new(), parsed, Utc::now());
        assert_eq!(wish.color_theme, DEFAULT_COLOR_THEME);
    }

    #[test]
    fn device_tags_round_trip() {
        for device in [
            DeviceType::Mobile,
            DeviceType::Tablet,
            DeviceType::Desktop,
            DeviceType::Web,
            DeviceType::Unknown,
        ] {
            assert_eq!(DeviceType::from_tag(device.as_str()), device);
        }
    }
}
