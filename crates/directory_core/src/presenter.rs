use serde::{Deserialize, Serialize};
use shared::domain::{BakeryRecord, PlaceId, TagState};

pub const HOURS_FALLBACK: &str = "Please visit website for hours.";
pub const WEBSITE_FALLBACK: &str = "Website unavailable";
pub const PHONE_FALLBACK: &str = "Phone number unavailable";

/// Slots a caller renders when a record has no photos at all.
pub const NO_PHOTO_PLACEHOLDER_SLOTS: usize = 10;

const DEFAULT_DIRECTIONS_ENDPOINT: &str = "https://www.google.com/maps/dir/?api=1&destination=";
const DIAL_SCHEME: &str = "telprompt://";
const METERS_PER_MILE: f64 = 1609.344;

/// A tappable display value: the text to show and whether tapping it does
/// anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLabel {
    pub label: String,
    pub enabled: bool,
}

impl ActionLabel {
    fn enabled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            enabled: true,
        }
    }

    fn disabled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            enabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRow {
    pub label: String,
    pub state: TagState,
}

/// Per-place contact override: a fixed website and/or a disabled phone
/// action, applied regardless of what the lookup returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRule {
    pub place_id: PlaceId,
    pub website: Option<String>,
    pub disable_phone: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactOverrides {
    rules: Vec<ContactRule>,
}

impl ContactOverrides {
    pub fn new(rules: Vec<ContactRule>) -> Self {
        Self { rules }
    }

    fn for_place(&self, place_id: &PlaceId) -> Option<&ContactRule> {
        self.rules.iter().find(|rule| rule.place_id == *place_id)
    }
}

impl Default for ContactOverrides {
    // Bread Riot Bakehouse lists stale contact data upstream.
    fn default() -> Self {
        Self::new(vec![ContactRule {
            place_id: PlaceId::from("ChIJZ7vNGwP1UocRlrFBI9Tr-Ws"),
            website: Some("https://breadriotbakehouse.com".to_string()),
            disable_phone: true,
        }])
    }
}

/// Stateless formatting over one record: everything the detail screen
/// renders is derived here.
#[derive(Debug, Clone)]
pub struct DetailPresenter {
    photo_endpoint: String,
    directions_endpoint: String,
    contact_overrides: ContactOverrides,
}

impl Default for DetailPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl DetailPresenter {
    pub fn new() -> Self {
        Self::with_overrides(ContactOverrides::default())
    }

    pub fn with_overrides(contact_overrides: ContactOverrides) -> Self {
        Self {
            photo_endpoint: places_integration::DEFAULT_PHOTO_ENDPOINT.to_string(),
            directions_endpoint: DEFAULT_DIRECTIONS_ENDPOINT.to_string(),
            contact_overrides,
        }
    }

    pub fn with_endpoints(
        photo_endpoint: impl Into<String>,
        directions_endpoint: impl Into<String>,
        contact_overrides: ContactOverrides,
    ) -> Self {
        Self {
            photo_endpoint: photo_endpoint.into(),
            directions_endpoint: directions_endpoint.into(),
            contact_overrides,
        }
    }

    pub fn format_hours(&self, record: &BakeryRecord) -> String {
        match &record.hours_text {
            Some(lines) => lines.join("\n"),
            None => HOURS_FALLBACK.to_string(),
        }
    }

    pub fn website_action(&self, record: &BakeryRecord) -> ActionLabel {
        if let Some(rule) = self.contact_overrides.for_place(&record.place_id) {
            if let Some(website) = &rule.website {
                return ActionLabel::enabled(website.clone());
            }
        }
        match &record.website {
            Some(site) => ActionLabel::enabled(site.clone()),
            None => ActionLabel::disabled(WEBSITE_FALLBACK),
        }
    }

    pub fn phone_action(&self, record: &BakeryRecord) -> ActionLabel {
        let disabled = self
            .contact_overrides
            .for_place(&record.place_id)
            .map(|rule| rule.disable_phone)
            .unwrap_or(false);
        if disabled {
            return ActionLabel::disabled(PHONE_FALLBACK);
        }
        match &record.phone_number {
            Some(number) => ActionLabel::enabled(number.clone()),
            None => ActionLabel::disabled(PHONE_FALLBACK),
        }
    }

    /// Digits-only dial URL for the phone action, or `None` when the action
    /// is disabled.
    pub fn dial_url(&self, record: &BakeryRecord) -> Option<String> {
        let action = self.phone_action(record);
        if !action.enabled {
            return None;
        }
        let digits: String = action
            .label
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        if digits.is_empty() {
            return None;
        }
        Some(format!("{DIAL_SCHEME}{digits}"))
    }

    pub fn tag_rows(&self, record: &BakeryRecord) -> Vec<TagRow> {
        vec![
            TagRow {
                label: "Organic".to_string(),
                state: record.tags.organic,
            },
            TagRow {
                label: "Milled In-house".to_string(),
                state: record.tags.milled_in_house,
            },
            TagRow {
                label: "Serves Food".to_string(),
                state: record.tags.serves_food,
            },
            TagRow {
                label: "Sells Loaves".to_string(),
                state: record.tags.sells_loaves,
            },
        ]
    }

    /// One URL per photo reference, in input order. No photos means an empty
    /// vector; callers render `NO_PHOTO_PLACEHOLDER_SLOTS` placeholders.
    pub fn photo_urls(&self, record: &BakeryRecord, max_width: u32, api_key: &str) -> Vec<String> {
        let Some(photos) = &record.photos else {
            return Vec::new();
        };
        photos
            .iter()
            .map(|reference| {
                format!(
                    "{}?maxwidth={}&photoreference={}&key={}",
                    self.photo_endpoint, max_width, reference, api_key
                )
            })
            .collect()
    }

    pub fn thumbnail_url(
        &self,
        record: &BakeryRecord,
        max_width: u32,
        api_key: &str,
    ) -> Option<String> {
        self.photo_urls(record, max_width, api_key).into_iter().next()
    }

    /// Routing URL from the record name: spaces become `+`, single quotes
    /// are dropped.
    pub fn directions_url(&self, record: &BakeryRecord) -> String {
        let destination = record.name.replace(' ', "+").replace('\'', "");
        format!("{}{}", self.directions_endpoint, destination)
    }

    /// Re-flows the comma-separated address into the one- or two-line layout
    /// used by the detail screen.
    pub fn format_address_lines(&self, record: &BakeryRecord) -> String {
        let parts: Vec<&str> = record.formatted_address.split(", ").collect();
        match parts.as_slice() {
            [a, b] => format!("{a}\n{b}"),
            [a, b, c] => format!("{a}\n{b}, {c}"),
            [a, b, c, d] => format!("{a}\n{b}, {c}, {d}"),
            [a, b, c, d, e] => format!("{a}, {b}\n{c}, {d}, {e}"),
            _ => record.formatted_address.clone(),
        }
    }

    pub fn distance_label(&self, record: &BakeryRecord) -> Option<String> {
        let meters = record.distance_from_user?;
        let miles = meters / METERS_PER_MILE;
        Some(format!("{miles:.1} miles away"))
    }
}

#[cfg(test)]
#[path = "tests/presenter_tests.rs"]
mod tests;
