use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceId(pub String);

impl PlaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlaceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Haversine great-circle distance in meters.
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_METERS * c
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagState {
    Confirmed,
    Absent,
    #[default]
    Unknown,
}

impl TagState {
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => TagState::Confirmed,
            Some(false) => TagState::Absent,
            None => TagState::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tags {
    pub organic: TagState,
    pub milled_in_house: TagState,
    pub serves_food: TagState,
    pub sells_loaves: TagState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BakerySeed {
    pub place_id: PlaceId,
    pub name: String,
    pub formatted_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakeryRecord {
    pub place_id: PlaceId,
    pub name: String,
    pub formatted_address: String,
    pub location: Option<GeoPoint>,
    pub distance_from_user: Option<f64>,
    pub hours_text: Option<Vec<String>>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub photos: Option<Vec<String>>,
    pub tags: Tags,
    pub info_note: Option<String>,
    pub enriched_at: Option<DateTime<Utc>>,
}

impl BakeryRecord {
    pub fn from_seed(seed: BakerySeed) -> Self {
        Self {
            place_id: seed.place_id,
            name: seed.name,
            formatted_address: seed.formatted_address,
            location: None,
            distance_from_user: None,
            hours_text: None,
            website: None,
            phone_number: None,
            photos: None,
            tags: Tags::default(),
            info_note: None,
            enriched_at: None,
        }
    }

    pub fn needs_details(&self) -> bool {
        self.enriched_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_state_maps_tri_state_flags() {
        assert_eq!(TagState::from_flag(Some(true)), TagState::Confirmed);
        assert_eq!(TagState::from_flag(Some(false)), TagState::Absent);
        assert_eq!(TagState::from_flag(None), TagState::Unknown);
        assert_eq!(TagState::default(), TagState::Unknown);
    }

    #[test]
    fn haversine_matches_known_city_pair() {
        // San Francisco to Los Angeles, roughly 559 km.
        let sf = GeoPoint::new(37.7749, -122.4194);
        let la = GeoPoint::new(34.0522, -118.2437);
        let d = sf.distance_meters(&la);
        assert!((d - 559_000.0).abs() < 5_000.0, "got {d}");
    }

    #[test]
    fn haversine_is_zero_for_identical_points() {
        let p = GeoPoint::new(36.1627, -86.7816);
        assert!(p.distance_meters(&p) < 1e-6);
    }

    #[test]
    fn seed_record_needs_details() {
        let record = BakeryRecord::from_seed(BakerySeed {
            place_id: PlaceId::from("p1"),
            name: "Dozen Bakery".to_string(),
            formatted_address: "516 Hagan St, Nashville, TN 37203".to_string(),
        });
        assert!(record.needs_details());
        assert_eq!(record.tags.organic, TagState::Unknown);
        assert!(record.photos.is_none());
    }

    #[test]
    fn place_id_serializes_as_bare_string() {
        let id = PlaceId::from("ChIJbf8C1yFxdDkR3n12P4DkKt0");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"ChIJbf8C1yFxdDkR3n12P4DkKt0\"");
    }
}
