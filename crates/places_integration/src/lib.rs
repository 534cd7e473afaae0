//! Places-lookup and photo-fetch collaborators for the bakery directory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::domain::{GeoPoint, PlaceId, TagState, Tags};
use shared::error::LookupFailure;
use thiserror::Error;
use tracing::info;
use url::Url;

pub const DEFAULT_DETAILS_ENDPOINT: &str =
    "https://maps.googleapis.com/maps/api/place/details/json";
pub const DEFAULT_PHOTO_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/place/photo";

/// Fields requested from the details endpoint. Name and address come from
/// seed data and are not requested again.
const DETAILS_FIELDS: &str = "geometry,opening_hours,website,international_phone_number,photo";

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup request for {place_id} failed: {source}")]
    Http {
        place_id: PlaceId,
        #[source]
        source: reqwest::Error,
    },
    #[error("lookup for {place_id} returned HTTP {status}: {body}")]
    Server {
        place_id: PlaceId,
        status: u16,
        body: String,
    },
    #[error("lookup for {place_id} returned status {status}")]
    Status { place_id: PlaceId, status: String },
    #[error("place {place_id} is unknown to the lookup service")]
    NotFound { place_id: PlaceId },
    #[error("lookup response for {place_id} could not be parsed: {source}")]
    Decode {
        place_id: PlaceId,
        #[source]
        source: serde_json::Error,
    },
    #[error("no place lookup configured for {place_id}")]
    Unavailable { place_id: PlaceId },
}

impl LookupError {
    pub fn place_id(&self) -> &PlaceId {
        match self {
            LookupError::Http { place_id, .. }
            | LookupError::Server { place_id, .. }
            | LookupError::Status { place_id, .. }
            | LookupError::NotFound { place_id }
            | LookupError::Decode { place_id, .. }
            | LookupError::Unavailable { place_id } => place_id,
        }
    }

    /// Lowers the error to the clonable per-record failure report.
    pub fn failure(&self) -> LookupFailure {
        LookupFailure::new(self.place_id().clone(), self.cause())
    }

    fn cause(&self) -> String {
        match self {
            LookupError::Http { source, .. } => format!("http: {source}"),
            LookupError::Server { status, body, .. } => {
                format!("server returned {status}: {body}")
            }
            LookupError::Status { status, .. } => format!("service status {status}"),
            LookupError::NotFound { .. } => "place not found".to_string(),
            LookupError::Decode { source, .. } => format!("malformed response: {source}"),
            LookupError::Unavailable { .. } => "no lookup backend configured".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("photo request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("photo request for {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Tri-state tag flags as the lookup service reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFlags {
    #[serde(default)]
    pub organic: Option<bool>,
    #[serde(default)]
    pub milled_in_house: Option<bool>,
    #[serde(default)]
    pub serves_food: Option<bool>,
    #[serde(default)]
    pub sells_loaves: Option<bool>,
}

impl From<TagFlags> for Tags {
    fn from(flags: TagFlags) -> Self {
        Tags {
            organic: TagState::from_flag(flags.organic),
            milled_in_house: TagState::from_flag(flags.milled_in_house),
            serves_food: TagState::from_flag(flags.serves_food),
            sells_loaves: TagState::from_flag(flags.sells_loaves),
        }
    }
}

/// One successful lookup payload, ready to merge into a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub location: Option<GeoPoint>,
    pub hours_text: Option<Vec<String>>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub photos: Option<Vec<String>>,
    pub tags: TagFlags,
    pub info_note: Option<String>,
}

#[async_trait]
pub trait PlaceLookup: Send + Sync {
    async fn lookup(&self, place_id: &PlaceId) -> Result<PlaceDetails, LookupError>;
}

#[async_trait]
pub trait PhotoFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct DetailsEnvelope {
    status: String,
    #[serde(default)]
    result: Option<DetailsResult>,
}

#[derive(Debug, Deserialize)]
struct DetailsResult {
    #[serde(default)]
    geometry: Option<Geometry>,
    #[serde(default)]
    opening_hours: Option<OpeningHours>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    international_phone_number: Option<String>,
    #[serde(default)]
    photos: Option<Vec<PhotoRef>>,
    #[serde(default)]
    tags: TagFlags,
    #[serde(default)]
    info: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: WireLatLng,
}

#[derive(Debug, Deserialize)]
struct WireLatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct OpeningHours {
    #[serde(default)]
    weekday_text: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PhotoRef {
    photo_reference: String,
}

impl DetailsResult {
    fn into_details(self) -> PlaceDetails {
        PlaceDetails {
            location: self
                .geometry
                .map(|g| GeoPoint::new(g.location.lat, g.location.lng)),
            hours_text: self.opening_hours.map(|h| h.weekday_text),
            website: self.website,
            phone_number: self.international_phone_number,
            photos: self
                .photos
                .map(|list| list.into_iter().map(|p| p.photo_reference).collect()),
            tags: self.tags,
            info_note: self.info,
        }
    }
}

/// Lookup client speaking the places details wire format: a JSON envelope
/// `{ "status": ..., "result": ... }` behind a GET with `place_id`,
/// `fields` and `key` query parameters.
pub struct HttpPlaceLookup {
    http: reqwest::Client,
    details_endpoint: String,
    api_key: String,
}

impl HttpPlaceLookup {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            details_endpoint: DEFAULT_DETAILS_ENDPOINT.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Points the client at a non-default details endpoint. Rejects
    /// unparseable endpoint URLs up front rather than at first lookup.
    pub fn with_endpoint(
        details_endpoint: &str,
        api_key: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        Url::parse(details_endpoint)?;
        Ok(Self {
            http: reqwest::Client::new(),
            details_endpoint: details_endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl PlaceLookup for HttpPlaceLookup {
    async fn lookup(&self, place_id: &PlaceId) -> Result<PlaceDetails, LookupError> {
        info!(place_id = %place_id, "places: requesting details");
        let response = self
            .http
            .get(&self.details_endpoint)
            .query(&[
                ("place_id", place_id.as_str()),
                ("fields", DETAILS_FIELDS),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|source| LookupError::Http {
                place_id: place_id.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Server {
                place_id: place_id.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|source| LookupError::Http {
            place_id: place_id.clone(),
            source,
        })?;
        let envelope: DetailsEnvelope =
            serde_json::from_str(&body).map_err(|source| LookupError::Decode {
                place_id: place_id.clone(),
                source,
            })?;

        match envelope.status.as_str() {
            "OK" => {}
            "NOT_FOUND" | "ZERO_RESULTS" => {
                return Err(LookupError::NotFound {
                    place_id: place_id.clone(),
                })
            }
            other => {
                return Err(LookupError::Status {
                    place_id: place_id.clone(),
                    status: other.to_string(),
                })
            }
        }

        let result = envelope.result.ok_or_else(|| LookupError::Status {
            place_id: place_id.clone(),
            status: "OK without result".to_string(),
        })?;
        Ok(result.into_details())
    }
}

pub struct HttpPhotoFetcher {
    http: reqwest::Client,
}

impl HttpPhotoFetcher {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for HttpPhotoFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PhotoFetcher for HttpPhotoFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
