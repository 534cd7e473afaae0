pub mod domain;
pub mod error;

pub use domain::{BakeryRecord, BakerySeed, GeoPoint, PlaceId, TagState, Tags};
pub use error::LookupFailure;
