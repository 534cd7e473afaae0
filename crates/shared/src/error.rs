use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PlaceId;

/// Per-record lookup failure surfaced to callers. Failures are reported,
/// never retried; the record stays usable with its seed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("lookup for place {place_id} failed: {message}")]
pub struct LookupFailure {
    pub place_id: PlaceId,
    pub message: String,
    pub failed_at: DateTime<Utc>,
}

impl LookupFailure {
    pub fn new(place_id: PlaceId, message: impl Into<String>) -> Self {
        Self {
            place_id,
            message: message.into(),
            failed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_display_carries_place_and_message() {
        let failure = LookupFailure::new(PlaceId::from("p9"), "service unreachable");
        assert_eq!(
            failure.to_string(),
            "lookup for place p9 failed: service unreachable"
        );
    }
}
