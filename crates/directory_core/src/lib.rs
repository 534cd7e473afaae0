use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use places_integration::{LookupError, PlaceDetails, PlaceLookup};
use shared::domain::{BakeryRecord, BakerySeed, GeoPoint, PlaceId, Tags};
use shared::error::LookupFailure;
use tokio::{
    sync::{broadcast, Mutex},
    task::{AbortHandle, JoinHandle},
};
use tracing::{info, warn};

pub mod detail;
pub mod presenter;

pub use detail::DetailSession;
pub use presenter::{ActionLabel, ContactOverrides, ContactRule, DetailPresenter, TagRow};

#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryEvent {
    WorkingSetLoaded { count: usize },
    RecordEnriched { place_id: PlaceId },
    EnrichmentFailed { failure: LookupFailure },
    WorkingSetSorted,
    UserLocationUpdated { location: GeoPoint },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub enriched: usize,
    pub failed: usize,
    pub cancelled: usize,
}

/// One display-name override: applies when a record carries `name` and its
/// address contains `address_contains`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayNameRule {
    pub name: String,
    pub address_contains: String,
    pub display_name: String,
}

impl DisplayNameRule {
    pub fn new(
        name: impl Into<String>,
        address_contains: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address_contains: address_contains.into(),
            display_name: display_name.into(),
        }
    }
}

/// Declarative display-name table. The defaults disambiguate the known
/// multi-location chains; first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayNameTable {
    rules: Vec<DisplayNameRule>,
}

impl DisplayNameTable {
    pub fn new(rules: Vec<DisplayNameRule>) -> Self {
        Self { rules }
    }

    pub fn resolve<'a>(&'a self, record: &'a BakeryRecord) -> &'a str {
        for rule in &self.rules {
            if record.name == rule.name
                && record.formatted_address.contains(&rule.address_contains)
            {
                return &rule.display_name;
            }
        }
        &record.name
    }
}

impl Default for DisplayNameTable {
    fn default() -> Self {
        Self::new(vec![
            DisplayNameRule::new("Manresa Bread", "Los Gatos", "Manresa Bread - Los Gatos"),
            DisplayNameRule::new("Manresa Bread", "Los Altos", "Manresa Bread - Los Altos"),
            DisplayNameRule::new(
                "Manresa Bread",
                "Campbell",
                "Manresa Bread - Campbell All Day",
            ),
            DisplayNameRule::new(
                "Lodge Bread Company",
                "Woodland Hills",
                "Lodge Bread Company - Woodland Hills",
            ),
            DisplayNameRule::new("Tartine", "Los Angeles", "Tartine - The Manufactory"),
        ])
    }
}

pub struct MissingPlaceLookup;

#[async_trait]
impl PlaceLookup for MissingPlaceLookup {
    async fn lookup(&self, place_id: &PlaceId) -> Result<PlaceDetails, LookupError> {
        Err(LookupError::Unavailable {
            place_id: place_id.clone(),
        })
    }
}

struct DirectoryState {
    records: Vec<BakeryRecord>,
    user_location: Option<GeoPoint>,
    lookup_failures: Vec<LookupFailure>,
    inflight_enrichments: Vec<AbortHandle>,
}

/// In-memory bakery working set: bulk load, per-record enrichment through
/// the injected lookup, proximity sort, substring search. All mutation goes
/// through the internal state lock; background lookup tasks only compute and
/// hand their results back to be merged here.
pub struct BakeryDirectory {
    lookup: Arc<dyn PlaceLookup>,
    display_names: DisplayNameTable,
    inner: Mutex<DirectoryState>,
    events: broadcast::Sender<DirectoryEvent>,
}

impl BakeryDirectory {
    pub fn new() -> Arc<Self> {
        Self::with_dependencies(Arc::new(MissingPlaceLookup), DisplayNameTable::default())
    }

    pub fn with_lookup(lookup: Arc<dyn PlaceLookup>) -> Arc<Self> {
        Self::with_dependencies(lookup, DisplayNameTable::default())
    }

    pub fn with_dependencies(
        lookup: Arc<dyn PlaceLookup>,
        display_names: DisplayNameTable,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        Arc::new(Self {
            lookup,
            display_names,
            inner: Mutex::new(DirectoryState {
                records: Vec::new(),
                user_location: None,
                lookup_failures: Vec::new(),
                inflight_enrichments: Vec::new(),
            }),
            events,
        })
    }

    /// Populates the working set from seeds. A second call against a
    /// populated set is a no-op; duplicate place ids within one batch are
    /// skipped.
    pub async fn load(&self, seeds: Vec<BakerySeed>) {
        let count = {
            let mut guard = self.inner.lock().await;
            if !guard.records.is_empty() {
                info!(
                    existing = guard.records.len(),
                    "directory: working set already loaded, skipping"
                );
                return;
            }
            for seed in seeds {
                if guard.records.iter().any(|r| r.place_id == seed.place_id) {
                    warn!(place_id = %seed.place_id, "directory: duplicate seed place id skipped");
                    continue;
                }
                guard.records.push(BakeryRecord::from_seed(seed));
            }
            guard.records.len()
        };
        info!(count, "directory: working set loaded");
        let _ = self.events.send(DirectoryEvent::WorkingSetLoaded { count });
    }

    /// Looks up one record and merges the payload in place. Records are
    /// enriched at most once; a second call returns the record as is. A
    /// failed lookup leaves the record untouched and is recorded; unknown
    /// place ids report `NotFound`.
    pub async fn enrich(&self, place_id: &PlaceId) -> Result<BakeryRecord, LookupError> {
        let existing = {
            let guard = self.inner.lock().await;
            guard.records.iter().find(|r| r.place_id == *place_id).cloned()
        };
        let Some(existing) = existing else {
            return Err(LookupError::NotFound {
                place_id: place_id.clone(),
            });
        };
        if !existing.needs_details() {
            info!(place_id = %place_id, "directory: record already enriched, skipping lookup");
            return Ok(existing);
        }

        match self.lookup.lookup(place_id).await {
            Ok(details) => {
                let record = self
                    .merge_details(place_id, details)
                    .await
                    .ok_or_else(|| LookupError::NotFound {
                        place_id: place_id.clone(),
                    })?;
                let _ = self.events.send(DirectoryEvent::RecordEnriched {
                    place_id: place_id.clone(),
                });
                Ok(record)
            }
            Err(err) => {
                self.record_failure(&err).await;
                Err(err)
            }
        }
    }

    /// Enriches every record still lacking details, one task per record.
    /// Failures are isolated per record; aborted tasks are counted as
    /// cancelled. Re-sorts by distance afterwards when the user location is
    /// known.
    pub async fn enrich_all(&self) -> EnrichmentReport {
        let pending: Vec<PlaceId> = {
            let guard = self.inner.lock().await;
            guard
                .records
                .iter()
                .filter(|r| r.needs_details())
                .map(|r| r.place_id.clone())
                .collect()
        };
        if pending.is_empty() {
            return EnrichmentReport::default();
        }
        info!(count = pending.len(), "directory: enriching records");

        let mut handles: Vec<JoinHandle<(PlaceId, Result<PlaceDetails, LookupError>)>> =
            Vec::with_capacity(pending.len());
        {
            let mut guard = self.inner.lock().await;
            guard.inflight_enrichments.clear();
            for place_id in pending {
                let lookup = Arc::clone(&self.lookup);
                let handle = tokio::spawn(async move {
                    let result = lookup.lookup(&place_id).await;
                    (place_id, result)
                });
                guard.inflight_enrichments.push(handle.abort_handle());
                handles.push(handle);
            }
        }

        let mut report = EnrichmentReport::default();
        for joined in join_all(handles).await {
            match joined {
                Ok((place_id, Ok(details))) => {
                    if self.merge_details(&place_id, details).await.is_some() {
                        report.enriched += 1;
                        let _ = self
                            .events
                            .send(DirectoryEvent::RecordEnriched { place_id });
                    }
                }
                Ok((_place_id, Err(err))) => {
                    report.failed += 1;
                    self.record_failure(&err).await;
                }
                Err(join_err) => {
                    if join_err.is_cancelled() {
                        report.cancelled += 1;
                    } else {
                        warn!("directory: enrichment task panicked: {join_err}");
                        report.failed += 1;
                    }
                }
            }
        }

        let has_location = {
            let mut guard = self.inner.lock().await;
            guard.inflight_enrichments.clear();
            guard.user_location.is_some()
        };
        if has_location {
            self.sort_by_distance().await;
        }

        info!(
            enriched = report.enriched,
            failed = report.failed,
            cancelled = report.cancelled,
            "directory: enrichment run complete"
        );
        report
    }

    /// Aborts any enrichment tasks still in flight. Records whose tasks are
    /// aborted stay seed-only until the next run.
    pub async fn cancel_enrichment(&self) {
        let handles = {
            let mut guard = self.inner.lock().await;
            std::mem::take(&mut guard.inflight_enrichments)
        };
        if handles.is_empty() {
            return;
        }
        info!(count = handles.len(), "directory: cancelling enrichment tasks");
        for handle in handles {
            handle.abort();
        }
    }

    /// Stores the user location, computes distances for every record with a
    /// known coordinate and sorts immediately. Records enriched later pick
    /// up their distance at merge time.
    pub async fn set_user_location(&self, location: GeoPoint) {
        {
            let mut guard = self.inner.lock().await;
            guard.user_location = Some(location);
            for record in &mut guard.records {
                if let Some(point) = record.location {
                    record.distance_from_user = Some(location.distance_meters(&point));
                }
            }
        }
        let _ = self
            .events
            .send(DirectoryEvent::UserLocationUpdated { location });
        self.sort_by_distance().await;
    }

    /// Stable ascending sort on distance; records without one keep their
    /// relative order after all records that have one. No-op until a user
    /// location is known.
    pub async fn sort_by_distance(&self) {
        {
            let mut guard = self.inner.lock().await;
            if guard.user_location.is_none() {
                return;
            }
            guard
                .records
                .sort_by(|a, b| match (a.distance_from_user, b.distance_from_user) {
                    (Some(da), Some(db)) => {
                        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                    }
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                });
        }
        let _ = self.events.send(DirectoryEvent::WorkingSetSorted);
    }

    /// Case-insensitive substring filter over name and address. An empty or
    /// whitespace-only term returns the full working set in current order.
    pub async fn search(&self, term: &str) -> Vec<BakeryRecord> {
        let guard = self.inner.lock().await;
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return guard.records.clone();
        }
        guard
            .records
            .iter()
            .filter(|r| {
                r.name.to_lowercase().contains(&needle)
                    || r.formatted_address.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    pub fn display_name(&self, record: &BakeryRecord) -> String {
        self.display_names.resolve(record).to_string()
    }

    pub async fn records(&self) -> Vec<BakeryRecord> {
        self.inner.lock().await.records.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.records.is_empty()
    }

    pub async fn find(&self, place_id: &PlaceId) -> Option<BakeryRecord> {
        let guard = self.inner.lock().await;
        guard.records.iter().find(|r| r.place_id == *place_id).cloned()
    }

    /// Resolves a record from the pair that is unique by invariant. The map
    /// screen re-identifies records this way when only marker text survives
    /// the SDK boundary.
    pub async fn find_by_name_and_address(
        &self,
        name: &str,
        formatted_address: &str,
    ) -> Option<BakeryRecord> {
        let guard = self.inner.lock().await;
        guard
            .records
            .iter()
            .find(|r| r.name == name && r.formatted_address == formatted_address)
            .cloned()
    }

    pub async fn user_location(&self) -> Option<GeoPoint> {
        self.inner.lock().await.user_location
    }

    pub async fn lookup_failures(&self) -> Vec<LookupFailure> {
        self.inner.lock().await.lookup_failures.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DirectoryEvent> {
        self.events.subscribe()
    }

    async fn merge_details(
        &self,
        place_id: &PlaceId,
        details: PlaceDetails,
    ) -> Option<BakeryRecord> {
        let mut guard = self.inner.lock().await;
        let user_location = guard.user_location;
        let record = guard.records.iter_mut().find(|r| r.place_id == *place_id)?;
        record.location = details.location;
        record.hours_text = details.hours_text;
        record.website = details.website;
        record.phone_number = details.phone_number;
        record.photos = details.photos;
        record.tags = Tags::from(details.tags);
        record.info_note = details.info_note;
        record.enriched_at = Some(Utc::now());
        if let (Some(user), Some(point)) = (user_location, record.location) {
            record.distance_from_user = Some(user.distance_meters(&point));
        }
        info!(place_id = %place_id, "directory: record enriched");
        Some(record.clone())
    }

    async fn record_failure(&self, err: &LookupError) {
        let failure = err.failure();
        warn!(place_id = %failure.place_id, "directory: lookup failed: {err}");
        {
            let mut guard = self.inner.lock().await;
            guard.lookup_failures.push(failure.clone());
        }
        let _ = self
            .events
            .send(DirectoryEvent::EnrichmentFailed { failure });
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
