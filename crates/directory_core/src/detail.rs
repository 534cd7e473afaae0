use std::sync::Arc;

use anyhow::Result;
use maps_integration::{MapCamera, MapEvent, MapMarker, MapStyle, MapSurface, RouteLauncher};
use shared::domain::BakeryRecord;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::presenter::DetailPresenter;

pub const DETAIL_CAMERA_ZOOM: f32 = 12.0;
pub const MARKER_SNIPPET: &str = "Get Directions 👆";

/// Wires one record to the map surface for the detail screen's lifetime:
/// style, camera, a single marker, and a task that opens directions when the
/// marker info window is tapped.
pub struct DetailSession {
    record: BakeryRecord,
    presenter: DetailPresenter,
    launcher: Arc<dyn RouteLauncher>,
    event_task: JoinHandle<()>,
}

impl DetailSession {
    pub async fn open(
        record: BakeryRecord,
        display_name: String,
        presenter: DetailPresenter,
        map: Arc<dyn MapSurface>,
        launcher: Arc<dyn RouteLauncher>,
        style: Option<MapStyle>,
    ) -> Result<Self> {
        if let Some(style) = style {
            // Style problems degrade to the default map, never to a failure.
            if let Err(err) = map.apply_style(&style).await {
                warn!("detail: map style not applied: {err}");
            }
        }

        match record.location {
            Some(position) => {
                map.move_camera(MapCamera {
                    target: position,
                    zoom: DETAIL_CAMERA_ZOOM,
                })
                .await?;
                map.place_marker(MapMarker {
                    position,
                    title: display_name,
                    snippet: MARKER_SNIPPET.to_string(),
                })
                .await?;
            }
            None => {
                warn!(place_id = %record.place_id, "detail: record has no location, skipping map placement");
            }
        }

        let event_task = spawn_marker_event_task(&record, &presenter, map.as_ref(), &launcher);
        Ok(Self {
            record,
            presenter,
            launcher,
            event_task,
        })
    }

    /// The tap-on-address path: opens directions without going through the
    /// map marker.
    pub async fn open_directions(&self) -> Result<()> {
        let url = self.presenter.directions_url(&self.record);
        self.launcher.open(&url).await
    }

    pub fn record(&self) -> &BakeryRecord {
        &self.record
    }

    pub fn close(self) {
        self.event_task.abort();
    }
}

fn spawn_marker_event_task(
    record: &BakeryRecord,
    presenter: &DetailPresenter,
    map: &dyn MapSurface,
    launcher: &Arc<dyn RouteLauncher>,
) -> JoinHandle<()> {
    let mut events = map.subscribe_events();
    let directions_url = presenter.directions_url(record);
    let launcher = Arc::clone(launcher);
    let place_id = record.place_id.clone();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                MapEvent::MarkerInfoTapped { .. } => {
                    info!(place_id = %place_id, "detail: marker info tapped, opening directions");
                    if let Err(err) = launcher.open(&directions_url).await {
                        warn!(place_id = %place_id, "detail: failed to open directions: {err}");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "tests/detail_tests.rs"]
mod tests;
