use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use shared::domain::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCamera {
    pub target: GeoPoint,
    pub zoom: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub position: GeoPoint,
    pub title: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapEvent {
    MarkerInfoTapped { title: String },
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("map style {path} could not be read: {source}")]
    Missing {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("map style {path} is not valid JSON: {source}")]
    Invalid {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Validated map style JSON, as handed to the rendering SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapStyle {
    json: String,
}

impl MapStyle {
    pub fn from_json(json: impl Into<String>) -> Result<Self, serde_json::Error> {
        let json = json.into();
        serde_json::from_str::<serde_json::Value>(&json)?;
        Ok(Self { json })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Missing {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(text).map_err(|source| ConfigurationError::Invalid {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn as_json(&self) -> &str {
        &self.json
    }
}

#[async_trait]
pub trait MapSurface: Send + Sync {
    async fn apply_style(&self, style: &MapStyle) -> anyhow::Result<()>;
    async fn move_camera(&self, camera: MapCamera) -> anyhow::Result<()>;
    async fn place_marker(&self, marker: MapMarker) -> anyhow::Result<()>;
    fn subscribe_events(&self) -> broadcast::Receiver<MapEvent>;
}

#[async_trait]
pub trait RouteLauncher: Send + Sync {
    async fn open(&self, url: &str) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_loads_valid_json_file() {
        let path = std::env::temp_dir().join(format!("map_style_ok_{}.json", std::process::id()));
        std::fs::write(&path, r#"[{"featureType": "poi.business", "stylers": []}]"#)
            .expect("write style");
        let style = MapStyle::load(&path).expect("style loads");
        assert!(style.as_json().contains("poi.business"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_style_file_is_a_configuration_error() {
        let path = std::env::temp_dir().join("map_style_that_does_not_exist.json");
        let err = MapStyle::load(&path).expect_err("load fails");
        assert!(matches!(err, ConfigurationError::Missing { .. }));
    }

    #[test]
    fn invalid_style_json_is_a_configuration_error() {
        let path = std::env::temp_dir().join(format!("map_style_bad_{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").expect("write style");
        let err = MapStyle::load(&path).expect_err("load fails");
        assert!(matches!(err, ConfigurationError::Invalid { .. }));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(MapStyle::from_json("nope").is_err());
    }
}
