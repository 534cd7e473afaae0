use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::BakerySeed;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub places_api_key: String,
    pub details_endpoint: Option<String>,
    pub photo_max_width: u32,
    pub seed_path: String,
    pub map_style_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            places_api_key: String::new(),
            details_endpoint: None,
            photo_max_width: 400,
            seed_path: "bakeries.json".into(),
            map_style_path: None,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("directory.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("places_api_key") {
                settings.places_api_key = v.clone();
            }
            if let Some(v) = file_cfg.get("details_endpoint") {
                settings.details_endpoint = Some(v.clone());
            }
            if let Some(v) = file_cfg.get("photo_max_width") {
                if let Ok(parsed) = v.parse::<u32>() {
                    settings.photo_max_width = parsed;
                }
            }
            if let Some(v) = file_cfg.get("seed_path") {
                settings.seed_path = v.clone();
            }
            if let Some(v) = file_cfg.get("map_style_path") {
                settings.map_style_path = Some(v.clone());
            }
        }
    }

    if let Ok(v) = std::env::var("PLACES_API_KEY") {
        settings.places_api_key = v;
    }
    if let Ok(v) = std::env::var("APP__PLACES_API_KEY") {
        settings.places_api_key = v;
    }

    if let Ok(v) = std::env::var("APP__DETAILS_ENDPOINT") {
        settings.details_endpoint = Some(v);
    }

    if let Ok(v) = std::env::var("APP__PHOTO_MAX_WIDTH") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.photo_max_width = parsed;
        }
    }

    if let Ok(v) = std::env::var("SEED_PATH") {
        settings.seed_path = v;
    }
    if let Ok(v) = std::env::var("APP__SEED_PATH") {
        settings.seed_path = v;
    }

    if let Ok(v) = std::env::var("APP__MAP_STYLE_PATH") {
        settings.map_style_path = Some(v);
    }

    settings
}

pub fn load_seeds(path: &str) -> anyhow::Result<Vec<BakerySeed>> {
    let raw = fs::read_to_string(Path::new(path))
        .with_context(|| format!("failed to read seed file '{path}'"))?;
    let seeds: Vec<BakerySeed> = serde_json::from_str(&raw)
        .with_context(|| format!("seed file '{path}' is not a JSON array of bakeries"))?;
    Ok(seeds)
}
