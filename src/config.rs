//! Overlay and admin settings
//!
//! Persisted as one opaque JSON blob through the persistence gateway,
//! independent from the catalog snapshot.

use serde::{Deserialize, Serialize};

use crate::storage::{PersistenceGateway, OVERLAY_KEY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkSettings {
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default = "default_position")]
    pub top: u8,
    #[serde(default = "default_position")]
    pub left: u8,
    #[serde(default = "default_logo")]
    pub url: String,
    #[serde(default = "default_true")]
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DevCard {
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OverlaySettings {
    #[serde(default)]
    pub watermark: WatermarkSettings,
    #[serde(default)]
    pub dev: DevCard,
}

fn default_opacity() -> f32 { 0.5 }
fn default_position() -> u8 { 10 }
fn default_logo() -> String { "assets/logo.png".to_string() }
fn default_true() -> bool { true }

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            opacity: 0.5,
            top: 10,
            left: 10,
            url: "assets/logo.png".to_string(),
            visible: true,
        }
    }
}

impl OverlaySettings {
    pub fn load(store: &dyn PersistenceGateway) -> Self {
        if let Some(json) = store.get(OVERLAY_KEY) {
            if let Ok(settings) = serde_json::from_str(&json) {
                return settings;
            }
        }
        Self::default()
    }

    pub fn save(&self, store: &mut dyn PersistenceGateway) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            store.set(OVERLAY_KEY, &json);
        }
    }
}
