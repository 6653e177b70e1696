//! Data models for Pocket IPTV

use serde::{Deserialize, Serialize};

/// Category label used when a channel carries none.
pub const DEFAULT_CATEGORY: &str = "General";

/// Pseudo-category that matches every channel.
pub const ALL_CATEGORY: &str = "All";

/// One playable stream entry (persisted to JSON as part of the
/// catalog snapshot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl Channel {
    /// Effective category; blank and absent both fall back to "General".
    pub fn category_or_default(&self) -> &str {
        match self.category.as_deref() {
            Some(c) if !c.trim().is_empty() => c,
            _ => DEFAULT_CATEGORY,
        }
    }
}
