//! Channel catalog: authoritative channel list, per-channel health
//! flags and derived category views.

use std::collections::HashSet;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::m3u_parser::{parse_channels, IdSource};
use crate::models::{Channel, ALL_CATEGORY};
use crate::storage::{PersistenceGateway, CATALOG_KEY};

/// Derive the ordered, duplicate-free category list: "All" first, then
/// each distinct label in order of first appearance. Insertion order is
/// the contract, it mirrors the playlist's grouping intent.
pub fn derive_categories(channels: &[Channel]) -> Vec<String> {
    let mut categories = vec![ALL_CATEGORY.to_string()];
    for ch in channels {
        let cat = ch.category_or_default();
        if !categories.iter().any(|c| c == cat) {
            categories.push(cat.to_string());
        }
    }
    categories
}

/// Which path `ingest` took to arrive at a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Playlist text parsed into a fresh catalog (persisted as snapshot).
    Parsed(usize),
    /// Text yielded nothing; restored the last persisted snapshot.
    Restored(usize),
    /// No usable text and no snapshot; built-in demo catalog.
    Demo,
}

/// Catalog snapshot as written to the persistence gateway.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogSnapshot {
    saved_at: i64,
    channels: Vec<Channel>,
}

/// Owns the current channel list plus the dead-channel id set.
///
/// The dead set only grows within one catalog generation; replacing the
/// catalog starts a new generation and clears it, since ids are
/// regenerated at parse time and stale ids mean nothing.
#[derive(Debug)]
pub struct ChannelCatalog {
    channels: Vec<Channel>,
    dead: HashSet<String>,
    categories: Vec<String>,
    generation: u64,
}

impl Default for ChannelCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelCatalog {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
            dead: HashSet::new(),
            categories: vec![ALL_CATEGORY.to_string()],
            generation: 0,
        }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Channel> {
        self.channels.get(idx)
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Bumped on every `replace`; selections made against an older
    /// generation are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Atomically swap in a new channel list: new generation, empty dead
    /// set, categories re-derived in full.
    pub fn replace(&mut self, channels: Vec<Channel>) {
        self.categories = derive_categories(&channels);
        self.channels = channels;
        self.dead.clear();
        self.generation += 1;
    }

    /// Mark a channel id dead after a playback error. Idempotent.
    pub fn mark_dead(&mut self, id: &str) {
        self.dead.insert(id.to_string());
    }

    pub fn is_dead(&self, id: &str) -> bool {
        self.dead.contains(id)
    }

    /// Channels matching a category label, in catalog order, with dead
    /// channels excluded. "All" matches everything. Derived on demand so
    /// it always reflects the current dead set.
    pub fn filtered_by(&self, label: &str) -> Vec<&Channel> {
        self.channels
            .iter()
            .filter(|ch| label == ALL_CATEGORY || ch.category_or_default() == label)
            .filter(|ch| !self.dead.contains(&ch.id))
            .collect()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.channels.iter().position(|ch| ch.id == id)
    }

    /// Resolve a search query to a catalog index: a 1-based channel
    /// number first, otherwise the first case-insensitive name match.
    pub fn find(&self, query: &str) -> Option<usize> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if let Ok(num) = query.parse::<usize>() {
            if num >= 1 && num <= self.channels.len() {
                return Some(num - 1);
            }
        }
        self.channels
            .iter()
            .position(|ch| contains_ignore_case(&ch.name, query))
    }

    /// Build the catalog from playlist text, falling back to the last
    /// persisted snapshot and then to the built-in demo channels. A
    /// successful parse replaces the snapshot.
    pub fn ingest(
        &mut self,
        text: &str,
        store: &mut dyn PersistenceGateway,
        ids: &mut dyn IdSource,
    ) -> IngestOutcome {
        let parsed = parse_channels(text, ids);
        if !parsed.is_empty() {
            let snapshot = CatalogSnapshot {
                saved_at: chrono::Utc::now().timestamp(),
                channels: parsed.clone(),
            };
            match serde_json::to_string(&snapshot) {
                Ok(json) => store.set(CATALOG_KEY, &json),
                Err(e) => warn!("Failed to encode catalog snapshot: {}", e),
            }
            let count = parsed.len();
            self.replace(parsed);
            info!("Parsed playlist: {} channels", count);
            return IngestOutcome::Parsed(count);
        }

        if let Some(json) = store.get(CATALOG_KEY) {
            match serde_json::from_str::<CatalogSnapshot>(&json) {
                Ok(snapshot) if !snapshot.channels.is_empty() => {
                    let count = snapshot.channels.len();
                    warn!("Playlist yielded nothing, restored {} persisted channels", count);
                    self.replace(snapshot.channels);
                    return IngestOutcome::Restored(count);
                }
                Ok(_) => {}
                Err(e) => warn!("Discarding unreadable catalog snapshot: {}", e),
            }
        }

        warn!("No playlist and no snapshot, loading demo channels");
        self.replace(demo_channels(ids));
        IngestOutcome::Demo
    }
}

/// Built-in minimal catalog used when nothing else is available.
pub fn demo_channels(ids: &mut dyn IdSource) -> Vec<Channel> {
    vec![
        Channel {
            id: ids.next_id(),
            name: "Somoy TV".to_string(),
            url: "https://cdn-1.toffeelive.com/somoy/index.m3u8".to_string(),
            logo: Some(
                "https://seeklogo.com/images/S/somoy-tv-logo-87B757523F-seeklogo.com.png"
                    .to_string(),
            ),
            category: Some("News".to_string()),
        },
        Channel {
            id: ids.next_id(),
            name: "T Sports".to_string(),
            url: "https://cdn-1.toffeelive.com/tsports/index.m3u8".to_string(),
            logo: Some("https://tsports.com/static/media/tsports-logo.8e7b99c2.png".to_string()),
            category: Some("Sports".to_string()),
        },
    ]
}

/// Case-insensitive substring check without allocation
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }

    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}
