//! Key/value persistence gateway
//!
//! The core only needs an opaque key→string contract; the file-backed
//! implementation keeps everything in one JSON object under the platform
//! config dir. Load/save failures degrade to defaults, never to errors.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use log::warn;

/// Key for the last successfully parsed channel catalog.
pub const CATALOG_KEY: &str = "iptv_channels";

/// Key for the user-configurable overlay/admin settings blob.
pub const OVERLAY_KEY: &str = "iptv_overlay";

pub trait PersistenceGateway {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// File-backed store: one pretty-printed JSON object, written through on
/// every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    fn store_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("pocket_iptv");
        fs::create_dir_all(&path).ok();
        path.push("store.json");
        path
    }

    pub fn load() -> Self {
        Self::load_from(Self::store_path())
    }

    pub fn load_from(path: PathBuf) -> Self {
        let mut entries = BTreeMap::new();
        if path.exists() {
            if let Ok(content) = fs::read_to_string(&path) {
                match serde_json::from_str(&content) {
                    Ok(parsed) => entries = parsed,
                    Err(e) => warn!("Ignoring unreadable store file: {}", e),
                }
            }
        }
        Self { path, entries }
    }

    fn flush(&self) {
        if let Ok(content) = serde_json::to_string_pretty(&self.entries) {
            if let Err(e) = fs::write(&self.path, content) {
                warn!("Failed to write store file: {}", e);
            }
        }
    }
}

impl PersistenceGateway for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush();
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl PersistenceGateway for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}
