//! Resolution cache: content hash and unique identifier -> location
//!
//! Entries are created on the first successful resolution and live for the
//! rest of the process. An upsert on an existing key only refreshes its
//! timestamp; the stored URL never changes once written.

use std::collections::HashMap;
use std::time::SystemTime;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Where an object was found and when that was last confirmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub url: String,
    pub timestamp: SystemTime,
}

impl Location {
    /// Location stamped with the current time
    pub fn now(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timestamp: SystemTime::now(),
        }
    }
}

/// Which of the two cache maps an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheMap {
    ContentHash,
    UniqueId,
}

impl CacheMap {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheMap::ContentHash => "content_hash",
            CacheMap::UniqueId => "unique_id",
        }
    }
}

/// A single key -> location map.
///
/// Writers are serialized by the lock; readers share it and only ever see
/// complete records.
#[derive(Debug, Default)]
pub struct LocationMap {
    entries: RwLock<HashMap<String, Location>>,
}

impl LocationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: &str) -> Option<Location> {
        self.entries.read().get(key).cloned()
    }

    /// Insert `location`, or refresh the timestamp if `key` is present.
    /// Returns the stored record.
    pub fn upsert(&self, key: &str, location: Location) -> Location {
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(existing) => {
                existing.timestamp = location.timestamp;
                existing.clone()
            }
            None => {
                entries.insert(key.to_string(), location.clone());
                location
            }
        }
    }

    /// Refresh the timestamp of an existing entry and return it
    pub fn touch(&self, key: &str) -> Option<Location> {
        let mut entries = self.entries.write();
        let existing = entries.get_mut(key)?;
        existing.timestamp = SystemTime::now();
        Some(existing.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Process-wide resolution cache owning both maps
#[derive(Debug, Default)]
pub struct ResolutionCache {
    content_hash: LocationMap,
    unique_id: LocationMap,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&self, which: CacheMap) -> &LocationMap {
        match which {
            CacheMap::ContentHash => &self.content_hash,
            CacheMap::UniqueId => &self.unique_id,
        }
    }

    pub fn content_hash(&self) -> &LocationMap {
        &self.content_hash
    }

    pub fn unique_id(&self) -> &LocationMap {
        &self.unique_id
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            content_hash_entries: self.content_hash.len(),
            unique_id_entries: self.unique_id.len(),
        }
    }
}

/// Cache sizes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub content_hash_entries: usize,
    pub unique_id_entries: usize,
}
