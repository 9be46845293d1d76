//! Offline cache for listings
//!
//! Listings are cached per kind (feed, favorites, own ads) so the search
//! executor can answer from local data when the backend is unreachable.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::config::{CacheBackend, CacheSettings};
use crate::models::Advertisement;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Feed listings kept when nothing else is configured
pub const DEFAULT_FEED_LIMIT: usize = 500;

/// Which cached collection a listing belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    /// Listings seen while browsing/searching
    Feed,
    /// The signed-in user's favorites
    Favorites,
    /// The signed-in user's own listings
    OwnAds,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Favorites => "favorites",
            Self::OwnAds => "own_ads",
        }
    }
}

/// Cache failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("cache worker failed: {0}")]
    Worker(String),

    #[error("cache lock poisoned")]
    Poisoned,

    #[error("cache directory unavailable: {0}")]
    Io(#[from] std::io::Error),
}

/// Repository interface over the offline cache
#[async_trait]
pub trait AdvertisementStore: Send + Sync {
    /// All cached listings of a kind
    async fn fetch(&self, kind: CacheKind) -> Result<Vec<Advertisement>, StoreError>;

    /// Replace the cached listings of a kind
    async fn synchronize(&self, kind: CacheKind, ads: Vec<Advertisement>) -> Result<(), StoreError>;

    /// Insert or update listings of a kind, keyed by object id
    async fn upsert(&self, kind: CacheKind, ads: Vec<Advertisement>) -> Result<(), StoreError>;

    /// Remove one listing from a kind
    async fn remove(&self, kind: CacheKind, object_id: &str) -> Result<(), StoreError>;

    /// Keep only the `keep` newest listings of a kind; returns how many were dropped
    async fn trim(&self, kind: CacheKind, keep: usize) -> Result<usize, StoreError>;

    /// Look a listing up by id across kinds
    async fn find(&self, object_id: &str) -> Result<Option<Advertisement>, StoreError> {
        for kind in [CacheKind::Feed, CacheKind::Favorites, CacheKind::OwnAds] {
            if let Some(ad) = self
                .fetch(kind)
                .await?
                .into_iter()
                .find(|ad| ad.object_id == object_id)
            {
                return Ok(Some(ad));
            }
        }
        Ok(None)
    }
}

/// Open the configured store
pub fn open(settings: &CacheSettings) -> Result<Arc<dyn AdvertisementStore>, StoreError> {
    match settings.backend {
        CacheBackend::Sqlite => {
            let path = settings.database_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Ok(Arc::new(SqliteStore::open(path)?))
        }
        CacheBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_sqlite_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CacheSettings {
            backend: CacheBackend::Sqlite,
            path: Some(dir.path().join("nested").join("cache.sqlite3")),
            ..Default::default()
        };
        assert!(open(&settings).is_ok());
        assert!(dir.path().join("nested").exists());
    }
}
