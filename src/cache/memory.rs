//! In-memory snapshot store backed by moka

use super::{AdvertisementStore, CacheKind, StoreError};
use crate::models::Advertisement;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cache holding one snapshot per kind
#[derive(Clone)]
pub struct MemoryStore {
    cache: Cache<CacheKind, Arc<Vec<Advertisement>>>,
    /// Serializes read-modify-write updates of a snapshot
    writer: Arc<Mutex<()>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let cache = Cache::builder().max_capacity(16).build();
        Self {
            cache,
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Replace the snapshot of `kind` with `f` applied to a copy of it
    async fn modify<T>(&self, kind: CacheKind, f: impl FnOnce(&mut Vec<Advertisement>) -> T) -> T {
        let _guard = self.writer.lock().await;
        let mut ads = self.snapshot(kind).await.as_ref().clone();
        let result = f(&mut ads);
        self.cache.insert(kind, Arc::new(ads)).await;
        result
    }

    async fn snapshot(&self, kind: CacheKind) -> Arc<Vec<Advertisement>> {
        self.cache.get(&kind).await.unwrap_or_default()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdvertisementStore for MemoryStore {
    async fn fetch(&self, kind: CacheKind) -> Result<Vec<Advertisement>, StoreError> {
        Ok(self.snapshot(kind).await.as_ref().clone())
    }

    async fn synchronize(&self, kind: CacheKind, ads: Vec<Advertisement>) -> Result<(), StoreError> {
        let _guard = self.writer.lock().await;
        self.cache.insert(kind, Arc::new(ads)).await;
        Ok(())
    }

    async fn upsert(&self, kind: CacheKind, ads: Vec<Advertisement>) -> Result<(), StoreError> {
        self.modify(kind, |merged| {
            for ad in ads {
                match merged.iter_mut().find(|a| a.object_id == ad.object_id) {
                    Some(existing) => *existing = ad,
                    None => merged.push(ad),
                }
            }
        })
        .await;
        Ok(())
    }

    async fn remove(&self, kind: CacheKind, object_id: &str) -> Result<(), StoreError> {
        self.modify(kind, |remaining| remaining.retain(|a| a.object_id != object_id))
            .await;
        Ok(())
    }

    async fn trim(&self, kind: CacheKind, keep: usize) -> Result<usize, StoreError> {
        let removed = self
            .modify(kind, |ads| {
                if ads.len() <= keep {
                    return 0;
                }
                ads.sort_by(|a, b| b.created.cmp(&a.created));
                let removed = ads.len() - keep;
                ads.truncate(keep);
                removed
            })
            .await;
        Ok(removed)
    }
}
