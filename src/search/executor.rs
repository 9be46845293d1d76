//! Search execution
//!
//! Picks the data source per request: the backend while it is reachable,
//! the offline cache otherwise.

use super::params::SearchParams;
use super::predicate::matches_all;
use crate::cache::{AdvertisementStore, CacheKind, StoreError, DEFAULT_FEED_LIMIT};
use crate::models::Advertisement;
use crate::network::{ApiError, BackendClient, Reachability};
use futures::future::try_join;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Search failures
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("advertisement {0} not found")]
    NotFound(String),

    #[error("network unavailable")]
    Offline,
}

/// One page of listings plus the total number of matches
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub advertisements: Vec<Advertisement>,
    pub total: u64,
    pub offset: u32,
    pub page_size: u32,
}

/// Search executor over the backend and the offline cache
#[derive(Clone)]
pub struct Search {
    client: BackendClient,
    store: Arc<dyn AdvertisementStore>,
    reachability: Arc<dyn Reachability>,
    feed_limit: usize,
}

impl Search {
    pub fn new(
        client: BackendClient,
        store: Arc<dyn AdvertisementStore>,
        reachability: Arc<dyn Reachability>,
    ) -> Self {
        Self {
            client,
            store,
            reachability,
            feed_limit: DEFAULT_FEED_LIMIT,
        }
    }

    /// Cap the number of feed listings kept offline
    pub fn with_feed_limit(mut self, limit: usize) -> Self {
        self.feed_limit = limit.max(1);
        self
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    pub fn is_online(&self) -> bool {
        self.reachability.is_reachable()
    }

    /// One page of listings matching `params`
    pub async fn execute(&self, params: &SearchParams) -> Result<Vec<Advertisement>, SearchError> {
        if !self.is_online() {
            info!("Network unavailable, searching cached listings");
            let cached = self.store.fetch(CacheKind::Feed).await?;
            return Ok(paginate(filter_cached(cached, params), params));
        }

        let ads = self.client.fetch_advertisements(params).await?;
        debug!("Backend returned {} advertisements", ads.len());
        self.remember(CacheKind::Feed, ads.clone()).await;
        Ok(ads)
    }

    /// Number of listings matching `params`, ignoring paging
    pub async fn count(&self, params: &SearchParams) -> Result<u64, SearchError> {
        if !self.is_online() {
            let cached = self.store.fetch(CacheKind::Feed).await?;
            return Ok(filter_cached(cached, params).len() as u64);
        }
        Ok(self.client.count_advertisements(params.params()).await?)
    }

    /// Listings and total count together
    pub async fn page(&self, params: &SearchParams) -> Result<SearchPage, SearchError> {
        let (advertisements, total) = try_join(self.execute(params), self.count(params)).await?;
        Ok(SearchPage {
            advertisements,
            total,
            offset: params.offset,
            page_size: params.page_size,
        })
    }

    /// A single listing, falling back to any cached copy
    pub async fn advertisement(&self, object_id: &str) -> Result<Advertisement, SearchError> {
        if self.is_online() {
            let ad = self.client.fetch_advertisement(object_id).await?;
            self.remember(CacheKind::Feed, vec![ad.clone()]).await;
            return Ok(ad);
        }
        self.store
            .find(object_id)
            .await?
            .ok_or_else(|| SearchError::NotFound(object_id.to_string()))
    }

    /// The user's favorite listings
    pub async fn favorites(&self, user_id: &str) -> Result<Vec<Advertisement>, SearchError> {
        if !self.is_online() {
            return Ok(self.store.fetch(CacheKind::Favorites).await?);
        }
        let ads = self.client.fetch_favorites(user_id).await?;
        self.replace(CacheKind::Favorites, ads.clone()).await;
        Ok(ads)
    }

    /// Listings the user published
    pub async fn own_advertisements(&self, user_id: &str) -> Result<Vec<Advertisement>, SearchError> {
        if !self.is_online() {
            return Ok(self.store.fetch(CacheKind::OwnAds).await?);
        }
        let ads = self.client.fetch_own(user_id).await?;
        self.replace(CacheKind::OwnAds, ads.clone()).await;
        Ok(ads)
    }

    pub async fn add_favorite(&self, user_id: &str, object_id: &str) -> Result<(), SearchError> {
        if !self.is_online() {
            return Err(SearchError::Offline);
        }
        self.client.add_favorite(user_id, object_id).await?;
        match self.store.find(object_id).await {
            Ok(Some(ad)) => self.remember(CacheKind::Favorites, vec![ad]).await,
            Ok(None) => {}
            Err(e) => warn!("Failed to look up {} for the favorites cache: {}", object_id, e),
        }
        Ok(())
    }

    pub async fn remove_favorite(&self, user_id: &str, object_id: &str) -> Result<(), SearchError> {
        if !self.is_online() {
            return Err(SearchError::Offline);
        }
        self.client.remove_favorite(user_id, object_id).await?;
        if let Err(e) = self.store.remove(CacheKind::Favorites, object_id).await {
            warn!("Failed to drop {} from the favorites cache: {}", object_id, e);
        }
        Ok(())
    }

    // Cache write failures below are logged; the backend result still stands.

    async fn remember(&self, kind: CacheKind, ads: Vec<Advertisement>) {
        if ads.is_empty() {
            return;
        }
        if let Err(e) = self.store.upsert(kind, ads).await {
            warn!("Failed to cache {} listings: {}", kind.as_str(), e);
            return;
        }
        if kind == CacheKind::Feed {
            if let Err(e) = self.store.trim(kind, self.feed_limit).await {
                warn!("Failed to trim cached {} listings: {}", kind.as_str(), e);
            }
        }
    }

    async fn replace(&self, kind: CacheKind, ads: Vec<Advertisement>) {
        let count = ads.len();
        match self.store.synchronize(kind, ads).await {
            Ok(()) => info!("Synchronized {} cached {} listings", count, kind.as_str()),
            Err(e) => warn!("Failed to synchronize cached {} listings: {}", kind.as_str(), e),
        }
    }
}

/// Cached listings matching every predicate, newest first
fn filter_cached(mut ads: Vec<Advertisement>, params: &SearchParams) -> Vec<Advertisement> {
    ads.retain(|ad| matches_all(params.params(), ad));
    ads.sort_by(|a, b| b.created.cmp(&a.created));
    ads
}

fn paginate(ads: Vec<Advertisement>, params: &SearchParams) -> Vec<Advertisement> {
    ads.into_iter()
        .skip(params.offset as usize)
        .take(params.page_size as usize)
        .collect()
}

/// Observable state of the most recent search
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum SearchState {
    Idle,
    Loading,
    Loaded(Vec<Advertisement>),
    Failed(String),
}

/// Runs one search at a time; a new submission cancels the previous one,
/// so only the latest request can publish results.
pub struct LatestSearch {
    search: Arc<Search>,
    state: Arc<watch::Sender<SearchState>>,
    generation: Arc<AtomicU64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LatestSearch {
    pub fn new(search: Arc<Search>) -> Self {
        let (tx, _) = watch::channel(SearchState::Idle);
        Self {
            search,
            state: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            task: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Start searching `params`, aborting whatever is in flight
    pub fn submit(&self, params: SearchParams) {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = task.take() {
            previous.abort();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(SearchState::Loading);

        let search = self.search.clone();
        let state = self.state.clone();
        let current = self.generation.clone();
        *task = Some(tokio::spawn(async move {
            let next = match search.execute(&params).await {
                Ok(ads) => SearchState::Loaded(ads),
                Err(e) => {
                    warn!("Search failed: {}", e);
                    SearchState::Failed(e.to_string())
                }
            };
            // A newer submission may have started after this task was aborted
            state.send_if_modified(|value| {
                if current.load(Ordering::SeqCst) != generation {
                    return false;
                }
                *value = next;
                true
            });
        }));
    }

    /// Abort the in-flight search and return to idle
    pub fn cancel(&self) {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = task.take() {
            previous.abort();
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(SearchState::Idle);
    }
}

impl Drop for LatestSearch {
    fn drop(&mut self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(task) = task.take() {
                task.abort();
            }
        }
    }
}
