//! Application state shared across handlers

use crate::config::Settings;
use crate::contact::Templates;
use crate::search::{FilterDomainModel, FilterStore, LatestSearch, Search};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Search executor
    pub search: Arc<Search>,
    /// Current facet selection
    pub filters: Arc<FilterStore>,
    /// Feed driven by the facet selection
    pub feed: Arc<LatestSearch>,
    /// Email templates
    pub templates: Arc<Templates>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, search: Search) -> anyhow::Result<Self> {
        let filters = FilterStore::new(FilterDomainModel::from_settings(&settings.filters));
        let search = Arc::new(search);
        let feed = Arc::new(LatestSearch::new(search.clone()));
        let templates = Arc::new(Templates::new()?);

        Ok(Self {
            settings: Arc::new(settings),
            search,
            filters: Arc::new(filters),
            feed,
            templates,
        })
    }

    pub fn page_size(&self) -> u32 {
        self.settings.search.page_size
    }

    /// Re-run the feed for the current facet selection
    pub fn refresh_feed(&self) {
        let params = self.filters.snapshot().to_search_params(self.page_size());
        self.feed.submit(params);
    }
}
