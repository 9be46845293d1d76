//! Settings structures for carlist configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main settings structure matching `settings.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendSettings,
    pub outgoing: OutgoingSettings,
    pub server: ServerSettings,
    pub search: SearchSettings,
    pub cache: CacheSettings,
    pub reachability: ReachabilitySettings,
    pub filters: FilterSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (CARLIST_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|name| std::env::var(name).ok());
    }

    fn merge_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("CARLIST_API_HOST") {
            self.backend.api_host = val;
        }
        if let Some(val) = var("CARLIST_APPLICATION_ID") {
            self.backend.application_id = val;
        }
        if let Some(val) = var("CARLIST_REST_API_KEY") {
            self.backend.rest_api_key = val;
        }
        if let Some(val) = var("CARLIST_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("CARLIST_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = var("CARLIST_CACHE_PATH") {
            self.cache.path = Some(PathBuf::from(val));
        }
        if let Some(val) = var("CARLIST_PAGE_SIZE") {
            if let Ok(size) = val.parse::<u32>() {
                self.search.page_size = size.max(1);
            }
        }
    }
}

/// Backend-as-a-service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// API host, e.g. `https://api.backendless.com`
    pub api_host: String,
    /// Application id path segment
    pub application_id: String,
    /// REST API key path segment
    pub rest_api_key: String,
    /// Table holding the listings
    pub advertisement_table: String,
    /// Folder photos are uploaded to
    pub photo_folder: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            api_host: "https://api.backendless.com".to_string(),
            application_id: String::new(),
            rest_api_key: String::new(),
            advertisement_table: "Advertisement".to_string(),
            photo_folder: "advertisements".to_string(),
        }
    }
}

impl BackendSettings {
    /// `{api_host}/{application_id}/{rest_api_key}`
    pub fn base_url(&self) -> String {
        let mut url = self.api_host.trim_end_matches('/').to_string();
        for segment in [&self.application_id, &self.rest_api_key] {
            if !segment.is_empty() {
                url.push('/');
                url.push_str(segment.trim_matches('/'));
            }
        }
        url
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Request timeout in seconds (none = client default)
    pub request_timeout: Option<f64>,
    /// Redirects followed before giving up
    pub max_redirects: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: None,
            max_redirects: 10,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Local gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8787,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Search behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Listings per page
    pub page_size: u32,
    /// Sort applied to remote listing queries
    pub sort_by: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            page_size: crate::DEFAULT_PAGE_SIZE,
            sort_by: "created desc".to_string(),
        }
    }
}

/// Offline cache backend
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Offline cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    /// SQLite file; defaults to `<data_dir>/carlist/cache.sqlite3`
    pub path: Option<PathBuf>,
    /// Newest feed listings kept offline
    pub feed_limit: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            path: None,
            feed_limit: crate::cache::DEFAULT_FEED_LIMIT,
        }
    }
}

impl CacheSettings {
    /// Effective SQLite path
    pub fn database_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("carlist")
                .join("cache.sqlite3")
        })
    }
}

/// Network availability probing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReachabilitySettings {
    /// Seconds between probes
    pub probe_interval: u64,
    /// Seconds before a probe counts as failed
    pub probe_timeout: u64,
}

impl Default for ReachabilitySettings {
    fn default() -> Self {
        Self {
            probe_interval: 10,
            probe_timeout: 3,
        }
    }
}

/// Bounds and step of a numeric filter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RangeSettings {
    pub lower_bound: i64,
    pub upper_bound: i64,
    pub step: i64,
}

impl RangeSettings {
    pub const fn new(lower_bound: i64, upper_bound: i64, step: i64) -> Self {
        Self {
            lower_bound,
            upper_bound,
            step,
        }
    }
}

/// A brand and the models offered for it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrandCatalogue {
    pub name: String,
    #[serde(default)]
    pub models: Vec<String>,
}

/// Facet catalogue presented to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub brands: Vec<BrandCatalogue>,
    pub price: RangeSettings,
    pub year: RangeSettings,
    pub mileage: RangeSettings,
    pub power: RangeSettings,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            brands: default_brands(),
            price: RangeSettings::new(0, 100_000, 1_000),
            year: RangeSettings::new(1990, 2024, 1),
            mileage: RangeSettings::new(0, 500_000, 10_000),
            power: RangeSettings::new(50, 600, 10),
        }
    }
}

fn default_brands() -> Vec<BrandCatalogue> {
    let catalogue: [(&str, &[&str]); 6] = [
        ("Audi", &["A3", "A4", "A6", "Q5", "Q7"]),
        ("BMW", &["3 Series", "5 Series", "X3", "X5"]),
        ("Mercedes-Benz", &["C-Class", "E-Class", "GLC", "S-Class"]),
        ("Toyota", &["Camry", "Corolla", "RAV4", "Land Cruiser"]),
        ("Volkswagen", &["Golf", "Passat", "Polo", "Tiguan"]),
        ("Kia", &["Rio", "Sportage", "Ceed"]),
    ];

    catalogue
        .iter()
        .map(|(name, models)| BrandCatalogue {
            name: name.to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
        })
        .collect()
}
