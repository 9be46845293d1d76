//! Carlist: client core for a car classifieds marketplace
//!
//! Builds backend search queries from facet selections, talks to the
//! REST backend, keeps an offline cache and serves it all through a
//! local HTTP gateway.

pub mod cache;
pub mod config;
pub mod contact;
pub mod models;
pub mod network;
pub mod search;
pub mod web;

pub use config::Settings;
pub use models::Advertisement;
pub use network::{ApiError, BackendClient};
pub use search::{Search, SearchParam, SearchParams};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Listings per page when nothing else is configured
pub const DEFAULT_PAGE_SIZE: u32 = 3;
