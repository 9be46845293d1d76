//! Search module
//!
//! Turns facet selections into backend predicates and runs them against
//! the backend or, when offline, the local cache.

mod executor;
mod filter;
mod params;
mod predicate;
mod query;

pub use executor::{LatestSearch, Search, SearchError, SearchPage, SearchState};
pub use filter::*;
pub use params::*;
pub use predicate::{matches, matches_all};
pub use query::*;
