//! Backend networking
//!
//! REST client, error taxonomy, session token holder and the reachability signal.

mod client;
mod error;
mod reachability;
mod session;

pub use client::{BackendClient, Photo};
pub use error::ApiError;
pub use reachability::{NetworkMonitor, Reachability, StaticReachability};
pub use session::{Session, SessionStore};
