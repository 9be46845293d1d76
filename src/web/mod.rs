//! Local HTTP gateway
//!
//! Exposes search, filters, favorites and the contact flow as a JSON API.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
