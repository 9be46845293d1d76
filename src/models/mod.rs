//! Domain models shared by the network client, the offline cache and search.

mod advertisement;
mod user;
mod vehicle;

pub use advertisement::*;
pub use user::*;
pub use vehicle::*;

#[cfg(test)]
pub(crate) use advertisement::fixtures;
