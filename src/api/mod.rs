//! Game-account API: wire types, the transport boundary, the typed client
//! and its cached facade.

mod cached_client;
mod client;
#[cfg(test)]
pub mod mock;
mod transport;
mod types;

pub use cached_client::{CachedApi, Resource};
pub use client::DashboardApi;
pub use transport::{HttpTransport, Transport};
pub use types::*;
