//! In-memory query cache for remote resources.
//!
//! This module turns declared remote resources into a local data graph:
//! - Resources are addressed by structured [`QueryKey`]s
//! - Each read declares how long its data stays fresh
//! - Concurrent reads of one key share a single fetch
//! - Stale data is served while a refetch runs behind it
//! - Invalidation by key prefix marks whole families of entries stale

mod client;
mod entry;
mod key;

pub use client::{Observer, QueryClient};
pub use entry::{EntryState, QueryStatus};
pub use key::QueryKey;
