//! Infrastructure layer: store contracts and their implementations.
//!
//! The reconciler and the HTTP layer consume the traits in [`stores`];
//! in-memory implementations back dev and tests, Postgres implementations
//! (feature `postgres`) back production.

pub mod stores;

pub use stores::{ClickStore, GeoStore, JobStore, StoreError, SyncLogStore, SyncLogError};
pub use stores::in_memory::{
    InMemoryClickStore, InMemoryGeoStore, InMemoryJobStore, InMemorySyncLogStore,
};
#[cfg(feature = "postgres")]
pub use stores::postgres::{
    PostgresClickStore, PostgresGeoStore, PostgresJobStore, PostgresSyncLogStore,
};
