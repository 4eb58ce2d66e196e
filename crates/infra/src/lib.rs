//! `gomarketplace-infra` — storage adapters.
//!
//! The cart treats persistence as an opaque string-keyed key-value store. This
//! crate defines that boundary and ships the backends the app can run on.

pub mod kv_store;

pub use kv_store::{InMemoryKeyValueStore, KeyValueStore, SqliteKeyValueStore, StorageError};
