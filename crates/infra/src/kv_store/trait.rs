use std::sync::Arc;

use thiserror::Error;

/// Key-value storage error.
///
/// These are **infrastructure errors** as opposed to domain errors
/// (validation, invariants). Callers propagate them; nothing here retries.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store rejected or failed the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// An in-process lock was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Asynchronous string-keyed key-value store.
///
/// ## Semantics
///
/// - `get` returns `Ok(None)` when the key has never been written.
/// - `set` replaces the whole value stored under `key`.
/// - Implementations make no ordering promises between different keys.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[async_trait::async_trait]
impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value).await
    }
}
