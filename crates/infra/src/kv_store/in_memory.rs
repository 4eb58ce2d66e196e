use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use super::r#trait::{KeyValueStore, StorageError};

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, String>,
    /// Every `set` in call order, including rewrites of identical values.
    writes: Vec<(String, String)>,
}

/// In-memory key-value store.
///
/// Intended for tests/dev. Records every write so callers can assert on
/// how often (and with what) a key was persisted.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    inner: RwLock<Inner>,
    fail_writes: AtomicBool,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without recording it as a write.
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            inner.values.insert(key.into(), value.into());
        }
        self
    }

    /// Make subsequent `set` calls fail with [`StorageError::Backend`].
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `set` calls that succeeded.
    pub fn write_count(&self) -> usize {
        self.inner.read().map(|inner| inner.writes.len()).unwrap_or(0)
    }

    /// Successful writes in call order.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.inner
            .read()
            .map(|inner| inner.writes.clone())
            .unwrap_or_default()
    }

    /// Most recent value written under `key`, ignoring seeded entries.
    pub fn last_write(&self, key: &str) -> Option<String> {
        self.inner.read().ok().and_then(|inner| {
            inner
                .writes
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
    }
}

#[async_trait::async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let inner = self.inner.read().map_err(|_| StorageError::Poisoned)?;
        Ok(inner.values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!("write to '{key}' rejected")));
        }

        let mut inner = self.inner.write().map_err(|_| StorageError::Poisoned)?;
        inner.values.insert(key.to_string(), value.to_string());
        inner.writes.push((key.to_string(), value.to_string()));
        Ok(())
    }
}
