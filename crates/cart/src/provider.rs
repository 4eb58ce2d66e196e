//! Initialization scope for the cart.
//!
//! Consumers obtain the store from a [`CartProvider`] rather than a global.
//! The provider is initialized once at startup; asking it for the cart
//! before that is a usage error.

use std::sync::Arc;

use tokio::sync::OnceCell;

use gomarketplace_infra::KeyValueStore;

use crate::config::CartConfig;
use crate::error::{CartError, CartResult};
use crate::store::CartStore;

#[derive(Debug)]
pub struct CartProvider<S> {
    store: OnceCell<Arc<CartStore<S>>>,
}

impl<S> Default for CartProvider<S> {
    fn default() -> Self {
        Self {
            store: OnceCell::new(),
        }
    }
}

impl<S> CartProvider<S>
where
    S: KeyValueStore,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the cart on `storage`, rehydrate it, and make it available to
    /// [`CartProvider::cart`].
    ///
    /// Rehydration errors are returned and leave the provider uninitialized.
    pub async fn initialize(&self, storage: S, config: CartConfig) -> CartResult<Arc<CartStore<S>>> {
        if self.store.initialized() {
            return Err(CartError::AlreadyInitialized);
        }

        let store = Arc::new(CartStore::open(storage, config).await?);
        self.store
            .set(store.clone())
            .map_err(|_| CartError::AlreadyInitialized)?;

        tracing::info!(products = store.products().len(), "cart provider initialized");
        Ok(store)
    }

    /// Handle to the initialized cart.
    pub fn cart(&self) -> CartResult<Arc<CartStore<S>>> {
        self.store.get().cloned().ok_or(CartError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.store.initialized()
    }
}

#[cfg(test)]
mod tests {
    use gomarketplace_infra::InMemoryKeyValueStore;

    use super::*;
    use crate::config::DEFAULT_STORAGE_KEY;

    #[test]
    fn cart_before_initialize_is_a_usage_error() {
        let provider: CartProvider<InMemoryKeyValueStore> = CartProvider::new();
        let err = provider.cart().unwrap_err();
        assert!(matches!(err, CartError::NotInitialized));
        assert!(!provider.is_initialized());
    }

    #[tokio::test]
    async fn initialize_exposes_rehydrated_store() {
        let provider = CartProvider::new();
        let storage = InMemoryKeyValueStore::new().with_entry(
            DEFAULT_STORAGE_KEY,
            r#"[{"id":"1","title":"T","image_url":"u","price":2.5,"quantity":4}]"#,
        );

        provider.initialize(storage, CartConfig::default()).await.unwrap();

        let cart = provider.cart().unwrap();
        assert_eq!(cart.products().total_quantity(), 4);
    }

    #[tokio::test]
    async fn second_initialize_is_rejected() {
        let provider = CartProvider::new();
        provider
            .initialize(InMemoryKeyValueStore::new(), CartConfig::default())
            .await
            .unwrap();

        let err = provider
            .initialize(InMemoryKeyValueStore::new(), CartConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::AlreadyInitialized));
    }

    #[tokio::test]
    async fn failed_rehydrate_leaves_provider_uninitialized() {
        let provider = CartProvider::new();
        let storage = InMemoryKeyValueStore::new().with_entry(DEFAULT_STORAGE_KEY, "nope");

        assert!(provider.initialize(storage, CartConfig::default()).await.is_err());
        assert!(matches!(provider.cart(), Err(CartError::NotInitialized)));
    }
}
