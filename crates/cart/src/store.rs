//! The cart store: single owner of the current cart.
//!
//! Control flow per command:
//!
//! 1. compute the next [`CartState`] (pure, see [`crate::state`])
//! 2. publish it to observers
//! 3. write the serialized cart to the key-value store
//!
//! Observers can see a new state before its write is durable. Commands are
//! serialized on an async mutex that is held across the write, so two
//! commands never interleave on the same store.

use tokio::sync::{Mutex, watch};

use gomarketplace_core::{Aggregate, ProductId, Transition};
use gomarketplace_infra::KeyValueStore;

use crate::config::CartConfig;
use crate::error::CartResult;
use crate::line_item::LineItem;
use crate::state::{CartCommand, CartState};

pub struct CartStore<S> {
    storage: S,
    config: CartConfig,
    state: Mutex<CartState>,
    publisher: watch::Sender<CartState>,
}

impl<S> core::fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CartStore")
            .field("config", &self.config)
            .field("products", &*self.publisher.borrow())
            .finish_non_exhaustive()
    }
}

impl<S> CartStore<S>
where
    S: KeyValueStore,
{
    fn new(storage: S, config: CartConfig) -> Self {
        let (publisher, _) = watch::channel(CartState::empty());
        Self {
            storage,
            config,
            state: Mutex::new(CartState::empty()),
            publisher,
        }
    }

    /// Create a store and rehydrate it from storage.
    ///
    /// This is the only way to build a store, so the stored cart is always
    /// published before the first command is accepted.
    pub async fn open(storage: S, config: CartConfig) -> CartResult<Self> {
        let store = Self::new(storage, config);
        store.rehydrate().await?;
        Ok(store)
    }

    /// Restore the cart from the configured storage key.
    ///
    /// A missing key leaves the cart empty and writes nothing. A value that
    /// does not parse, or that repeats a product id, is returned as an error.
    async fn rehydrate(&self) -> CartResult<()> {
        let mut state = self.state.lock().await;

        let Some(raw) = self.storage.get(&self.config.storage_key).await? else {
            tracing::debug!(key = %self.config.storage_key, "no stored cart; starting empty");
            return Ok(());
        };

        let items: Vec<LineItem> = serde_json::from_str(&raw).inspect_err(|err| {
            tracing::error!(key = %self.config.storage_key, "stored cart is not valid JSON: {err}");
        })?;
        let restored = CartState::try_from(items)?;

        tracing::info!(
            key = %self.config.storage_key,
            items = restored.len(),
            "cart rehydrated"
        );

        *state = restored.clone();
        self.publisher.send_replace(restored);
        Ok(())
    }

    /// Snapshot of the most recently published cart.
    pub fn products(&self) -> CartState {
        self.publisher.borrow().clone()
    }

    /// Observe every published cart, starting from the current one.
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.publisher.subscribe()
    }

    pub fn config(&self) -> &CartConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Add one unit of `item`; its `quantity` is ignored.
    pub async fn add_to_cart(&self, item: LineItem) -> CartResult<()> {
        self.execute(CartCommand::AddToCart(item)).await
    }

    pub async fn increment(&self, id: impl Into<ProductId>) -> CartResult<()> {
        self.execute(CartCommand::Increment(id.into())).await
    }

    pub async fn decrement(&self, id: impl Into<ProductId>) -> CartResult<()> {
        self.execute(CartCommand::Decrement(id.into())).await
    }

    /// Empty the cart and persist `[]`.
    pub async fn clear(&self) -> CartResult<()> {
        self.execute(CartCommand::Clear).await
    }

    /// Run one command to completion: decide, publish, persist.
    pub async fn execute(&self, command: CartCommand) -> CartResult<()> {
        let mut state = self.state.lock().await;

        let transition = state.handle(&command, &self.config).inspect_err(|err| {
            tracing::warn!(command = command.name(), "cart command rejected: {err}");
        })?;

        match &transition {
            Transition::Changed(_) => {
                tracing::debug!(
                    command = command.name(),
                    product_id = command.product_id().map(ProductId::as_str),
                    "cart command applied"
                );
            }
            Transition::Unchanged => {
                tracing::warn!(
                    command = command.name(),
                    product_id = command.product_id().map(ProductId::as_str),
                    "product not in cart; persisting unchanged cart"
                );
            }
            Transition::Skipped => {}
        }

        let Some(next) = transition.resolve(&state) else {
            tracing::debug!(command = command.name(), "cart command skipped by decrement floor");
            return Ok(());
        };

        *state = next.clone();
        self.publisher.send_replace(next);
        self.persist(&state).await
    }

    async fn persist(&self, state: &CartState) -> CartResult<()> {
        let payload = serde_json::to_string(state)?;

        self.storage
            .set(&self.config.storage_key, &payload)
            .await
            .inspect_err(|err| {
                tracing::error!(key = %self.config.storage_key, "failed to persist cart: {err}");
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gomarketplace_core::DomainError;
    use gomarketplace_infra::InMemoryKeyValueStore;

    use super::*;
    use crate::config::{DEFAULT_STORAGE_KEY, DecrementFloor, UnknownIdPolicy};
    use crate::error::CartError;

    fn item(id: &str) -> LineItem {
        LineItem::new(id, format!("Product {id}"), format!("https://img/{id}.png"), 10.0)
    }

    fn stored_json(entries: &[(&str, i64)]) -> String {
        let items: Vec<LineItem> = entries
            .iter()
            .map(|(id, q)| item(id).with_quantity(*q))
            .collect();
        serde_json::to_string(&items).unwrap()
    }

    async fn store_with(
        entries: &[(&str, i64)],
        config: CartConfig,
    ) -> (Arc<InMemoryKeyValueStore>, CartStore<Arc<InMemoryKeyValueStore>>) {
        let storage = Arc::new(
            InMemoryKeyValueStore::new().with_entry(config.storage_key.clone(), stored_json(entries)),
        );
        let store = CartStore::open(storage.clone(), config).await.unwrap();
        (storage, store)
    }

    #[tokio::test]
    async fn missing_key_starts_empty_without_writing() {
        let storage = Arc::new(InMemoryKeyValueStore::new());
        let store = CartStore::open(storage.clone(), CartConfig::default()).await.unwrap();

        assert!(store.products().is_empty());
        assert_eq!(storage.write_count(), 0);
    }

    #[tokio::test]
    async fn add_new_item_publishes_and_persists() {
        let storage = Arc::new(InMemoryKeyValueStore::new());
        let store = CartStore::open(storage.clone(), CartConfig::default()).await.unwrap();

        store.add_to_cart(item("1").with_quantity(7)).await.unwrap();

        let expected = vec![item("1").with_quantity(1)];
        assert_eq!(store.products().products(), expected.as_slice());
        assert_eq!(
            storage.last_write(DEFAULT_STORAGE_KEY),
            Some(serde_json::to_string(&expected).unwrap())
        );
    }

    #[tokio::test]
    async fn unknown_id_still_writes_unchanged_cart() {
        let (storage, store) = store_with(&[("1", 1)], CartConfig::default()).await;

        store.increment("missing").await.unwrap();
        store.decrement("missing").await.unwrap();

        assert_eq!(storage.write_count(), 2);
        assert_eq!(
            storage.last_write(DEFAULT_STORAGE_KEY),
            Some(stored_json(&[("1", 1)]))
        );
    }

    #[tokio::test]
    async fn unknown_id_rejected_without_writing() {
        let config = CartConfig::default().with_unknown_id_policy(UnknownIdPolicy::Reject);
        let (storage, store) = store_with(&[("1", 1)], config).await;

        let err = store.increment("missing").await.unwrap_err();
        assert!(matches!(err, CartError::Domain(DomainError::NotFound(_))));
        assert_eq!(storage.write_count(), 0);
    }

    #[tokio::test]
    async fn decrement_floor_skips_publish_and_write() {
        let config = CartConfig::default().with_decrement_floor(DecrementFloor::KeepAtOne);
        let (storage, store) = store_with(&[("1", 1)], config).await;
        let updates = store.subscribe();

        store.decrement("1").await.unwrap();

        assert_eq!(store.products().get(&"1".into()).unwrap().quantity, 1);
        assert_eq!(storage.write_count(), 0);
        assert!(!updates.has_changed().unwrap());
    }

    #[tokio::test]
    async fn failed_write_keeps_published_state() {
        let (storage, store) = store_with(&[("1", 1)], CartConfig::default()).await;
        storage.fail_writes(true);

        let err = store.increment("1").await.unwrap_err();
        assert!(matches!(err, CartError::Storage(_)));
        assert_eq!(store.products().get(&"1".into()).unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn non_finite_price_is_rejected_without_writing() {
        let (storage, store) = store_with(&[("1", 1)], CartConfig::default()).await;

        let err = store
            .add_to_cart(LineItem::new("2", "T", "u", f64::NAN))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::Domain(DomainError::Validation(_))));
        assert_eq!(storage.write_count(), 0);
        assert_eq!(store.products().len(), 1);

        // Startup still works on the untouched stored cart.
        let reopened = CartStore::open(storage, CartConfig::default()).await.unwrap();
        assert_eq!(reopened.products(), store.products());
    }

    #[tokio::test]
    async fn writes_go_to_the_configured_key_in_order() {
        let (_storage, store) = store_with(&[], CartConfig::default()).await;

        store.add_to_cart(item("1")).await.unwrap();
        store.increment("1").await.unwrap();

        let key = store.config().storage_key.clone();
        let writes = store.storage().writes();
        assert_eq!(
            writes,
            vec![
                (key.clone(), stored_json(&[("1", 1)])),
                (key, stored_json(&[("1", 2)])),
            ]
        );
    }

    #[tokio::test]
    async fn open_publishes_stored_cart_before_first_command() {
        let (storage, store) = store_with(&[("1", 3)], CartConfig::default()).await;

        store.increment("1").await.unwrap();

        assert_eq!(store.products().get(&"1".into()).unwrap().quantity, 4);
        assert_eq!(storage.last_write(DEFAULT_STORAGE_KEY), Some(stored_json(&[("1", 4)])));
    }

    #[tokio::test]
    async fn corrupt_stored_cart_fails_rehydrate() {
        let storage = InMemoryKeyValueStore::new().with_entry(DEFAULT_STORAGE_KEY, "{not json");
        let err = CartStore::open(storage, CartConfig::default()).await.unwrap_err();
        assert!(matches!(err, CartError::Serialization(_)));
    }

    #[tokio::test]
    async fn duplicate_ids_in_storage_fail_rehydrate() {
        let storage = InMemoryKeyValueStore::new()
            .with_entry(DEFAULT_STORAGE_KEY, stored_json(&[("1", 1), ("1", 2)]));
        let err = CartStore::open(storage, CartConfig::default()).await.unwrap_err();
        assert!(matches!(err, CartError::Domain(DomainError::InvariantViolation(_))));
    }

    #[tokio::test]
    async fn custom_storage_key_is_used() {
        let config = CartConfig::default().with_storage_key("@Test:cart");
        let (storage, store) = store_with(&[("1", 3)], config).await;

        assert_eq!(store.products().total_quantity(), 3);
        store.clear().await.unwrap();

        assert_eq!(storage.last_write("@Test:cart").as_deref(), Some("[]"));
        assert_eq!(storage.last_write(DEFAULT_STORAGE_KEY), None);
    }
}
