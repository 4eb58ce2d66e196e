//! `gomarketplace-cart`
//!
//! **Responsibility:** the storefront's shopping cart.
//!
//! This crate provides:
//! - `LineItem` / `CartState` and their pure transitions
//! - `CartStore`: the single owner of the current cart, mirroring every change
//!   to a key-value store
//! - `CartProvider`: the initialization scope consumers obtain the store from

pub mod config;
pub mod error;
pub mod line_item;
pub mod provider;
pub mod state;
pub mod store;

pub use config::{CartConfig, DecrementFloor, UnknownIdPolicy, DEFAULT_STORAGE_KEY};
pub use error::{CartError, CartResult};
pub use line_item::LineItem;
pub use provider::CartProvider;
pub use state::{CartCommand, CartState};
pub use store::CartStore;
