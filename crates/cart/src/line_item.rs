use serde::{Deserialize, Serialize};

use gomarketplace_core::{Entity, ProductId};

/// One product in the cart with its own quantity counter.
///
/// Field names match the JSON persisted under the cart's storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: f64,
    /// Not floored: decrements may take this to zero or below.
    #[serde(default)]
    pub quantity: i64,
}

impl LineItem {
    /// Build a line-item for a catalog product with a quantity of one.
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
            quantity: 1,
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Unit price times quantity.
    pub fn subtotal(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

impl Entity for LineItem {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
