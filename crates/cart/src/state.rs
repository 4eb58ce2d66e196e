//! Cart state and its pure transitions.
//!
//! Every accepted command produces a full replacement [`CartState`]; nothing
//! here mutates in place or touches storage.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use gomarketplace_core::{
    Aggregate, DomainError, DomainResult, Entity, ProductId, Transition, ValueObject,
};

use crate::config::{CartConfig, DecrementFloor, UnknownIdPolicy};
use crate::line_item::LineItem;

/// Ordered line-items, first-seen product first.
///
/// Invariant: no two entries share an `id`. Serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<LineItem>", try_from = "Vec<LineItem>")]
pub struct CartState {
    items: Vec<LineItem>,
}

impl ValueObject for CartState {}

impl TryFrom<Vec<LineItem>> for CartState {
    type Error = DomainError;

    fn try_from(items: Vec<LineItem>) -> Result<Self, Self::Error> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id()) {
                return Err(DomainError::invariant(format!(
                    "duplicate product id '{}' in cart",
                    item.id()
                )));
            }
        }
        Ok(Self { items })
    }
}

impl From<CartState> for Vec<LineItem> {
    fn from(state: CartState) -> Self {
        state.items
    }
}

impl CartState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn products(&self) -> &[LineItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Sum of all quantities (what the floating cart badge shows).
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of all line subtotals.
    pub fn total_price(&self) -> f64 {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    /// Copy of `self` with the quantity at `index` replaced by `adjust`.
    fn adjusted_at(&self, index: usize, adjust: impl Fn(i64) -> Option<i64>) -> DomainResult<Self> {
        let items = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| -> DomainResult<LineItem> {
                if i != index {
                    return Ok(item.clone());
                }
                let quantity = adjust(item.quantity).ok_or_else(|| {
                    DomainError::invariant(format!("quantity overflow for product '{}'", item.id))
                })?;
                Ok(LineItem {
                    quantity,
                    ..item.clone()
                })
            })
            .collect::<DomainResult<Vec<LineItem>>>()?;

        Ok(Self { items })
    }

    fn handle_add(&self, item: &LineItem) -> DomainResult<Transition<Self>> {
        // JSON has no NaN/infinity; such a price would persist as `null`.
        if !item.price.is_finite() {
            return Err(DomainError::validation(format!(
                "price of product '{}' must be a finite number",
                item.id
            )));
        }

        if let Some(index) = self.position(&item.id) {
            return Ok(Transition::Changed(self.adjusted_at(index, |q| q.checked_add(1))?));
        }

        let mut items = self.items.clone();
        items.push(LineItem {
            quantity: 1,
            ..item.clone()
        });
        Ok(Transition::Changed(Self { items }))
    }

    fn handle_increment(&self, id: &ProductId, config: &CartConfig) -> DomainResult<Transition<Self>> {
        match self.position(id) {
            Some(index) => Ok(Transition::Changed(self.adjusted_at(index, |q| q.checked_add(1))?)),
            None => Self::unknown_id(id, config),
        }
    }

    fn handle_decrement(&self, id: &ProductId, config: &CartConfig) -> DomainResult<Transition<Self>> {
        let Some(index) = self.position(id) else {
            return Self::unknown_id(id, config);
        };

        if config.decrement_floor == DecrementFloor::KeepAtOne && self.items[index].quantity <= 1 {
            return Ok(Transition::Skipped);
        }

        Ok(Transition::Changed(self.adjusted_at(index, |q| q.checked_sub(1))?))
    }

    fn unknown_id(id: &ProductId, config: &CartConfig) -> DomainResult<Transition<Self>> {
        match config.unknown_id_policy {
            UnknownIdPolicy::Ignore => Ok(Transition::Unchanged),
            UnknownIdPolicy::Reject => Err(DomainError::not_found(format!("product '{id}' in cart"))),
        }
    }
}

/// Commands accepted by the cart.
#[derive(Debug, Clone, PartialEq)]
pub enum CartCommand {
    /// Add one unit of a product; the item's own `quantity` is ignored.
    AddToCart(LineItem),
    Increment(ProductId),
    Decrement(ProductId),
    Clear,
}

impl CartCommand {
    pub fn name(&self) -> &'static str {
        match self {
            CartCommand::AddToCart(_) => "cart.add_to_cart",
            CartCommand::Increment(_) => "cart.increment",
            CartCommand::Decrement(_) => "cart.decrement",
            CartCommand::Clear => "cart.clear",
        }
    }

    pub fn product_id(&self) -> Option<&ProductId> {
        match self {
            CartCommand::AddToCart(item) => Some(&item.id),
            CartCommand::Increment(id) | CartCommand::Decrement(id) => Some(id),
            CartCommand::Clear => None,
        }
    }
}

impl Aggregate for CartState {
    type Command = CartCommand;
    type Policy = CartConfig;
    type Error = DomainError;

    fn handle(&self, command: &Self::Command, policy: &Self::Policy) -> Result<Transition<Self>, Self::Error> {
        match command {
            CartCommand::AddToCart(item) => self.handle_add(item),
            CartCommand::Increment(id) => self.handle_increment(id, policy),
            CartCommand::Decrement(id) => self.handle_decrement(id, policy),
            CartCommand::Clear => Ok(Transition::Changed(Self::empty())),
        }
    }
}
