//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::aggregates::product::Product;
use crate::domain::value_objects::{Money, Quantity};

/// One row of a shopper's cart as the backend stores it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Quantity,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct Cart {
    user_id: Uuid,
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(user_id: Uuid, lines: Vec<CartLine>) -> Self { Self { user_id, lines } }

    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn line(&self, line_id: Uuid) -> Option<&CartLine> { self.lines.iter().find(|l| l.id == line_id) }

    /// Adds `quantity` of `product`, merging into an existing line for the same product.
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> Result<CartLine, CartError> {
        if quantity == 0 { return Err(CartError::InvalidQuantity); }
        if !product.is_active { return Err(CartError::ProductUnavailable); }
        let current = self.lines.iter().find(|l| l.product_id == product.id).map(|l| l.quantity).unwrap_or_default();
        let wanted = current.add(quantity);
        if wanted.value() > product.stock_quantity {
            return Err(CartError::InsufficientStock { available: product.stock_quantity });
        }
        if let Some(existing) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            existing.quantity = wanted;
            return Ok(existing.clone());
        }
        let line = CartLine { id: Uuid::now_v7(), user_id: self.user_id, product_id: product.id, quantity: wanted, created_at: Utc::now() };
        self.lines.push(line.clone());
        Ok(line)
    }

    /// Sets a line's quantity; zero or less removes the line and yields `None`.
    pub fn update_quantity(&mut self, line_id: Uuid, quantity: i64, product: &Product) -> Result<Option<CartLine>, CartError> {
        if quantity <= 0 {
            self.remove_item(line_id)?;
            return Ok(None);
        }
        let item = self.lines.iter_mut().find(|l| l.id == line_id).ok_or(CartError::ItemNotFound)?;
        let quantity = u32::try_from(quantity).map_err(|_| CartError::InvalidQuantity)?;
        if quantity > product.stock_quantity {
            return Err(CartError::InsufficientStock { available: product.stock_quantity });
        }
        item.quantity = Quantity::new(quantity);
        Ok(Some(item.clone()))
    }

    pub fn remove_item(&mut self, line_id: Uuid) -> Result<(), CartError> {
        let before = self.lines.len();
        self.lines.retain(|l| l.id != line_id);
        if self.lines.len() == before { return Err(CartError::ItemNotFound); }
        Ok(())
    }

    pub fn total_items(&self) -> u32 { self.lines.iter().map(|l| l.quantity.value()).sum() }

    /// Price of every line at the listed product price; lines whose product vanished count as zero.
    pub fn total_price(&self, products: &HashMap<Uuid, Product>) -> Money {
        self.lines.iter()
            .filter_map(|l| products.get(&l.product_id).map(|p| p.price.multiply(l.quantity.value())))
            .sum()
    }
}

/// Product fields the cart screen needs next to each line.
#[derive(Clone, Debug, Serialize)]
pub struct CartProduct {
    pub id: Uuid,
    pub name: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub stock_quantity: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct CartItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub line_total: Money,
    pub product: CartProduct,
}

#[derive(Clone, Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total_items: u32,
    pub total_price: Money,
    pub total_display: String,
}

impl CartView {
    pub fn build(cart: &Cart, products: &HashMap<Uuid, Product>) -> Self {
        let items = cart.lines().iter().filter_map(|l| {
            let p = products.get(&l.product_id)?;
            Some(CartItemView {
                id: l.id, product_id: l.product_id, quantity: l.quantity.value(), created_at: l.created_at,
                line_total: p.price.multiply(l.quantity.value()),
                product: CartProduct { id: p.id, name: p.name.clone(), price: p.price, image_url: p.image_url.clone(), stock_quantity: p.stock_quantity },
            })
        }).collect();
        let total_price = cart.total_price(products);
        Self { items, total_items: cart.total_items(), total_price, total_display: total_price.display() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartError { ItemNotFound, InvalidQuantity, ProductUnavailable, InsufficientStock { available: u32 } }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemNotFound => write!(f, "Item not found"),
            Self::InvalidQuantity => write!(f, "Invalid quantity"),
            Self::ProductUnavailable => write!(f, "Product not available"),
            Self::InsufficientStock { available } => write!(f, "Only {available} left in stock"),
        }
    }
}
