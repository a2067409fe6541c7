//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Money;

/// Stock below this is flagged on the seller dashboard.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub original_price: Option<Money>,
    pub stock_quantity: u32,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus { InStock, LowStock, OutOfStock }

/// Seller-supplied fields for creating or editing a listing.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub price: Money,
    pub original_price: Option<Money>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub stock_quantity: i64,
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool { true }

impl ProductDraft {
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() { return Err(ProductError::MissingName); }
        if self.price.amount() <= Decimal::ZERO { return Err(ProductError::InvalidPrice); }
        if self.stock_quantity < 0 || self.stock_quantity > u32::MAX as i64 { return Err(ProductError::InvalidStock); }
        Ok(())
    }
}

impl Product {
    pub fn create(seller_id: Uuid, draft: ProductDraft) -> Result<Self, ProductError> {
        draft.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(), seller_id: Some(seller_id), category_id: draft.category_id,
            name: draft.name.trim().to_string(), description: draft.description, price: draft.price,
            original_price: draft.original_price, stock_quantity: draft.stock_quantity as u32,
            image_url: draft.image_url, is_active: draft.is_active, created_at: now, updated_at: now,
        })
    }

    pub fn apply(&mut self, draft: ProductDraft) -> Result<(), ProductError> {
        draft.validate()?;
        self.name = draft.name.trim().to_string();
        self.price = draft.price;
        self.original_price = draft.original_price;
        self.description = draft.description;
        self.category_id = draft.category_id;
        self.stock_quantity = draft.stock_quantity as u32;
        self.image_url = draft.image_url;
        self.is_active = draft.is_active;
        self.touch();
        Ok(())
    }

    pub fn is_in_stock(&self) -> bool { self.stock_quantity > 0 }

    pub fn stock_status(&self) -> StockStatus {
        match self.stock_quantity {
            0 => StockStatus::OutOfStock,
            n if n < LOW_STOCK_THRESHOLD => StockStatus::LowStock,
            _ => StockStatus::InStock,
        }
    }

    /// Whole-number markdown against `original_price`, 0 when not on sale.
    pub fn discount_percentage(&self) -> u32 {
        let Some(original) = self.original_price else { return 0 };
        if original.amount() <= self.price.amount() || original.is_zero() { return 0; }
        let pct = (original.amount() - self.price.amount()) / original.amount() * Decimal::ONE_HUNDRED;
        pct.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero).to_u32().unwrap_or(0)
    }

    pub fn is_on_sale(&self) -> bool { self.discount_percentage() > 0 }

    pub fn belongs_to(&self, seller_id: Uuid) -> bool { self.seller_id == Some(seller_id) }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

/// What a product card on the storefront shows.
#[derive(Clone, Debug, Serialize)]
pub struct ProductCard {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub original_price: Option<Money>,
    pub image_url: Option<String>,
    pub stock_quantity: u32,
    pub discount_percentage: u32,
    pub is_on_sale: bool,
    pub price_display: String,
}

impl From<&Product> for ProductCard {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id, name: p.name.clone(), description: p.description.clone(), price: p.price,
            original_price: p.original_price, image_url: p.image_url.clone(), stock_quantity: p.stock_quantity,
            discount_percentage: p.discount_percentage(), is_on_sale: p.is_on_sale(), price_display: p.price.display(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ProductError { MissingName, InvalidPrice, InvalidStock }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "Product name is required"),
            Self::InvalidPrice => write!(f, "Valid price is required"),
            Self::InvalidStock => write!(f, "Valid stock quantity is required"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, price: i64, stock: i64) -> ProductDraft {
        ProductDraft { name: name.into(), price: Money::from_major(price), stock_quantity: stock, is_active: true, ..Default::default() }
    }

    #[test]
    fn test_product_create() {
        let p = Product::create(Uuid::new_v4(), draft("  Kurta ", 4500, 20)).unwrap();
        assert_eq!(p.name, "Kurta");
        assert_eq!(p.stock_status(), StockStatus::InStock);
    }

    #[test]
    fn test_draft_validation() {
        assert_eq!(draft(" ", 10, 1).validate(), Err(ProductError::MissingName));
        assert_eq!(draft("P", 0, 1).validate(), Err(ProductError::InvalidPrice));
        assert_eq!(draft("P", 10, -1).validate(), Err(ProductError::InvalidStock));
    }

    #[test]
    fn test_stock_status() {
        let mut p = Product::create(Uuid::new_v4(), draft("P", 10, 9)).unwrap();
        assert_eq!(p.stock_status(), StockStatus::LowStock);
        p.stock_quantity = 0;
        assert_eq!(p.stock_status(), StockStatus::OutOfStock);
        assert!(!p.is_in_stock());
    }

    #[test]
    fn test_discount_percentage() {
        let mut p = Product::create(Uuid::new_v4(), draft("Shoes", 12500, 5)).unwrap();
        assert_eq!(p.discount_percentage(), 0);
        p.original_price = Some(Money::from_major(15000));
        assert_eq!(p.discount_percentage(), 17);
        assert!(p.is_on_sale());
        p.original_price = Some(Money::from_major(10000));
        assert!(!p.is_on_sale());
    }
}
