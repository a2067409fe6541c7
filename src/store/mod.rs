//! Query client over the hosted marketplace backend
//!
//! Services never talk to storage directly. Everything goes through
//! [`MarketplaceStore`], implemented by [`PgStore`] for the hosted Postgres
//! backend and [`MemoryStore`] for development and tests.

mod memory;
mod postgres;
mod seed;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use seed::DEMO_SELLER_ID;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{
    CartLine, Category, Charity, CharityDonation, DiscountCode, DiscountUsage, DonationStatus, GoodsDonation, Order, Product,
    ReturnRequest, Seller,
};
use crate::error::Result;

pub type DynStore = Arc<dyn MarketplaceStore>;

/// Product listing query; results are newest first.
#[derive(Clone, Debug, Default)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub active_only: bool,
    pub limit: Option<usize>,
}

impl ProductFilter {
    pub fn active() -> Self { Self { active_only: true, ..Default::default() } }

    pub fn matches(&self, p: &Product) -> bool {
        (!self.active_only || p.is_active)
            && self.category_id.map_or(true, |c| p.category_id == Some(c))
            && self.seller_id.map_or(true, |s| p.seller_id == Some(s))
    }
}

/// Goods donation query; results are newest first.
#[derive(Clone, Debug, Default)]
pub struct DonationFilter {
    pub donor_id: Option<Uuid>,
    pub status: Option<DonationStatus>,
    pub category: Option<String>,
}

impl DonationFilter {
    pub fn matches(&self, d: &GoodsDonation) -> bool {
        self.donor_id.map_or(true, |id| d.donor_id == id)
            && self.status.map_or(true, |s| d.status == s)
            && self.category.as_deref().map_or(true, |c| d.category == c)
    }
}

/// Everything a successful checkout writes, applied together.
#[derive(Clone, Debug)]
pub struct CheckoutRecord {
    pub order: Order,
    pub discount_usage: Option<DiscountUsage>,
    pub charity_donation: Option<CharityDonation>,
}

#[async_trait]
pub trait MarketplaceStore: Send + Sync {
    async fn ping(&self) -> Result<()>;

    // catalogue
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn category_by_name(&self, name: &str) -> Result<Option<Category>>;
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>>;
    async fn product(&self, id: Uuid) -> Result<Option<Product>>;
    async fn products_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>>;
    async fn insert_product(&self, product: &Product) -> Result<()>;
    async fn update_product(&self, product: &Product) -> Result<()>;
    async fn delete_product(&self, id: Uuid) -> Result<bool>;

    // cart
    async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>>;
    /// Sets the quantity of the user's line for that product, creating it if absent.
    async fn save_cart_line(&self, line: &CartLine) -> Result<()>;
    /// Adds `added` to the user's line for that product in one step and returns the stored line.
    async fn add_cart_line(&self, line: &CartLine, added: u32) -> Result<CartLine>;
    async fn delete_cart_line(&self, user_id: Uuid, line_id: Uuid) -> Result<bool>;
    async fn clear_cart(&self, user_id: Uuid) -> Result<()>;

    // orders
    /// Stores the order with its items, redeems the discount, funds the charity and empties the cart.
    /// Writes nothing and fails with `CodeUnavailable` if the code reached its usage limit meanwhile.
    async fn commit_checkout(&self, record: &CheckoutRecord) -> Result<()>;
    async fn order(&self, id: Uuid) -> Result<Option<Order>>;
    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>>;
    /// Orders with at least one item sold by `seller_id`, all items included.
    async fn orders_for_seller(&self, seller_id: Uuid) -> Result<Vec<Order>>;
    async fn count_orders(&self) -> Result<i64>;
    async fn update_order(&self, order: &Order) -> Result<()>;

    // returns
    async fn returns_for_user(&self, user_id: Uuid) -> Result<Vec<ReturnRequest>>;
    async fn returns_for_order(&self, order_id: Uuid) -> Result<Vec<ReturnRequest>>;
    /// `Conflict` when the order already has an open request.
    async fn insert_return(&self, request: &ReturnRequest) -> Result<()>;

    // discount codes
    async fn list_discounts(&self) -> Result<Vec<DiscountCode>>;
    async fn discount(&self, id: Uuid) -> Result<Option<DiscountCode>>;
    async fn discount_by_code(&self, code: &str) -> Result<Option<DiscountCode>>;
    async fn insert_discount(&self, code: &DiscountCode) -> Result<()>;
    async fn update_discount(&self, code: &DiscountCode) -> Result<()>;
    async fn delete_discount(&self, id: Uuid) -> Result<bool>;

    // sellers
    async fn seller(&self, id: Uuid) -> Result<Option<Seller>>;
    async fn insert_seller(&self, seller: &Seller) -> Result<()>;
    async fn update_seller(&self, seller: &Seller) -> Result<()>;

    // charities
    async fn list_charities(&self, active_only: bool) -> Result<Vec<Charity>>;
    async fn charity(&self, id: Uuid) -> Result<Option<Charity>>;
    async fn insert_charity(&self, charity: &Charity) -> Result<()>;
    async fn update_charity(&self, charity: &Charity) -> Result<()>;
    async fn delete_charity(&self, id: Uuid) -> Result<bool>;

    // goods donations
    async fn list_donations(&self, filter: DonationFilter) -> Result<Vec<GoodsDonation>>;
    async fn donation(&self, id: Uuid) -> Result<Option<GoodsDonation>>;
    async fn insert_donation(&self, donation: &GoodsDonation) -> Result<()>;
    async fn update_donation(&self, donation: &GoodsDonation) -> Result<()>;
    async fn delete_donation(&self, id: Uuid) -> Result<bool>;
}
