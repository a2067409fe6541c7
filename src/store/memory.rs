use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{seed, CheckoutRecord, DonationFilter, MarketplaceStore, ProductFilter};
use crate::domain::aggregates::{
    CartLine, Category, Charity, CharityDonation, DiscountCode, DiscountUsage, GoodsDonation, Order, Product, ReturnRequest, Seller,
};
use crate::domain::aggregates::returns::ALREADY_OPEN;
use crate::domain::value_objects::Quantity;
use crate::error::{MarketError, Result};

#[derive(Default)]
struct Tables {
    categories: Vec<Category>,
    products: HashMap<Uuid, Product>,
    cart: Vec<CartLine>,
    orders: HashMap<Uuid, Order>,
    returns: Vec<ReturnRequest>,
    discounts: HashMap<Uuid, DiscountCode>,
    discount_usage: Vec<DiscountUsage>,
    sellers: HashMap<Uuid, Seller>,
    charities: HashMap<Uuid, Charity>,
    charity_donations: Vec<CharityDonation>,
    donations: HashMap<Uuid, GoodsDonation>,
}

/// In-process backend used when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

fn newest_first<T>(mut rows: Vec<T>, created: impl Fn(&T) -> chrono::DateTime<chrono::Utc>) -> Vec<T> {
    rows.sort_by(|a, b| created(b).cmp(&created(a)));
    rows
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Store pre-filled with the demo catalogue, discount codes, charities and seller.
    pub fn seeded() -> Self {
        let seed = seed::demo();
        let tables = Tables {
            categories: seed.categories,
            products: seed.products.into_iter().map(|p| (p.id, p)).collect(),
            discounts: seed.discounts.into_iter().map(|d| (d.id, d)).collect(),
            sellers: seed.sellers.into_iter().map(|s| (s.id, s)).collect(),
            charities: seed.charities.into_iter().map(|c| (c.id, c)).collect(),
            ..Default::default()
        };
        Self { tables: RwLock::new(tables) }
    }

    pub async fn discount_usage(&self) -> Vec<DiscountUsage> { self.tables.read().await.discount_usage.clone() }

    pub async fn charity_donations(&self) -> Vec<CharityDonation> { self.tables.read().await.charity_donations.clone() }
}

#[async_trait]
impl MarketplaceStore for MemoryStore {
    async fn ping(&self) -> Result<()> { Ok(()) }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories = self.tables.read().await.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn category_by_name(&self, name: &str) -> Result<Option<Category>> {
        Ok(self.tables.read().await.categories.iter().find(|c| c.name == name).cloned())
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        let rows: Vec<_> = self.tables.read().await.products.values().filter(|p| filter.matches(p)).cloned().collect();
        let mut rows = newest_first(rows, |p: &Product| p.created_at);
        if let Some(limit) = filter.limit { rows.truncate(limit); }
        Ok(rows)
    }

    async fn product(&self, id: Uuid) -> Result<Option<Product>> { Ok(self.tables.read().await.products.get(&id).cloned()) }

    async fn products_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.products.get(id).cloned()).collect())
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        self.tables.write().await.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<()> { self.insert_product(product).await }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        tables.cart.retain(|l| l.product_id != id);
        Ok(tables.products.remove(&id).is_some())
    }

    async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>> {
        let mut lines: Vec<_> = self.tables.read().await.cart.iter().filter(|l| l.user_id == user_id).cloned().collect();
        lines.sort_by_key(|l| l.created_at);
        Ok(lines)
    }

    async fn save_cart_line(&self, line: &CartLine) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.cart.iter().position(|l| l.user_id == line.user_id && l.product_id == line.product_id) {
            Some(idx) => tables.cart[idx].quantity = line.quantity,
            None => tables.cart.push(line.clone()),
        }
        Ok(())
    }

    async fn add_cart_line(&self, line: &CartLine, added: u32) -> Result<CartLine> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.cart.iter_mut().find(|l| l.user_id == line.user_id && l.product_id == line.product_id) {
            existing.quantity = existing.quantity.add(added);
            return Ok(existing.clone());
        }
        let fresh = CartLine { quantity: Quantity::new(added), ..line.clone() };
        tables.cart.push(fresh.clone());
        Ok(fresh)
    }

    async fn delete_cart_line(&self, user_id: Uuid, line_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.cart.len();
        tables.cart.retain(|l| !(l.id == line_id && l.user_id == user_id));
        Ok(tables.cart.len() != before)
    }

    async fn clear_cart(&self, user_id: Uuid) -> Result<()> {
        self.tables.write().await.cart.retain(|l| l.user_id != user_id);
        Ok(())
    }

    async fn commit_checkout(&self, record: &CheckoutRecord) -> Result<()> {
        let mut tables = self.tables.write().await;
        let order = &record.order;
        if let Some(usage) = &record.discount_usage {
            let code = tables.discounts.get_mut(&usage.discount_code_id).ok_or(MarketError::CodeUnavailable)?;
            if code.usage_limit.is_some_and(|limit| code.usage_count >= limit) {
                return Err(MarketError::CodeUnavailable);
            }
            code.usage_count += 1;
            tables.discount_usage.push(usage.clone());
        }
        tables.orders.insert(order.id, order.clone());
        if let Some(donation) = &record.charity_donation {
            if let Some(charity) = tables.charities.get_mut(&donation.charity_id) {
                charity.raised_amount = charity.raised_amount.add(donation.amount);
            }
            tables.charity_donations.push(donation.clone());
        }
        tables.cart.retain(|l| l.user_id != order.user_id);
        Ok(())
    }

    async fn order(&self, id: Uuid) -> Result<Option<Order>> { Ok(self.tables.read().await.orders.get(&id).cloned()) }

    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
        let rows: Vec<_> = self.tables.read().await.orders.values().filter(|o| o.user_id == user_id).cloned().collect();
        Ok(newest_first(rows, |o: &Order| o.created_at))
    }

    async fn orders_for_seller(&self, seller_id: Uuid) -> Result<Vec<Order>> {
        let rows: Vec<_> = self.tables.read().await.orders.values()
            .filter(|o| o.items.iter().any(|i| i.seller_id == Some(seller_id)))
            .cloned()
            .collect();
        Ok(newest_first(rows, |o: &Order| o.created_at))
    }

    async fn count_orders(&self) -> Result<i64> { Ok(self.tables.read().await.orders.len() as i64) }

    async fn update_order(&self, order: &Order) -> Result<()> {
        self.tables.write().await.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn returns_for_user(&self, user_id: Uuid) -> Result<Vec<ReturnRequest>> {
        let rows: Vec<_> = self.tables.read().await.returns.iter().filter(|r| r.user_id == user_id).cloned().collect();
        Ok(newest_first(rows, |r: &ReturnRequest| r.created_at))
    }

    async fn returns_for_order(&self, order_id: Uuid) -> Result<Vec<ReturnRequest>> {
        Ok(self.tables.read().await.returns.iter().filter(|r| r.order_id == order_id).cloned().collect())
    }

    async fn insert_return(&self, request: &ReturnRequest) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.returns.iter().any(|r| r.order_id == request.order_id && r.status.is_open()) {
            return Err(MarketError::Conflict(ALREADY_OPEN.into()));
        }
        tables.returns.push(request.clone());
        Ok(())
    }

    async fn list_discounts(&self) -> Result<Vec<DiscountCode>> {
        let rows: Vec<_> = self.tables.read().await.discounts.values().cloned().collect();
        Ok(newest_first(rows, |d: &DiscountCode| d.created_at))
    }

    async fn discount(&self, id: Uuid) -> Result<Option<DiscountCode>> { Ok(self.tables.read().await.discounts.get(&id).cloned()) }

    async fn discount_by_code(&self, code: &str) -> Result<Option<DiscountCode>> {
        Ok(self.tables.read().await.discounts.values().find(|d| d.code == code).cloned())
    }

    async fn insert_discount(&self, code: &DiscountCode) -> Result<()> {
        self.tables.write().await.discounts.insert(code.id, code.clone());
        Ok(())
    }

    async fn update_discount(&self, code: &DiscountCode) -> Result<()> { self.insert_discount(code).await }

    async fn delete_discount(&self, id: Uuid) -> Result<bool> { Ok(self.tables.write().await.discounts.remove(&id).is_some()) }

    async fn seller(&self, id: Uuid) -> Result<Option<Seller>> { Ok(self.tables.read().await.sellers.get(&id).cloned()) }

    async fn insert_seller(&self, seller: &Seller) -> Result<()> {
        self.tables.write().await.sellers.insert(seller.id, seller.clone());
        Ok(())
    }

    async fn update_seller(&self, seller: &Seller) -> Result<()> { self.insert_seller(seller).await }

    async fn list_charities(&self, active_only: bool) -> Result<Vec<Charity>> {
        let mut rows: Vec<_> = self.tables.read().await.charities.values().filter(|c| !active_only || c.is_active).cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn charity(&self, id: Uuid) -> Result<Option<Charity>> { Ok(self.tables.read().await.charities.get(&id).cloned()) }

    async fn insert_charity(&self, charity: &Charity) -> Result<()> {
        self.tables.write().await.charities.insert(charity.id, charity.clone());
        Ok(())
    }

    async fn update_charity(&self, charity: &Charity) -> Result<()> { self.insert_charity(charity).await }

    async fn delete_charity(&self, id: Uuid) -> Result<bool> { Ok(self.tables.write().await.charities.remove(&id).is_some()) }

    async fn list_donations(&self, filter: DonationFilter) -> Result<Vec<GoodsDonation>> {
        let rows: Vec<_> = self.tables.read().await.donations.values().filter(|d| filter.matches(d)).cloned().collect();
        Ok(newest_first(rows, |d: &GoodsDonation| d.created_at))
    }

    async fn donation(&self, id: Uuid) -> Result<Option<GoodsDonation>> { Ok(self.tables.read().await.donations.get(&id).cloned()) }

    async fn insert_donation(&self, donation: &GoodsDonation) -> Result<()> {
        self.tables.write().await.donations.insert(donation.id, donation.clone());
        Ok(())
    }

    async fn update_donation(&self, donation: &GoodsDonation) -> Result<()> { self.insert_donation(donation).await }

    async fn delete_donation(&self, id: Uuid) -> Result<bool> { Ok(self.tables.write().await.donations.remove(&id).is_some()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::seed::DEMO_SELLER_ID;

    #[tokio::test]
    async fn test_seeded_catalogue() {
        let store = MemoryStore::seeded();
        let products = store.list_products(ProductFilter::active()).await.unwrap();
        assert_eq!(products.len(), 6);
        assert!(products[0].name.starts_with("Samsung"));
        let mine = store.list_products(ProductFilter { seller_id: Some(DEMO_SELLER_ID), ..Default::default() }).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(store.discount_by_code("WELCOME10").await.unwrap().is_some());
        assert!(store.seller(DEMO_SELLER_ID).await.unwrap().is_some());
        let names: Vec<_> = store.list_categories().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Books", "Electronics", "Fashion", "Home & Garden", "Sports"]);
    }

    #[tokio::test]
    async fn test_cart_lines_are_per_user() {
        let store = MemoryStore::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let line = CartLine { id: Uuid::new_v4(), user_id: alice, product_id: Uuid::new_v4(), quantity: Default::default(), created_at: chrono::Utc::now() };
        store.save_cart_line(&line).await.unwrap();
        assert!(!store.delete_cart_line(bob, line.id).await.unwrap());
        assert_eq!(store.cart_lines(alice).await.unwrap().len(), 1);
        store.clear_cart(alice).await.unwrap();
        assert!(store.cart_lines(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_cart_line_merges_by_product() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let product = Uuid::new_v4();
        let line = |id| CartLine { id, user_id: user, product_id: product, quantity: Quantity::new(1), created_at: chrono::Utc::now() };
        store.add_cart_line(&line(Uuid::new_v4()), 1).await.unwrap();
        let merged = store.add_cart_line(&line(Uuid::new_v4()), 2).await.unwrap();
        assert_eq!(merged.quantity, Quantity::new(3));
        assert_eq!(store.cart_lines(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_commit_refuses_exhausted_code() {
        let store = MemoryStore::seeded();
        let mut code = store.discount_by_code("FLASH50").await.unwrap().unwrap();
        code.usage_limit = Some(1);
        code.usage_count = 1;
        store.update_discount(&code).await.unwrap();

        let user = Uuid::new_v4();
        let order = Order::place(user, "card", "1 Mall Road, Lahore", None);
        let usage = DiscountUsage {
            id: Uuid::new_v4(), discount_code_id: code.id, user_id: user, order_id: order.id,
            discount_amount: crate::domain::value_objects::Money::from_major(1000), used_at: chrono::Utc::now(),
        };
        let record = CheckoutRecord { order, discount_usage: Some(usage), charity_donation: None };
        assert!(matches!(store.commit_checkout(&record).await, Err(MarketError::CodeUnavailable)));
        assert!(store.orders_for_user(user).await.unwrap().is_empty());
        assert!(store.discount_usage().await.is_empty());
    }
}
