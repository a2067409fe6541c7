//! Seller dashboard: listings, fulfilment and store analytics
//!
//! Every figure is computed from the seller's own order items. Orders that
//! mix several sellers' products are cut down to the caller's lines.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

use super::Marketplace;
use crate::domain::aggregates::order::shipping_city;
use crate::domain::aggregates::product::LOW_STOCK_THRESHOLD;
use crate::domain::aggregates::{Order, OrderItem, OrderStatus, PaymentStatus, Product, ProductDraft, StockStatus, StoreSettings, StoreSettingsPatch};
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::Money;
use crate::error::{MarketError, Result};
use crate::store::ProductFilter;

pub const TOP_PRODUCTS: usize = 5;
pub const REVENUE_MONTHS: usize = 6;

#[derive(Clone, Debug, Serialize)]
pub struct SellerProduct {
    #[serde(flatten)]
    pub product: Product,
    pub sales_count: u32,
    pub stock_status: StockStatus,
}

#[derive(Clone, Debug, Serialize)]
pub struct SellerOrder {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub total_amount: Money,
    pub shipping_address: String,
    pub shipping_city: String,
    pub phone: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl SellerOrder {
    /// `None` when none of the order's lines belong to `seller_id`.
    fn restrict(order: Order, seller_id: Uuid) -> Option<Self> {
        let items: Vec<OrderItem> = order.items.into_iter().filter(|i| i.seller_id == Some(seller_id)).collect();
        if items.is_empty() { return None; }
        Some(Self {
            order_number: crate::domain::aggregates::order::order_number(order.id),
            shipping_city: shipping_city(&order.shipping_address),
            total_amount: items.iter().map(OrderItem::subtotal).sum(),
            id: order.id, user_id: order.user_id, status: order.status, payment_status: order.payment_status,
            payment_method: order.payment_method, shipping_address: order.shipping_address, phone: order.phone,
            tracking_number: order.tracking_number, created_at: order.created_at, updated_at: order.updated_at, items,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub name: String,
    pub sales: u32,
    pub revenue: Money,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: Money,
    pub orders: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct Analytics {
    pub total_sales: Money,
    pub total_orders: usize,
    pub total_products: usize,
    pub total_customers: usize,
    pub monthly_growth: f64,
    pub top_products: Vec<TopProduct>,
    pub order_status_distribution: Vec<StatusCount>,
    pub revenue_by_month: Vec<MonthlyRevenue>,
    pub low_stock_products: usize,
    pub out_of_stock_products: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct Dashboard {
    pub products: Vec<SellerProduct>,
    pub orders: Vec<SellerOrder>,
    pub analytics: Analytics,
    pub settings: StoreSettings,
}

fn units_sold(orders: &[SellerOrder]) -> HashMap<Uuid, u32> {
    let mut sold = HashMap::new();
    for item in orders.iter().flat_map(|o| &o.items) {
        *sold.entry(item.product_id).or_insert(0) += item.quantity;
    }
    sold
}

/// Non-cancelled revenue per calendar month, oldest first, limited to the latest `REVENUE_MONTHS`.
pub fn revenue_by_month(orders: &[SellerOrder]) -> Vec<MonthlyRevenue> {
    let mut months: BTreeMap<(i32, u32), (Money, usize)> = BTreeMap::new();
    for order in orders.iter().filter(|o| o.status != OrderStatus::Cancelled) {
        let entry = months.entry((order.created_at.year(), order.created_at.month())).or_insert((Money::zero(), 0));
        entry.0 = entry.0.add(order.total_amount);
        entry.1 += 1;
    }
    let skip = months.len().saturating_sub(REVENUE_MONTHS);
    months
        .into_iter()
        .skip(skip)
        .map(|((year, month), (revenue, orders))| MonthlyRevenue { month: month_label(year, month), revenue, orders })
        .collect()
}

fn month_label(year: i32, month: u32) -> String {
    const NAMES: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];
    let name = NAMES.get(month.saturating_sub(1) as usize).copied().unwrap_or("???");
    format!("{name} {year}")
}

/// Percentage change of the last month over the one before, one decimal place.
pub fn monthly_growth(months: &[MonthlyRevenue]) -> f64 {
    let [.., previous, last] = months else { return 0.0 };
    if previous.revenue.is_zero() { return 0.0; }
    let change = (last.revenue.amount() - previous.revenue.amount()) / previous.revenue.amount() * Decimal::ONE_HUNDRED;
    change.round_dp(1).to_f64().unwrap_or(0.0)
}

pub fn analytics(products: &[SellerProduct], orders: &[SellerOrder]) -> Analytics {
    let mut ranked: Vec<&SellerProduct> = products.iter().filter(|p| p.sales_count > 0).collect();
    ranked.sort_by(|a, b| b.sales_count.cmp(&a.sales_count));
    let top_products = ranked
        .into_iter()
        .take(TOP_PRODUCTS)
        .map(|p| TopProduct { product_id: p.product.id, name: p.product.name.clone(), sales: p.sales_count, revenue: p.product.price.multiply(p.sales_count) })
        .collect();
    let order_status_distribution = OrderStatus::ALL
        .into_iter()
        .map(|status| StatusCount { status, count: orders.iter().filter(|o| o.status == status).count() })
        .filter(|c| c.count > 0)
        .collect();
    let revenue_by_month = revenue_by_month(orders);
    Analytics {
        total_sales: orders.iter().filter(|o| o.status != OrderStatus::Cancelled).map(|o| o.total_amount).sum(),
        total_orders: orders.len(),
        total_products: products.len(),
        total_customers: orders.iter().map(|o| o.user_id).collect::<HashSet<_>>().len(),
        monthly_growth: monthly_growth(&revenue_by_month),
        top_products,
        order_status_distribution,
        revenue_by_month,
        low_stock_products: products.iter().filter(|p| p.product.stock_quantity < LOW_STOCK_THRESHOLD).count(),
        out_of_stock_products: products.iter().filter(|p| p.product.stock_quantity == 0).count(),
    }
}

impl Marketplace {
    async fn owned_product(&self, seller_id: Uuid, product_id: Uuid) -> Result<Product> {
        self.store.product(product_id).await?.filter(|p| p.belongs_to(seller_id)).ok_or(MarketError::ProductNotFound)
    }

    pub async fn seller_orders(&self, seller_id: Uuid) -> Result<Vec<SellerOrder>> {
        self.require_seller(seller_id).await?;
        Ok(self.store.orders_for_seller(seller_id).await?.into_iter().filter_map(|o| SellerOrder::restrict(o, seller_id)).collect())
    }

    async fn products_with_sales(&self, seller_id: Uuid, orders: &[SellerOrder]) -> Result<Vec<SellerProduct>> {
        let sold = units_sold(orders);
        let products = self.store.list_products(ProductFilter { seller_id: Some(seller_id), ..ProductFilter::active() }).await?;
        Ok(products
            .into_iter()
            .map(|p| SellerProduct { sales_count: sold.get(&p.id).copied().unwrap_or(0), stock_status: p.stock_status(), product: p })
            .collect())
    }

    pub async fn seller_products(&self, seller_id: Uuid) -> Result<Vec<SellerProduct>> {
        let orders = self.seller_orders(seller_id).await?;
        self.products_with_sales(seller_id, &orders).await
    }

    pub async fn add_product(&self, seller_id: Uuid, draft: ProductDraft) -> Result<Product> {
        self.require_seller(seller_id).await?;
        let product = Product::create(seller_id, draft)?;
        self.store.insert_product(&product).await?;
        tracing::info!(product_id = %product.id, %seller_id, "product listed");
        self.events.publish(DomainEvent::Product(ProductEvent::Listed { product_id: product.id, seller_id })).await;
        Ok(product)
    }

    pub async fn update_product(&self, seller_id: Uuid, product_id: Uuid, draft: ProductDraft) -> Result<Product> {
        let mut product = self.owned_product(seller_id, product_id).await?;
        product.apply(draft)?;
        self.store.update_product(&product).await?;
        self.events.publish(DomainEvent::Product(ProductEvent::Updated { product_id })).await;
        Ok(product)
    }

    pub async fn delete_product(&self, seller_id: Uuid, product_id: Uuid) -> Result<()> {
        self.owned_product(seller_id, product_id).await?;
        if !self.store.delete_product(product_id).await? {
            return Err(MarketError::ProductNotFound);
        }
        tracing::info!(%product_id, %seller_id, "product removed");
        self.events.publish(DomainEvent::Product(ProductEvent::Removed { product_id })).await;
        Ok(())
    }

    pub async fn update_order_status(&self, seller_id: Uuid, order_id: Uuid, update: StatusUpdate) -> Result<SellerOrder> {
        self.require_seller(seller_id).await?;
        let mut order = self
            .store
            .order(order_id)
            .await?
            .filter(|o| o.items.iter().any(|i| i.seller_id == Some(seller_id)))
            .ok_or(MarketError::OrderNotFound)?;
        let tracking = update.tracking_number.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        order.transition(update.status, tracking)?;
        self.store.update_order(&order).await?;
        tracing::info!(%order_id, status = update.status.as_str(), "order status updated");
        self.events.publish_all(order.take_events()).await;
        SellerOrder::restrict(order, seller_id).ok_or(MarketError::OrderNotFound)
    }

    pub async fn seller_analytics(&self, seller_id: Uuid) -> Result<Analytics> {
        let orders = self.seller_orders(seller_id).await?;
        let products = self.products_with_sales(seller_id, &orders).await?;
        Ok(analytics(&products, &orders))
    }

    pub async fn store_settings(&self, seller_id: Uuid) -> Result<StoreSettings> {
        Ok(self.require_seller(seller_id).await?.settings())
    }

    pub async fn update_store_settings(&self, seller_id: Uuid, patch: StoreSettingsPatch) -> Result<StoreSettings> {
        let mut seller = self.require_seller(seller_id).await?;
        seller.apply_settings(patch);
        self.store.update_seller(&seller).await?;
        Ok(seller.settings())
    }

    /// Everything the dashboard shows on first load.
    pub async fn load_dashboard(&self, seller_id: Uuid) -> Result<Dashboard> {
        let seller = self.require_seller(seller_id).await?;
        let orders = self.seller_orders(seller_id).await?;
        let products = self.products_with_sales(seller_id, &orders).await?;
        let analytics = analytics(&products, &orders);
        Ok(Dashboard { products, orders, analytics, settings: seller.settings() })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{market, product_id};
    use super::*;
    use crate::services::checkout::tests::card_request;
    use crate::store::DEMO_SELLER_ID;
    use chrono::TimeZone;

    fn draft(name: &str, price: i64, stock: i64) -> ProductDraft {
        ProductDraft { name: name.into(), price: Money::from_major(price), stock_quantity: stock, is_active: true, ..Default::default() }
    }

    fn seller_order(status: OrderStatus, created_at: DateTime<Utc>, total: i64) -> SellerOrder {
        SellerOrder {
            id: Uuid::new_v4(), order_number: "ABCD1234".into(), user_id: Uuid::new_v4(), status, payment_status: PaymentStatus::Paid,
            payment_method: "card".into(), total_amount: Money::from_major(total), shipping_address: "x, Lahore".into(),
            shipping_city: "Lahore".into(), phone: None, tracking_number: None, created_at, updated_at: created_at, items: vec![],
        }
    }

    #[test]
    fn test_revenue_by_month_and_growth() {
        let at = |y, m| Utc.with_ymd_and_hms(y, m, 10, 12, 0, 0).unwrap();
        let mut orders = vec![seller_order(OrderStatus::Cancelled, at(2024, 7), 99999)];
        for (m, total) in [(1, 100), (2, 100), (3, 100), (4, 100), (5, 100), (6, 1000), (7, 2000), (7, 500)] {
            orders.push(seller_order(OrderStatus::Delivered, at(2024, m), total));
        }
        let months = revenue_by_month(&orders);
        assert_eq!(months.len(), 6);
        assert_eq!(months[0].month, "Feb 2024");
        assert_eq!(months[5], MonthlyRevenue { month: "Jul 2024".into(), revenue: Money::from_major(2500), orders: 2 });
        assert_eq!(monthly_growth(&months), 150.0);
        assert_eq!(monthly_growth(&months[..1]), 0.0);
    }

    #[tokio::test]
    async fn test_product_ownership() {
        let m = market();
        let added = m.add_product(DEMO_SELLER_ID, draft("Dell XPS 13", 250000, 3)).await.unwrap();
        assert_eq!(added.seller_id, Some(DEMO_SELLER_ID));
        assert!(matches!(m.add_product(DEMO_SELLER_ID, draft(" ", 10, 1)).await, Err(MarketError::Validation(_))));
        assert!(matches!(m.add_product(Uuid::new_v4(), draft("Nope", 10, 1)).await, Err(MarketError::NotASeller)));

        // Nike shoes are not the demo seller's
        assert!(matches!(m.update_product(DEMO_SELLER_ID, product_id(2), draft("Mine now", 1, 1)).await, Err(MarketError::ProductNotFound)));
        let updated = m.update_product(DEMO_SELLER_ID, added.id, draft("Dell XPS 13 (2024)", 240000, 0)).await.unwrap();
        assert_eq!(updated.stock_status(), StockStatus::OutOfStock);
        m.delete_product(DEMO_SELLER_ID, added.id).await.unwrap();
        assert!(matches!(m.delete_product(DEMO_SELLER_ID, added.id).await, Err(MarketError::ProductNotFound)));
    }

    #[tokio::test]
    async fn test_orders_and_analytics() {
        let m = market();
        let buyer = Uuid::new_v4();
        m.add_to_cart(buyer, product_id(3), Some(2)).await.unwrap();
        m.add_to_cart(buyer, product_id(2), Some(1)).await.unwrap();
        let placed = m.place_order(buyer, card_request()).await.unwrap().order;

        let orders = m.seller_orders(DEMO_SELLER_ID).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].items.len(), 1);
        assert_eq!(orders[0].total_amount, Money::from_major(290000));
        assert_eq!(orders[0].shipping_city, "Punjab");

        let dash = m.load_dashboard(DEMO_SELLER_ID).await.unwrap();
        let laptop = dash.products.iter().find(|p| p.product.id == product_id(3)).unwrap();
        assert_eq!(laptop.sales_count, 2);
        assert_eq!(laptop.stock_status, StockStatus::LowStock);
        let a = &dash.analytics;
        assert_eq!(a.total_sales, Money::from_major(290000));
        assert_eq!((a.total_orders, a.total_products, a.total_customers), (1, 2, 1));
        assert_eq!(a.top_products.len(), 1);
        assert_eq!(a.top_products[0].name, laptop.product.name);
        assert_eq!(a.top_products[0].revenue, Money::from_major(290000));
        assert_eq!(a.low_stock_products, 1);
        assert_eq!(a.order_status_distribution, vec![StatusCount { status: OrderStatus::Pending, count: 1 }]);
        assert_eq!(a.revenue_by_month.len(), 1);

        let update = StatusUpdate { status: OrderStatus::Shipped, tracking_number: Some("TCS-998877".into()) };
        let shipped = m.update_order_status(DEMO_SELLER_ID, placed.id, update).await.unwrap();
        assert_eq!(shipped.tracking_number.as_deref(), Some("TCS-998877"));
        assert_eq!(m.store.order(placed.id).await.unwrap().unwrap().status, OrderStatus::Shipped);
        let back = StatusUpdate { status: OrderStatus::Confirmed, tracking_number: None };
        assert!(matches!(m.update_order_status(DEMO_SELLER_ID, placed.id, back).await, Err(MarketError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_unsold_products_not_ranked() {
        let m = market();
        let a = m.seller_analytics(DEMO_SELLER_ID).await.unwrap();
        assert_eq!(a.total_products, 2);
        assert!(a.top_products.is_empty());
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let m = market();
        let patch = StoreSettingsPatch { description: Some("Genuine electronics".into()), low_stock_alerts: Some(false), ..Default::default() };
        let settings = m.update_store_settings(DEMO_SELLER_ID, patch).await.unwrap();
        assert!(!settings.preferences.low_stock_alerts);
        assert_eq!(m.store_settings(DEMO_SELLER_ID).await.unwrap().preferences.description, "Genuine electronics");
    }
}
