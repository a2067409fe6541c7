use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::collections::HashMap;
use uuid::Uuid;

use super::{CheckoutRecord, DonationFilter, MarketplaceStore, ProductFilter};
use crate::domain::aggregates::charity::VerificationStatus;
use crate::domain::aggregates::returns::ALREADY_OPEN;
use crate::domain::aggregates::seller::StorePreferences;
use crate::domain::aggregates::{
    CartLine, Category, Charity, CharityDonation, DiscountCode, DiscountKind, DonationStatus, GoodsDonation, Order, OrderItem,
    OrderStatus, PaymentStatus, Product, ReturnReason, ReturnRequest, ReturnStatus, Seller,
};
use crate::domain::value_objects::{Money, Quantity};
use crate::error::{MarketError, Result};

/// Hosted Postgres backend.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let items = sqlx::query_as::<_, OrderItemRow>("SELECT * FROM order_items WHERE order_id = ANY($1)")
            .bind(&ids).fetch_all(&self.pool).await?;
        let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item.into());
        }
        rows.into_iter().map(|r| {
            let items = by_order.remove(&r.id).unwrap_or_default();
            r.into_order(items)
        }).collect()
    }
}

fn decode<T>(parsed: Option<T>, column: &str, raw: &str) -> Result<T> {
    parsed.ok_or_else(|| MarketError::Backend(format!("unexpected {column} value '{raw}'")))
}

fn count(v: i32) -> u32 { u32::try_from(v).unwrap_or(0) }

#[derive(sqlx::FromRow)]
struct CategoryRow { id: Uuid, name: String, description: Option<String>, image_url: Option<String>, created_at: DateTime<Utc> }

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Self { id: r.id, name: r.name, description: r.description, image_url: r.image_url, created_at: r.created_at }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid, seller_id: Option<Uuid>, category_id: Option<Uuid>, name: String, description: Option<String>,
    price: Decimal, original_price: Option<Decimal>, stock_quantity: i32, image_url: Option<String>, is_active: bool,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id, seller_id: r.seller_id, category_id: r.category_id, name: r.name, description: r.description,
            price: Money::new(r.price), original_price: r.original_price.map(Money::new), stock_quantity: count(r.stock_quantity),
            image_url: r.image_url, is_active: r.is_active, created_at: r.created_at, updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartRow { id: Uuid, user_id: Uuid, product_id: Uuid, quantity: i32, created_at: DateTime<Utc> }

impl From<CartRow> for CartLine {
    fn from(r: CartRow) -> Self {
        Self { id: r.id, user_id: r.user_id, product_id: r.product_id, quantity: Quantity::new(count(r.quantity)), created_at: r.created_at }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid, user_id: Uuid, status: String, payment_status: String, payment_method: String, total_amount: Decimal,
    discount_code_id: Option<Uuid>, discount_amount: Decimal, donation_amount: Decimal, final_amount: Decimal,
    shipping_address: String, phone: Option<String>, tracking_number: Option<String>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order> {
        let mut order = Order::place(self.user_id, self.payment_method, self.shipping_address, self.phone);
        order.id = self.id;
        order.status = decode(OrderStatus::parse(&self.status), "order status", &self.status)?;
        order.payment_status = decode(PaymentStatus::parse(&self.payment_status), "payment status", &self.payment_status)?;
        order.total_amount = Money::new(self.total_amount);
        order.discount_code_id = self.discount_code_id;
        order.discount_amount = Money::new(self.discount_amount);
        order.donation_amount = Money::new(self.donation_amount);
        order.final_amount = Money::new(self.final_amount);
        order.tracking_number = self.tracking_number;
        order.created_at = self.created_at;
        order.updated_at = self.updated_at;
        order.items = items;
        Ok(order)
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow { id: Uuid, order_id: Uuid, product_id: Uuid, product_name: String, seller_id: Option<Uuid>, price: Decimal, quantity: i32 }

impl From<OrderItemRow> for OrderItem {
    fn from(r: OrderItemRow) -> Self {
        Self {
            id: r.id, order_id: r.order_id, product_id: r.product_id, product_name: r.product_name, seller_id: r.seller_id,
            price: Money::new(r.price), quantity: count(r.quantity),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReturnRow {
    id: Uuid, order_id: Uuid, user_id: Uuid, reason: String, details: Option<String>, status: String, refund_amount: Decimal,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<ReturnRow> for ReturnRequest {
    type Error = MarketError;
    fn try_from(r: ReturnRow) -> Result<Self> {
        Ok(Self {
            id: r.id, order_id: r.order_id, user_id: r.user_id, reason: decode(ReturnReason::parse(&r.reason), "return reason", &r.reason)?,
            details: r.details, status: decode(ReturnStatus::parse(&r.status), "return status", &r.status)?,
            refund_amount: Money::new(r.refund_amount), created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DiscountRow {
    id: Uuid, code: String, #[sqlx(rename = "type")] kind: String, value: Decimal, min_amount: Decimal, max_discount: Option<Decimal>,
    description: Option<String>, is_active: bool, usage_limit: Option<i32>, usage_count: i32, valid_from: DateTime<Utc>,
    valid_until: Option<DateTime<Utc>>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<DiscountRow> for DiscountCode {
    type Error = MarketError;
    fn try_from(r: DiscountRow) -> Result<Self> {
        Ok(Self {
            id: r.id, code: r.code, kind: decode(DiscountKind::parse(&r.kind), "discount type", &r.kind)?, value: r.value,
            min_amount: Money::new(r.min_amount), max_discount: r.max_discount.map(Money::new), description: r.description,
            is_active: r.is_active, usage_limit: r.usage_limit.map(count), usage_count: count(r.usage_count), valid_from: r.valid_from,
            valid_until: r.valid_until, created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SellerRow {
    id: Uuid, email: String, full_name: String, business_name: String, phone: String, address: String, city: String,
    business_type: String, tax_id: String, is_verified: bool, preferences: Json<StorePreferences>,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl From<SellerRow> for Seller {
    fn from(r: SellerRow) -> Self {
        Self {
            id: r.id, email: r.email, full_name: r.full_name, business_name: r.business_name, phone: r.phone, address: r.address,
            city: r.city, business_type: r.business_type, tax_id: r.tax_id, is_verified: r.is_verified, preferences: r.preferences.0,
            created_at: r.created_at, updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CharityRow {
    id: Uuid, name: String, description: Option<String>, category: String, logo_url: Option<String>, website_url: Option<String>,
    contact_email: Option<String>, contact_phone: Option<String>, address: Option<String>, city: Option<String>,
    province: Option<String>, target_amount: Option<Decimal>, raised_amount: Decimal, is_active: bool, verification_status: String,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<CharityRow> for Charity {
    type Error = MarketError;
    fn try_from(r: CharityRow) -> Result<Self> {
        Ok(Self {
            id: r.id, name: r.name, description: r.description, category: r.category, logo_url: r.logo_url, website_url: r.website_url,
            contact_email: r.contact_email, contact_phone: r.contact_phone, address: r.address, city: r.city, province: r.province,
            target_amount: r.target_amount.map(Money::new), raised_amount: Money::new(r.raised_amount), is_active: r.is_active,
            verification_status: decode(VerificationStatus::parse(&r.verification_status), "verification status", &r.verification_status)?,
            created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DonationRow {
    id: Uuid, donor_id: Uuid, product_name: String, description: Option<String>, condition: String, category: String,
    estimated_value: Decimal, quantity: i32, donor_name: String, donor_email: String, donor_phone: String, pickup_address: String,
    pickup_city: String, preferred_pickup_date: Option<NaiveDate>, additional_notes: Option<String>, image_urls: Vec<String>,
    status: String, admin_notes: Option<String>, pickup_date: Option<NaiveDate>, pickup_time: Option<String>,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<DonationRow> for GoodsDonation {
    type Error = MarketError;
    fn try_from(r: DonationRow) -> Result<Self> {
        Ok(Self {
            id: r.id, donor_id: r.donor_id, product_name: r.product_name, description: r.description, condition: r.condition,
            category: r.category, estimated_value: Money::new(r.estimated_value), quantity: count(r.quantity), donor_name: r.donor_name,
            donor_email: r.donor_email, donor_phone: r.donor_phone, pickup_address: r.pickup_address, pickup_city: r.pickup_city,
            preferred_pickup_date: r.preferred_pickup_date, additional_notes: r.additional_notes, image_urls: r.image_urls,
            status: decode(DonationStatus::parse(&r.status), "donation status", &r.status)?, admin_notes: r.admin_notes,
            pickup_date: r.pickup_date, pickup_time: r.pickup_time, created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

fn int(v: u32) -> i32 { i32::try_from(v).unwrap_or(i32::MAX) }

#[async_trait]
impl MarketplaceStore for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories ORDER BY name").fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories WHERE name = $1").bind(name).fetch_optional(&self.pool).await?;
        Ok(row.map(Into::into))
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT * FROM products WHERE ($1::uuid IS NULL OR category_id = $1) AND ($2::uuid IS NULL OR seller_id = $2) \
             AND (NOT $3 OR is_active) ORDER BY created_at DESC LIMIT $4")
            .bind(filter.category_id).bind(filter.seller_id).bind(filter.active_only)
            .bind(filter.limit.map(|l| l as i64))
            .fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn product(&self, id: Uuid) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(Into::into))
    }

    async fn products_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ANY($1)").bind(ids).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_product(&self, p: &Product) -> Result<()> {
        sqlx::query("INSERT INTO products (id, seller_id, category_id, name, description, price, original_price, stock_quantity, image_url, is_active, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)")
            .bind(p.id).bind(p.seller_id).bind(p.category_id).bind(&p.name).bind(&p.description).bind(p.price.amount())
            .bind(p.original_price.map(|m| m.amount())).bind(int(p.stock_quantity)).bind(&p.image_url).bind(p.is_active)
            .bind(p.created_at).bind(p.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn update_product(&self, p: &Product) -> Result<()> {
        sqlx::query("UPDATE products SET category_id = $2, name = $3, description = $4, price = $5, original_price = $6, \
                     stock_quantity = $7, image_url = $8, is_active = $9, updated_at = $10 WHERE id = $1")
            .bind(p.id).bind(p.category_id).bind(&p.name).bind(&p.description).bind(p.price.amount())
            .bind(p.original_price.map(|m| m.amount())).bind(int(p.stock_quantity)).bind(&p.image_url).bind(p.is_active).bind(p.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>> {
        let rows = sqlx::query_as::<_, CartRow>("SELECT * FROM cart_items WHERE user_id = $1 ORDER BY created_at")
            .bind(user_id).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn save_cart_line(&self, line: &CartLine) -> Result<()> {
        sqlx::query("INSERT INTO cart_items (id, user_id, product_id, quantity, created_at) VALUES ($1, $2, $3, $4, $5) \
                     ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity")
            .bind(line.id).bind(line.user_id).bind(line.product_id).bind(int(line.quantity.value())).bind(line.created_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn add_cart_line(&self, line: &CartLine, added: u32) -> Result<CartLine> {
        let row = sqlx::query_as::<_, CartRow>("INSERT INTO cart_items (id, user_id, product_id, quantity, created_at) VALUES ($1, $2, $3, $4, $5) \
                     ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity RETURNING *")
            .bind(line.id).bind(line.user_id).bind(line.product_id).bind(int(added)).bind(line.created_at)
            .fetch_one(&self.pool).await?;
        Ok(row.into())
    }

    async fn delete_cart_line(&self, user_id: Uuid, line_id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2").bind(line_id).bind(user_id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn clear_cart(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id).execute(&self.pool).await?;
        Ok(())
    }

    async fn commit_checkout(&self, record: &CheckoutRecord) -> Result<()> {
        let o = &record.order;
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO orders (id, user_id, status, payment_status, payment_method, total_amount, discount_code_id, discount_amount, \
                     donation_amount, final_amount, shipping_address, phone, tracking_number, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)")
            .bind(o.id).bind(o.user_id).bind(o.status.as_str()).bind(o.payment_status.as_str()).bind(&o.payment_method)
            .bind(o.total_amount.amount()).bind(o.discount_code_id).bind(o.discount_amount.amount()).bind(o.donation_amount.amount())
            .bind(o.final_amount.amount()).bind(&o.shipping_address).bind(&o.phone).bind(&o.tracking_number).bind(o.created_at).bind(o.updated_at)
            .execute(&mut *tx).await?;
        for item in &o.items {
            sqlx::query("INSERT INTO order_items (id, order_id, product_id, product_name, seller_id, price, quantity) VALUES ($1, $2, $3, $4, $5, $6, $7)")
                .bind(item.id).bind(item.order_id).bind(item.product_id).bind(&item.product_name).bind(item.seller_id)
                .bind(item.price.amount()).bind(int(item.quantity))
                .execute(&mut *tx).await?;
        }
        if let Some(u) = &record.discount_usage {
            let redeemed = sqlx::query("UPDATE discount_codes SET usage_count = usage_count + 1, updated_at = NOW() \
                                        WHERE id = $1 AND (usage_limit IS NULL OR usage_count < usage_limit)")
                .bind(u.discount_code_id).execute(&mut *tx).await?;
            if redeemed.rows_affected() != 1 {
                tx.rollback().await?;
                return Err(MarketError::CodeUnavailable);
            }
            sqlx::query("INSERT INTO discount_usage (id, discount_code_id, user_id, order_id, discount_amount, used_at) VALUES ($1, $2, $3, $4, $5, $6)")
                .bind(u.id).bind(u.discount_code_id).bind(u.user_id).bind(u.order_id).bind(u.discount_amount.amount()).bind(u.used_at)
                .execute(&mut *tx).await?;
        }
        if let Some(d) = &record.charity_donation {
            sqlx::query("INSERT INTO charity_donations (id, user_id, charity_id, order_id, amount, payment_method, transaction_id, status, anonymous, message, created_at) \
                         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)")
                .bind(d.id).bind(d.user_id).bind(d.charity_id).bind(d.order_id).bind(d.amount.amount()).bind(&d.payment_method)
                .bind(&d.transaction_id).bind(d.status.as_str()).bind(d.anonymous).bind(&d.message).bind(d.created_at)
                .execute(&mut *tx).await?;
            sqlx::query("UPDATE charities SET raised_amount = raised_amount + $2, updated_at = NOW() WHERE id = $1")
                .bind(d.charity_id).bind(d.amount.amount()).execute(&mut *tx).await?;
        }
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(o.user_id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn order(&self, id: Uuid) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        let Some(row) = row else { return Ok(None) };
        Ok(self.attach_items(vec![row]).await?.pop())
    }

    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id).fetch_all(&self.pool).await?;
        self.attach_items(rows).await
    }

    async fn orders_for_seller(&self, seller_id: Uuid) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders WHERE id IN (SELECT order_id FROM order_items WHERE seller_id = $1) ORDER BY created_at DESC")
            .bind(seller_id).fetch_all(&self.pool).await?;
        self.attach_items(rows).await
    }

    async fn count_orders(&self) -> Result<i64> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders").fetch_one(&self.pool).await?;
        Ok(total.0)
    }

    async fn update_order(&self, o: &Order) -> Result<()> {
        sqlx::query("UPDATE orders SET status = $2, payment_status = $3, tracking_number = $4, updated_at = $5 WHERE id = $1")
            .bind(o.id).bind(o.status.as_str()).bind(o.payment_status.as_str()).bind(&o.tracking_number).bind(o.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn returns_for_user(&self, user_id: Uuid) -> Result<Vec<ReturnRequest>> {
        let rows = sqlx::query_as::<_, ReturnRow>("SELECT * FROM return_requests WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id).fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn returns_for_order(&self, order_id: Uuid) -> Result<Vec<ReturnRequest>> {
        let rows = sqlx::query_as::<_, ReturnRow>("SELECT * FROM return_requests WHERE order_id = $1")
            .bind(order_id).fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn insert_return(&self, r: &ReturnRequest) -> Result<()> {
        sqlx::query("INSERT INTO return_requests (id, order_id, user_id, reason, details, status, refund_amount, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)")
            .bind(r.id).bind(r.order_id).bind(r.user_id).bind(r.reason.as_str()).bind(&r.details).bind(r.status.as_str())
            .bind(r.refund_amount.amount()).bind(r.created_at).bind(r.updated_at)
            .execute(&self.pool).await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => MarketError::Conflict(ALREADY_OPEN.into()),
                other => other.into(),
            })?;
        Ok(())
    }

    async fn list_discounts(&self) -> Result<Vec<DiscountCode>> {
        let rows = sqlx::query_as::<_, DiscountRow>("SELECT * FROM discount_codes ORDER BY created_at DESC").fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn discount(&self, id: Uuid) -> Result<Option<DiscountCode>> {
        let row = sqlx::query_as::<_, DiscountRow>("SELECT * FROM discount_codes WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn discount_by_code(&self, code: &str) -> Result<Option<DiscountCode>> {
        let row = sqlx::query_as::<_, DiscountRow>("SELECT * FROM discount_codes WHERE code = $1").bind(code).fetch_optional(&self.pool).await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn insert_discount(&self, d: &DiscountCode) -> Result<()> {
        sqlx::query("INSERT INTO discount_codes (id, code, type, value, min_amount, max_discount, description, is_active, usage_limit, usage_count, \
                     valid_from, valid_until, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)")
            .bind(d.id).bind(&d.code).bind(d.kind.as_str()).bind(d.value).bind(d.min_amount.amount()).bind(d.max_discount.map(|m| m.amount()))
            .bind(&d.description).bind(d.is_active).bind(d.usage_limit.map(int)).bind(int(d.usage_count)).bind(d.valid_from)
            .bind(d.valid_until).bind(d.created_at).bind(d.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn update_discount(&self, d: &DiscountCode) -> Result<()> {
        sqlx::query("UPDATE discount_codes SET code = $2, type = $3, value = $4, min_amount = $5, max_discount = $6, description = $7, \
                     is_active = $8, usage_limit = $9, valid_from = $10, valid_until = $11, updated_at = $12 WHERE id = $1")
            .bind(d.id).bind(&d.code).bind(d.kind.as_str()).bind(d.value).bind(d.min_amount.amount()).bind(d.max_discount.map(|m| m.amount()))
            .bind(&d.description).bind(d.is_active).bind(d.usage_limit.map(int)).bind(d.valid_from).bind(d.valid_until).bind(d.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_discount(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM discount_codes WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn seller(&self, id: Uuid) -> Result<Option<Seller>> {
        let row = sqlx::query_as::<_, SellerRow>("SELECT * FROM sellers WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(Into::into))
    }

    async fn insert_seller(&self, s: &Seller) -> Result<()> {
        sqlx::query("INSERT INTO sellers (id, email, full_name, business_name, phone, address, city, business_type, tax_id, is_verified, \
                     preferences, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)")
            .bind(s.id).bind(&s.email).bind(&s.full_name).bind(&s.business_name).bind(&s.phone).bind(&s.address).bind(&s.city)
            .bind(&s.business_type).bind(&s.tax_id).bind(s.is_verified).bind(Json(&s.preferences)).bind(s.created_at).bind(s.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn update_seller(&self, s: &Seller) -> Result<()> {
        sqlx::query("UPDATE sellers SET full_name = $2, business_name = $3, phone = $4, address = $5, city = $6, business_type = $7, \
                     tax_id = $8, preferences = $9, updated_at = $10 WHERE id = $1")
            .bind(s.id).bind(&s.full_name).bind(&s.business_name).bind(&s.phone).bind(&s.address).bind(&s.city).bind(&s.business_type)
            .bind(&s.tax_id).bind(Json(&s.preferences)).bind(s.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn list_charities(&self, active_only: bool) -> Result<Vec<Charity>> {
        let rows = sqlx::query_as::<_, CharityRow>("SELECT * FROM charities WHERE (NOT $1 OR is_active) ORDER BY name")
            .bind(active_only).fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn charity(&self, id: Uuid) -> Result<Option<Charity>> {
        let row = sqlx::query_as::<_, CharityRow>("SELECT * FROM charities WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn insert_charity(&self, c: &Charity) -> Result<()> {
        sqlx::query("INSERT INTO charities (id, name, description, category, logo_url, website_url, contact_email, contact_phone, address, city, \
                     province, target_amount, raised_amount, is_active, verification_status, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)")
            .bind(c.id).bind(&c.name).bind(&c.description).bind(&c.category).bind(&c.logo_url).bind(&c.website_url).bind(&c.contact_email)
            .bind(&c.contact_phone).bind(&c.address).bind(&c.city).bind(&c.province).bind(c.target_amount.map(|m| m.amount()))
            .bind(c.raised_amount.amount()).bind(c.is_active).bind(c.verification_status.as_str()).bind(c.created_at).bind(c.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn update_charity(&self, c: &Charity) -> Result<()> {
        sqlx::query("UPDATE charities SET name = $2, description = $3, category = $4, logo_url = $5, website_url = $6, contact_email = $7, \
                     contact_phone = $8, address = $9, city = $10, province = $11, target_amount = $12, is_active = $13, \
                     verification_status = $14, updated_at = $15 WHERE id = $1")
            .bind(c.id).bind(&c.name).bind(&c.description).bind(&c.category).bind(&c.logo_url).bind(&c.website_url).bind(&c.contact_email)
            .bind(&c.contact_phone).bind(&c.address).bind(&c.city).bind(&c.province).bind(c.target_amount.map(|m| m.amount()))
            .bind(c.is_active).bind(c.verification_status.as_str()).bind(c.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_charity(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM charities WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn list_donations(&self, filter: DonationFilter) -> Result<Vec<GoodsDonation>> {
        let rows = sqlx::query_as::<_, DonationRow>(
            "SELECT * FROM goods_donations WHERE ($1::uuid IS NULL OR donor_id = $1) AND ($2::text IS NULL OR status = $2) \
             AND ($3::text IS NULL OR category = $3) ORDER BY created_at DESC")
            .bind(filter.donor_id).bind(filter.status.map(|s| s.as_str())).bind(filter.category)
            .fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn donation(&self, id: Uuid) -> Result<Option<GoodsDonation>> {
        let row = sqlx::query_as::<_, DonationRow>("SELECT * FROM goods_donations WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn insert_donation(&self, d: &GoodsDonation) -> Result<()> {
        sqlx::query("INSERT INTO goods_donations (id, donor_id, product_name, description, condition, category, estimated_value, quantity, \
                     donor_name, donor_email, donor_phone, pickup_address, pickup_city, preferred_pickup_date, additional_notes, image_urls, \
                     status, admin_notes, pickup_date, pickup_time, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)")
            .bind(d.id).bind(d.donor_id).bind(&d.product_name).bind(&d.description).bind(&d.condition).bind(&d.category)
            .bind(d.estimated_value.amount()).bind(int(d.quantity)).bind(&d.donor_name).bind(&d.donor_email).bind(&d.donor_phone)
            .bind(&d.pickup_address).bind(&d.pickup_city).bind(d.preferred_pickup_date).bind(&d.additional_notes).bind(&d.image_urls)
            .bind(d.status.as_str()).bind(&d.admin_notes).bind(d.pickup_date).bind(&d.pickup_time).bind(d.created_at).bind(d.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn update_donation(&self, d: &GoodsDonation) -> Result<()> {
        sqlx::query("UPDATE goods_donations SET status = $2, admin_notes = $3, pickup_date = $4, pickup_time = $5, updated_at = $6 WHERE id = $1")
            .bind(d.id).bind(d.status.as_str()).bind(&d.admin_notes).bind(d.pickup_date).bind(&d.pickup_time).bind(d.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_donation(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM goods_donations WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }
}
