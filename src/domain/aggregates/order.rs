//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub total_amount: Money,
    pub discount_code_id: Option<Uuid>,
    pub discount_amount: Money,
    pub donation_amount: Money,
    pub final_amount: Money,
    pub shipping_address: String,
    pub phone: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub seller_id: Option<Uuid>,
    pub price: Money,
    pub quantity: u32,
}

impl OrderItem {
    pub fn subtotal(&self) -> Money { self.price.multiply(self.quantity) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus { #[default] Pending, Confirmed, Processing, Shipped, Delivered, Cancelled }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus { #[default] Pending, Paid, Failed }

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [Self::Pending, Self::Confirmed, Self::Processing, Self::Shipped, Self::Delivered, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending", Self::Confirmed => "confirmed", Self::Processing => "processing",
            Self::Shipped => "shipped", Self::Delivered => "delivered", Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> { Self::ALL.into_iter().find(|st| st.as_str() == s) }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Paid => "paid", Self::Failed => "failed" }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s { "pending" => Some(Self::Pending), "paid" => Some(Self::Paid), "failed" => Some(Self::Failed), _ => None }
    }
}

/// Amounts settled at checkout.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrderAmounts {
    pub subtotal: Money,
    pub discount: Money,
    pub donation: Money,
    pub total: Money,
}

impl Order {
    pub fn place(user_id: Uuid, payment_method: impl Into<String>, shipping_address: impl Into<String>, phone: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), user_id, status: OrderStatus::Pending, payment_status: PaymentStatus::Pending,
            payment_method: payment_method.into(), total_amount: Money::zero(), discount_code_id: None,
            discount_amount: Money::zero(), donation_amount: Money::zero(), final_amount: Money::zero(),
            shipping_address: shipping_address.into(), phone, tracking_number: None,
            created_at: now, updated_at: now, items: vec![], events: vec![],
        }
    }

    /// Storefront-facing order number: the first eight characters of the id, uppercased.
    pub fn order_number(&self) -> String { order_number(self.id) }

    pub fn shipping_city(&self) -> String { shipping_city(&self.shipping_address) }

    pub fn add_item(&mut self, product_id: Uuid, product_name: impl Into<String>, seller_id: Option<Uuid>, price: Money, quantity: u32) {
        self.items.push(OrderItem { id: Uuid::now_v7(), order_id: self.id, product_id, product_name: product_name.into(), seller_id, price, quantity });
        self.touch();
    }

    pub fn items_subtotal(&self) -> Money { self.items.iter().map(OrderItem::subtotal).sum() }

    pub fn settle(&mut self, amounts: OrderAmounts, discount_code_id: Option<Uuid>, paid: bool) -> Result<(), OrderError> {
        if self.items.is_empty() { return Err(OrderError::NoItems); }
        self.total_amount = amounts.subtotal;
        self.discount_amount = amounts.discount;
        self.donation_amount = amounts.donation;
        self.final_amount = amounts.total;
        self.discount_code_id = discount_code_id;
        self.payment_status = if paid { PaymentStatus::Paid } else { PaymentStatus::Pending };
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::Placed {
            order_id: self.id, user_id: self.user_id, final_amount: self.final_amount, payment_method: self.payment_method.clone(),
        }));
        Ok(())
    }

    /// Moves the order forward or cancels it. Delivered and cancelled orders are final.
    pub fn transition(&mut self, to: OrderStatus, tracking_number: Option<String>) -> Result<(), OrderError> {
        let from = self.status;
        if from.is_terminal() || (to != OrderStatus::Cancelled && to < from) {
            return Err(OrderError::InvalidTransition { from, to });
        }
        self.status = to;
        if tracking_number.is_some() { self.tracking_number = tracking_number; }
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged { order_id: self.id, from, to, tracking_number: self.tracking_number.clone() }));
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

pub fn order_number(id: Uuid) -> String { id.simple().to_string()[..8].to_uppercase() }

pub fn shipping_city(address: &str) -> String {
    match address.rsplit(',').next().map(str::trim) {
        Some(city) if !city.is_empty() => city.to_string(),
        _ => "Unknown".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum OrderError { NoItems, InvalidTransition { from: OrderStatus, to: OrderStatus } }
impl std::error::Error for OrderError {}
impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoItems => write!(f, "No items"),
            Self::InvalidTransition { from, to } => write!(f, "Cannot move order from {} to {}", from.as_str(), to.as_str()),
        }
    }
}
