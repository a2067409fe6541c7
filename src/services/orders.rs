use serde::Serialize;
use uuid::Uuid;

use super::Marketplace;
use crate::domain::aggregates::Order;
use crate::domain::value_objects::Money;
use crate::error::{MarketError, Result};

/// Orders shown on the account page.
pub const RECENT_ORDERS: usize = 5;

#[derive(Clone, Debug, Serialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub order_number: String,
    pub item_count: u32,
}

impl From<Order> for OrderSummary {
    fn from(order: Order) -> Self {
        Self { order_number: order.order_number(), item_count: order.items.iter().map(|i| i.quantity).sum(), order }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OrderHistory {
    pub orders: Vec<OrderSummary>,
    pub total_orders: usize,
    pub total_spent: Money,
    pub recent: Vec<OrderSummary>,
}

impl Marketplace {
    pub async fn order_history(&self, user_id: Uuid) -> Result<OrderHistory> {
        let orders: Vec<OrderSummary> = self.store.orders_for_user(user_id).await?.into_iter().map(OrderSummary::from).collect();
        let total_spent = orders.iter().map(|o| o.order.total_amount).sum();
        let recent = orders.iter().take(RECENT_ORDERS).cloned().collect();
        Ok(OrderHistory { total_orders: orders.len(), total_spent, recent, orders })
    }

    pub async fn order_detail(&self, user_id: Uuid, order_id: Uuid) -> Result<OrderSummary> {
        let order = self.store.order(order_id).await?.filter(|o| o.user_id == user_id).ok_or(MarketError::OrderNotFound)?;
        Ok(order.into())
    }
}
