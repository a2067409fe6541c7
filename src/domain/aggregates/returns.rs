//! Return request Aggregate

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::order::{Order, OrderStatus};
use crate::domain::value_objects::Money;

/// Delivered orders may be returned for this many days.
pub const RETURN_WINDOW_DAYS: i64 = 30;
pub const ALREADY_OPEN: &str = "A return request is already open for this order";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnReason { Defective, WrongItem, NotDescribed, WrongSize, NotNeeded, Other }

impl ReturnReason {
    pub const ALL: [ReturnReason; 6] = [Self::Defective, Self::WrongItem, Self::NotDescribed, Self::WrongSize, Self::NotNeeded, Self::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Defective => "defective", Self::WrongItem => "wrong_item", Self::NotDescribed => "not_described",
            Self::WrongSize => "wrong_size", Self::NotNeeded => "not_needed", Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> { Self::ALL.into_iter().find(|r| r.as_str() == s) }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Defective => "Product is defective or damaged",
            Self::WrongItem => "Wrong item received",
            Self::NotDescribed => "Product not as described",
            Self::WrongSize => "Wrong size/color",
            Self::NotNeeded => "No longer needed",
            Self::Other => "Other reason",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus { #[default] Pending, Approved, InProgress, Rejected, Completed }

impl ReturnStatus {
    pub const ALL: [ReturnStatus; 5] = [Self::Pending, Self::Approved, Self::InProgress, Self::Rejected, Self::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending", Self::Approved => "approved", Self::InProgress => "in_progress",
            Self::Rejected => "rejected", Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> { Self::ALL.into_iter().find(|st| st.as_str() == s) }

    /// Still blocks another request for the same order.
    pub fn is_open(&self) -> bool { matches!(self, Self::Pending | Self::Approved | Self::InProgress) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub reason: ReturnReason,
    pub details: Option<String>,
    pub status: ReturnStatus,
    pub refund_amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReturnRequest {
    pub fn open(order: &Order, reason: ReturnReason, details: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), order_id: order.id, user_id: order.user_id, reason,
            details: details.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            status: ReturnStatus::Pending, refund_amount: order.final_amount, created_at: now, updated_at: now,
        }
    }
}

/// Days left to return a delivered order, `None` once the window has closed.
/// The window is counted from the last status change, which for a delivered order is delivery.
pub fn days_left(order: &Order, now: DateTime<Utc>) -> Option<i64> {
    if order.status != OrderStatus::Delivered { return None; }
    let closes = order.updated_at + Duration::days(RETURN_WINDOW_DAYS);
    if now > closes { return None; }
    Some((closes - now).num_days())
}

/// An order the shopper can still send back.
#[derive(Clone, Debug, Serialize)]
pub struct ReturnableOrder {
    pub order_id: Uuid,
    pub order_number: String,
    pub delivered_at: DateTime<Utc>,
    pub final_amount: Money,
    pub items: Vec<String>,
    pub days_left: i64,
}

impl ReturnableOrder {
    pub fn from_order(order: &Order, now: DateTime<Utc>) -> Option<Self> {
        let days_left = days_left(order, now)?;
        Some(Self {
            order_id: order.id, order_number: order.order_number(), delivered_at: order.updated_at,
            final_amount: order.final_amount, items: order.items.iter().map(|i| i.product_name.clone()).collect(), days_left,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::OrderAmounts;

    fn delivered(days_ago: i64) -> Order {
        let mut order = Order::place(Uuid::new_v4(), "card", "House 1, Karachi", None);
        order.add_item(Uuid::new_v4(), "Air Fryer", None, Money::from_major(35000), 1);
        let amounts = OrderAmounts { subtotal: Money::from_major(35000), discount: Money::from_major(500), total: Money::from_major(34500), ..Default::default() };
        order.settle(amounts, None, true).unwrap();
        order.transition(OrderStatus::Delivered, None).unwrap();
        order.updated_at = Utc::now() - Duration::days(days_ago);
        order
    }

    #[test]
    fn test_window() {
        let (recent, old) = (delivered(5), delivered(31));
        let now = Utc::now();
        assert_eq!(days_left(&recent, now), Some(24));
        assert!(days_left(&old, now).is_none());
        let pending = Order::place(Uuid::new_v4(), "cod", "x, Lahore", None);
        assert!(days_left(&pending, now).is_none());
    }

    #[test]
    fn test_refund_is_amount_paid() {
        let order = delivered(1);
        let req = ReturnRequest::open(&order, ReturnReason::Defective, Some("  ".into()));
        assert_eq!(req.refund_amount, Money::from_major(34500));
        assert_eq!(req.details, None);
        assert!(req.status.is_open());
        assert_eq!(ReturnReason::parse("wrong_size"), Some(ReturnReason::WrongSize));
    }
}
