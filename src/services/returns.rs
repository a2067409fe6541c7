use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Marketplace;
use crate::domain::aggregates::returns::{days_left, ALREADY_OPEN};
use crate::domain::aggregates::{ReturnReason, ReturnRequest, ReturnableOrder};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::error::{MarketError, Result};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReturnForm {
    #[serde(default)]
    pub reason: String,
    pub details: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReasonOption {
    pub value: &'static str,
    pub label: &'static str,
}

pub fn reason_options() -> Vec<ReasonOption> {
    ReturnReason::ALL.iter().map(|r| ReasonOption { value: r.as_str(), label: r.label() }).collect()
}

impl Marketplace {
    /// Delivered orders still inside the return window, soonest to close first.
    pub async fn returnable_orders(&self, user_id: Uuid) -> Result<Vec<ReturnableOrder>> {
        let now = Utc::now();
        let mut eligible: Vec<ReturnableOrder> =
            self.store.orders_for_user(user_id).await?.iter().filter_map(|o| ReturnableOrder::from_order(o, now)).collect();
        eligible.sort_by_key(|o| o.days_left);
        Ok(eligible)
    }

    pub async fn request_return(&self, user_id: Uuid, order_id: Uuid, form: ReturnForm) -> Result<ReturnRequest> {
        let reason = form.reason.trim();
        if reason.is_empty() {
            return Err(MarketError::MissingFields(vec!["reason".into()]));
        }
        let reason = ReturnReason::parse(reason).ok_or_else(|| MarketError::Validation(format!("Unknown return reason '{reason}'")))?;
        let order = self.store.order(order_id).await?.filter(|o| o.user_id == user_id).ok_or(MarketError::OrderNotFound)?;
        if days_left(&order, Utc::now()).is_none() {
            return Err(MarketError::Validation("This order is not eligible for return".into()));
        }
        if self.store.returns_for_order(order_id).await?.iter().any(|r| r.status.is_open()) {
            return Err(MarketError::Conflict(ALREADY_OPEN.into()));
        }
        let request = ReturnRequest::open(&order, reason, form.details);
        self.store.insert_return(&request).await?;
        tracing::info!(return_id = %request.id, %order_id, reason = reason.as_str(), "return requested");
        self.events.publish(DomainEvent::Order(OrderEvent::ReturnRequested { order_id, return_id: request.id })).await;
        Ok(request)
    }

    pub async fn return_requests(&self, user_id: Uuid) -> Result<Vec<ReturnRequest>> {
        self.store.returns_for_user(user_id).await
    }
}
