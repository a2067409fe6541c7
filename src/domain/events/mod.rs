//! Domain events
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::donation::DonationStatus;
use crate::domain::aggregates::order::OrderStatus;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "area", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
    Donation(DonationEvent),
    Seller(SellerEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductEvent {
    Listed { product_id: Uuid, seller_id: Uuid },
    Updated { product_id: Uuid },
    Removed { product_id: Uuid },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, user_id: Uuid, final_amount: Money, payment_method: String },
    StatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus, tracking_number: Option<String> },
    ReturnRequested { order_id: Uuid, return_id: Uuid },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DonationEvent {
    GoodsSubmitted { donation_id: Uuid, donor_id: Uuid, category: String },
    GoodsStatusChanged { donation_id: Uuid, status: DonationStatus },
    CharityFunded { charity_id: Uuid, amount: Money, order_id: Option<Uuid> },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SellerEvent {
    Registered { seller_id: Uuid, business_name: String },
}

impl DomainEvent {
    /// Message-bus subject, e.g. `shoppak.order.placed`.
    pub fn subject(&self) -> String {
        let (area, name) = match self {
            Self::Product(e) => ("product", match e {
                ProductEvent::Listed { .. } => "listed",
                ProductEvent::Updated { .. } => "updated",
                ProductEvent::Removed { .. } => "removed",
            }),
            Self::Order(e) => ("order", match e {
                OrderEvent::Placed { .. } => "placed",
                OrderEvent::StatusChanged { .. } => "status_changed",
                OrderEvent::ReturnRequested { .. } => "return_requested",
            }),
            Self::Donation(e) => ("donation", match e {
                DonationEvent::GoodsSubmitted { .. } => "goods_submitted",
                DonationEvent::GoodsStatusChanged { .. } => "goods_status_changed",
                DonationEvent::CharityFunded { .. } => "charity_funded",
            }),
            Self::Seller(SellerEvent::Registered { .. }) => ("seller", "registered"),
        };
        format!("shoppak.{area}.{name}")
    }
}
