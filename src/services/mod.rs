//! Marketplace use cases
//!
//! Each submodule adds an `impl Marketplace` block for one area of the
//! storefront or seller dashboard.

pub mod cart;
pub mod catalog;
pub mod charities;
pub mod checkout;
pub mod dashboard;
pub mod discounts;
pub mod donations;
pub mod orders;
pub mod returns;
pub mod sellers;

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::Seller;
use crate::error::{MarketError, Result};
use crate::payment::PaymentGateway;
use crate::publisher::EventBus;
use crate::store::DynStore;

#[derive(Clone)]
pub struct Marketplace {
    pub store: DynStore,
    pub events: EventBus,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl Marketplace {
    pub fn new(store: DynStore, events: EventBus, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, events, gateway }
    }

    /// The seller record of a signed-in user, or `NotASeller`.
    pub async fn require_seller(&self, user_id: Uuid) -> Result<Seller> {
        self.store.seller(user_id).await?.ok_or(MarketError::NotASeller)
    }
}

/// Case-insensitive substring match used by every search box.
pub(crate) fn text_matches(term: Option<&str>, fields: &[Option<&str>]) -> bool {
    let term = term.map(|t| t.trim().to_lowercase()).unwrap_or_default();
    term.is_empty() || fields.iter().flatten().any(|f| f.to_lowercase().contains(&term))
}
