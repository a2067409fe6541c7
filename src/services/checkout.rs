use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::Marketplace;
use crate::domain::aggregates::charity::CharityDonationStatus;
use crate::domain::aggregates::discount::normalize_code;
use crate::domain::aggregates::{Cart, CharityDonation, DiscountUsage, Order, OrderAmounts, Product};
use crate::domain::events::{DomainEvent, DonationEvent};
use crate::domain::value_objects::Money;
use crate::error::{MarketError, Result};
use crate::forms::{self, not_blank};
use crate::payment::{self, PaymentDetails, PaymentMethod, PaymentReceipt};
use crate::pricing::{self, AppliedDiscount, CheckoutTotals};
use crate::store::CheckoutRecord;

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct ShippingForm {
    #[validate(custom = "not_blank")]
    pub first_name: String,
    #[validate(custom = "not_blank")]
    pub last_name: String,
    #[validate(custom = "not_blank")]
    pub email: String,
    #[validate(custom = "not_blank")]
    pub phone: String,
    #[validate(custom = "not_blank")]
    pub address: String,
    #[validate(custom = "not_blank")]
    pub city: String,
    pub state: Option<String>,
    pub postal: Option<String>,
}

impl ShippingForm {
    /// `address, city, state`; the state is left out when blank.
    pub fn shipping_address(&self) -> String {
        let mut parts = vec![self.address.trim(), self.city.trim()];
        if let Some(state) = self.state.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            parts.push(state);
        }
        parts.join(", ")
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DonationAddOn {
    pub amount: Money,
    pub charity_id: Option<Uuid>,
    #[serde(default)]
    pub anonymous: bool,
    pub message: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub shipping: ShippingForm,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment: PaymentDetails,
    pub discount_code: Option<String>,
    pub donation: Option<DonationAddOn>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct QuoteRequest {
    pub discount_code: Option<String>,
    pub donation: Option<Money>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Quote {
    pub totals: CheckoutTotals,
    pub discount: Option<AppliedDiscount>,
    pub donation_presets: Vec<Money>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CheckoutConfirmation {
    pub order: Order,
    pub order_number: String,
    pub receipt: PaymentReceipt,
    pub totals: CheckoutTotals,
    pub message: String,
}

pub fn confirmation_message(order: &Order, receipt: &PaymentReceipt) -> String {
    format!("Order #{} has been confirmed. Transaction ID: {}", order.order_number(), receipt.transaction_id)
}

impl Marketplace {
    async fn resolve_code(&self, code: Option<&str>, subtotal: Money) -> Result<Option<AppliedDiscount>> {
        let Some(code) = code.map(normalize_code).filter(|c| !c.is_empty()) else { return Ok(None) };
        let found = self.store.discount_by_code(&code).await?;
        let applied = pricing::apply_code(found.as_ref(), subtotal, Utc::now());
        if let Err(e) = &applied {
            tracing::warn!(%code, error = %e, "discount code rejected");
        }
        applied.map(Some)
    }

    async fn non_empty_cart(&self, user_id: Uuid) -> Result<(Cart, std::collections::HashMap<Uuid, Product>)> {
        let (cart, products) = self.load_cart(user_id).await?;
        if cart.is_empty() { return Err(MarketError::EmptyCart); }
        Ok((cart, products))
    }

    /// Totals for the cart with an optional code and donation, without charging.
    pub async fn quote(&self, user_id: Uuid, request: QuoteRequest) -> Result<Quote> {
        let (cart, products) = self.non_empty_cart(user_id).await?;
        let subtotal = cart.total_price(&products);
        let discount = self.resolve_code(request.discount_code.as_deref(), subtotal).await?;
        let donation = pricing::validate_donation(request.donation)?;
        Ok(Quote { totals: pricing::totals(subtotal, discount.as_ref(), donation), discount, donation_presets: pricing::donation_presets() })
    }

    pub async fn place_order(&self, user_id: Uuid, request: CheckoutRequest) -> Result<CheckoutConfirmation> {
        let (cart, products) = self.non_empty_cart(user_id).await?;
        forms::require(&request.shipping, &[])?;

        let subtotal = cart.total_price(&products);
        let discount = self.resolve_code(request.discount_code.as_deref(), subtotal).await?;
        let donation = request.donation.as_ref();
        let donation_amount = pricing::validate_donation(donation.map(|d| d.amount))?;
        let charity = match donation.and_then(|d| d.charity_id).filter(|_| !donation_amount.is_zero()) {
            Some(id) => Some(self.store.charity(id).await?.filter(|c| c.is_active).ok_or(MarketError::CharityNotFound)?),
            None => None,
        };
        payment::validate_details(request.payment_method, &request.payment)?;

        let totals = pricing::totals(subtotal, discount.as_ref(), donation_amount);
        let method = request.payment_method;
        let receipt = self.gateway.charge(method, totals.total).await?;

        let mut order = Order::place(user_id, method.as_str(), request.shipping.shipping_address(), Some(request.shipping.phone.trim().to_string()));
        for line in cart.lines() {
            let Some(product) = products.get(&line.product_id) else { continue };
            order.add_item(product.id, product.name.clone(), product.seller_id, product.price, line.quantity.value());
        }
        let amounts = OrderAmounts { subtotal, discount: totals.discount, donation: totals.donation, total: totals.total };
        order.settle(amounts, discount.as_ref().map(|d| d.code_id), method.settles_now())?;

        let discount_usage = discount.as_ref().map(|d| DiscountUsage {
            id: Uuid::now_v7(), discount_code_id: d.code_id, user_id, order_id: order.id, discount_amount: d.amount, used_at: Utc::now(),
        });
        let charity_donation = charity.map(|c| CharityDonation {
            id: Uuid::now_v7(), user_id: Some(user_id), charity_id: c.id, order_id: Some(order.id), amount: donation_amount,
            payment_method: Some(method.as_str().to_string()), transaction_id: Some(receipt.transaction_id.clone()),
            status: CharityDonationStatus::Completed, anonymous: donation.is_some_and(|d| d.anonymous),
            message: donation.and_then(|d| d.message.clone()), created_at: Utc::now(),
        });

        let mut events = order.take_events();
        if let Some(d) = &charity_donation {
            events.push(DomainEvent::Donation(DonationEvent::CharityFunded { charity_id: d.charity_id, amount: d.amount, order_id: d.order_id }));
        }
        let record = CheckoutRecord { order, discount_usage, charity_donation };
        if let Err(e) = self.store.commit_checkout(&record).await {
            tracing::warn!(%user_id, transaction_id = %receipt.transaction_id, error = %e, "checkout not committed after payment");
            return Err(e);
        }
        let order = record.order;
        tracing::info!(order_id = %order.id, %user_id, total = %order.final_amount, method = method.as_str(), transaction_id = %receipt.transaction_id, "order placed");
        self.events.publish_all(events).await;

        Ok(CheckoutConfirmation { message: confirmation_message(&order, &receipt), order_number: order.order_number(), order, receipt, totals })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::super::testing::{market, market_with, product_id};
    use super::*;
    use crate::domain::aggregates::PaymentStatus;

    pub(crate) fn shipping() -> ShippingForm {
        ShippingForm {
            first_name: "Ahmed".into(), last_name: "Khan".into(), email: "ahmed@example.com".into(), phone: "03001234567".into(),
            address: "House 123, Street 45".into(), city: "Lahore".into(), state: Some("Punjab".into()), postal: None,
        }
    }

    pub(crate) fn card_request() -> CheckoutRequest {
        CheckoutRequest {
            shipping: shipping(),
            payment_method: PaymentMethod::Card,
            payment: PaymentDetails {
                card_number: Some("4111111111111111".into()), expiry: Some("09/29".into()), cvv: Some("123".into()),
                card_name: Some("Ahmed Khan".into()), ..Default::default()
            },
            discount_code: None,
            donation: None,
        }
    }

    #[test]
    fn test_shipping_address() {
        assert_eq!(shipping().shipping_address(), "House 123, Street 45, Lahore, Punjab");
        let no_state = ShippingForm { state: Some(" ".into()), ..shipping() };
        assert_eq!(no_state.shipping_address(), "House 123, Street 45, Lahore");
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let m = market();
        assert!(matches!(m.place_order(Uuid::new_v4(), card_request()).await, Err(MarketError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_missing_fields_reported_together() {
        let m = market();
        let user = Uuid::new_v4();
        m.add_to_cart(user, product_id(4), None).await.unwrap();
        let mut req = card_request();
        req.shipping.city = String::new();
        req.shipping.phone = " ".into();
        let err = m.place_order(user, req).await.unwrap_err();
        assert_eq!(err.to_string(), "Please fill in: city, phone");
        assert_eq!(m.cart(user).await.unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_order_with_discount_and_donation() {
        let m = market();
        let user = Uuid::new_v4();
        m.add_to_cart(user, product_id(2), Some(1)).await.unwrap();
        let charity = m.store.list_charities(true).await.unwrap().into_iter().find(|c| c.name == "Edhi Foundation").unwrap();
        let mut req = card_request();
        req.discount_code = Some(" welcome10 ".into());
        req.donation = Some(DonationAddOn { amount: Money::from_major(200), charity_id: Some(charity.id), anonymous: false, message: None });

        let done = m.place_order(user, req).await.unwrap();
        assert_eq!(done.order.total_amount, Money::from_major(12500));
        assert_eq!(done.order.discount_amount, Money::from_major(1250));
        assert_eq!(done.order.donation_amount, Money::from_major(200));
        assert_eq!(done.order.final_amount, Money::from_major(11450));
        assert_eq!(done.receipt.amount, Money::from_major(11450));
        assert_eq!(done.order.payment_status, PaymentStatus::Paid);
        assert_eq!(done.order.shipping_city(), "Punjab");
        assert_eq!(done.message, format!("Order #{} has been confirmed. Transaction ID: {}", done.order_number, done.receipt.transaction_id));

        assert!(m.cart(user).await.unwrap().items.is_empty());
        let code = m.store.discount_by_code("WELCOME10").await.unwrap().unwrap();
        assert_eq!(code.usage_count, 1);
        let funded = m.store.charity(charity.id).await.unwrap().unwrap();
        assert_eq!(funded.raised_amount, Money::from_major(125200));
        let stored = m.store.order(done.order.id).await.unwrap().unwrap();
        assert_eq!(stored.items.len(), 1);
    }

    #[tokio::test]
    async fn test_cash_on_delivery_is_pending() {
        let m = market();
        let user = Uuid::new_v4();
        m.add_to_cart(user, product_id(6), Some(2)).await.unwrap();
        let req = CheckoutRequest {
            payment_method: PaymentMethod::Cod,
            payment: PaymentDetails { name: Some("Ahmed".into()), phone: Some("03001234567".into()), ..Default::default() },
            ..card_request()
        };
        let done = m.place_order(user, req).await.unwrap();
        assert_eq!(done.order.payment_status, PaymentStatus::Pending);
        assert_eq!(done.order.payment_method, "cod");
    }

    #[tokio::test]
    async fn test_declined_payment_keeps_cart() {
        let m = market_with(0.0);
        let user = Uuid::new_v4();
        m.add_to_cart(user, product_id(1), None).await.unwrap();
        let err = m.place_order(user, card_request()).await.unwrap_err();
        assert!(matches!(err, MarketError::PaymentDeclined(_)));
        assert_eq!(m.cart(user).await.unwrap().items.len(), 1);
        assert!(m.store.orders_for_user(user).await.unwrap().is_empty());
    }

    async fn limit_code(m: &Marketplace, code: &str, limit: u32) {
        let mut found = m.store.discount_by_code(code).await.unwrap().unwrap();
        found.usage_limit = Some(limit);
        m.store.update_discount(&found).await.unwrap();
    }

    fn with_code(code: &str) -> CheckoutRequest {
        CheckoutRequest { discount_code: Some(code.into()), ..card_request() }
    }

    #[tokio::test]
    async fn test_usage_limit_enforced_at_checkout() {
        let m = market();
        limit_code(&m, "WELCOME10", 1).await;
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
        m.add_to_cart(first, product_id(4), None).await.unwrap();
        m.add_to_cart(second, product_id(4), None).await.unwrap();
        m.place_order(first, with_code("WELCOME10")).await.unwrap();
        assert!(matches!(m.place_order(second, with_code("WELCOME10")).await, Err(MarketError::CodeUnavailable)));
        assert_eq!(m.cart(second).await.unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_respect_usage_limit() {
        use crate::payment::MockGateway;
        use crate::publisher::EventBus;
        use crate::store::MemoryStore;
        use std::sync::Arc;
        use std::time::Duration;

        let m = Marketplace::new(
            Arc::new(MemoryStore::seeded()),
            EventBus::disconnected(),
            Arc::new(MockGateway::new(Duration::from_millis(20), 1.0)),
        );
        limit_code(&m, "WELCOME10", 1).await;
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        m.add_to_cart(a, product_id(4), None).await.unwrap();
        m.add_to_cart(b, product_id(4), None).await.unwrap();

        let (ra, rb) = tokio::join!(m.place_order(a, with_code("WELCOME10")), m.place_order(b, with_code("WELCOME10")));
        let placed = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
        assert_eq!(placed, 1);
        assert!([&ra, &rb].iter().any(|r| matches!(r, Err(MarketError::CodeUnavailable))));
        let code = m.store.discount_by_code("WELCOME10").await.unwrap().unwrap();
        assert_eq!(code.usage_count, 1);
        let orders = m.store.orders_for_user(a).await.unwrap().len() + m.store.orders_for_user(b).await.unwrap().len();
        assert_eq!(orders, 1);
    }

    #[tokio::test]
    async fn test_out_of_window_codes_rejected_at_checkout() {
        use crate::domain::aggregates::{DiscountCode, DiscountCodeForm, DiscountKind};
        use chrono::Duration;
        use rust_decimal::Decimal;

        let m = market();
        let now = Utc::now();
        let code = |text: &str, from: chrono::DateTime<Utc>, until: Option<chrono::DateTime<Utc>>| DiscountCode::create(DiscountCodeForm {
            code: text.into(), kind: Some(DiscountKind::Fixed), value: Decimal::from(100), valid_from: Some(from), valid_until: until,
            is_active: true, ..Default::default()
        });
        m.store.insert_discount(&code("EIDOVER", now - Duration::days(10), Some(now - Duration::days(1)))).await.unwrap();
        m.store.insert_discount(&code("AZADI", now + Duration::days(3), None)).await.unwrap();

        let user = Uuid::new_v4();
        m.add_to_cart(user, product_id(4), None).await.unwrap();
        assert!(matches!(m.place_order(user, with_code("eidover")).await, Err(MarketError::CodeUnavailable)));
        assert!(matches!(m.place_order(user, with_code("AZADI")).await, Err(MarketError::CodeUnavailable)));
        assert!(m.store.orders_for_user(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quote() {
        let m = market();
        let user = Uuid::new_v4();
        m.add_to_cart(user, product_id(4), Some(1)).await.unwrap();
        let err = m.quote(user, QuoteRequest { discount_code: Some("PAKISTAN20".into()), donation: None }).await.unwrap_err();
        assert!(matches!(err, MarketError::MinimumNotMet(_)));
        let q = m.quote(user, QuoteRequest { discount_code: Some("WELCOME10".into()), donation: Some(Money::from_major(100)) }).await.unwrap();
        assert_eq!(q.totals.total, Money::from_major(3250));
        assert_eq!(q.donation_presets.len(), 4);
        assert!(matches!(m.quote(user, QuoteRequest { discount_code: Some("NOPE".into()), donation: None }).await, Err(MarketError::InvalidCode)));
    }
}
