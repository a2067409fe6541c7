//! Discount, donation and checkout-total arithmetic

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::charity::DONATION_PRESETS;
use crate::domain::aggregates::discount::{normalize_code, DiscountCode, DiscountCodeForm, DiscountKind, DiscountRejection};
use crate::domain::value_objects::Money;
use crate::error::{MarketError, Result};

/// A code that passed every check, with what it takes off.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AppliedDiscount {
    pub code_id: Uuid,
    pub code: String,
    pub description: String,
    pub amount: Money,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CheckoutTotals {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub discount: Money,
    pub donation: Money,
    pub total: Money,
    pub total_display: String,
}

/// Checks `code` (looked up by its normalised text) against the cart subtotal.
pub fn apply_code(code: Option<&DiscountCode>, subtotal: Money, now: DateTime<Utc>) -> Result<AppliedDiscount> {
    let code = code.ok_or(MarketError::InvalidCode)?;
    match code.evaluate(subtotal, now) {
        Ok(amount) => Ok(AppliedDiscount { code_id: code.id, code: code.code.clone(), description: code.headline(), amount }),
        Err(DiscountRejection::Inactive) => Err(MarketError::InvalidCode),
        Err(DiscountRejection::MinimumNotMet(min)) => Err(MarketError::MinimumNotMet(min)),
        Err(DiscountRejection::NotYetValid | DiscountRejection::Expired | DiscountRejection::UsageLimitReached) => Err(MarketError::CodeUnavailable),
    }
}

/// Donation add-on; any non-negative amount, not only the presets.
pub fn validate_donation(amount: Option<Money>) -> Result<Money> {
    match amount {
        Some(a) if a.is_negative() => Err(MarketError::Validation("Donation amount cannot be negative".into())),
        Some(a) => Ok(a),
        None => Ok(Money::zero()),
    }
}

pub fn donation_presets() -> Vec<Money> { DONATION_PRESETS.iter().map(|p| Money::from_major(*p)).collect() }

pub fn checkout_total(subtotal: Money, discount: Money, donation: Money) -> Money {
    subtotal.sub(discount).add(donation).clamp_non_negative()
}

pub fn totals(subtotal: Money, discount: Option<&AppliedDiscount>, donation: Money) -> CheckoutTotals {
    let discount = discount.map(|d| d.amount).unwrap_or_default();
    let total = checkout_total(subtotal, discount, donation);
    CheckoutTotals { subtotal, delivery_fee: Money::zero(), discount, donation, total, total_display: total.display() }
}

/// Launch promotions every fresh store starts with.
pub fn seed_codes() -> Vec<DiscountCode> {
    let seed = |code: &str, kind, value: i64, min: i64, description: &str| {
        DiscountCode::create(DiscountCodeForm {
            code: normalize_code(code), kind: Some(kind), value: Decimal::from(value), min_amount: Money::from_major(min),
            description: Some(description.to_string()), is_active: true,
            ..Default::default()
        })
    };
    vec![
        seed("WELCOME10", DiscountKind::Percentage, 10, 1000, "10% off for new customers"),
        seed("FREESHIP", DiscountKind::Fixed, 500, 2000, "Rs. 500 off on orders above Rs. 2000"),
        seed("PAKISTAN20", DiscountKind::Percentage, 20, 5000, "20% off on orders above Rs. 5000"),
        seed("FLASH50", DiscountKind::Fixed, 1000, 3000, "Rs. 1000 off flash sale"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(code: &str) -> DiscountCode {
        let mut found = seed_codes().into_iter().find(|c| c.code == code).unwrap();
        found.valid_from = Utc::now() - chrono::Duration::hours(1);
        found
    }

    #[test]
    fn test_seeded_codes() {
        let now = Utc::now();
        let welcome = apply_code(Some(&seeded("WELCOME10")), Money::from_major(2500), now).unwrap();
        assert_eq!(welcome.amount, Money::from_major(250));
        let flash = apply_code(Some(&seeded("FLASH50")), Money::from_major(3000), now).unwrap();
        assert_eq!(flash.amount, Money::from_major(1000));
        let err = apply_code(Some(&seeded("PAKISTAN20")), Money::from_major(4000), now).unwrap_err();
        assert_eq!(err.to_string(), "This code requires a minimum order of Rs. 5,000.");
    }

    #[test]
    fn test_unknown_and_unavailable() {
        let now = Utc::now();
        assert!(matches!(apply_code(None, Money::from_major(5000), now), Err(MarketError::InvalidCode)));
        let mut code = seeded("FREESHIP");
        code.usage_limit = Some(1);
        code.usage_count = 1;
        assert!(matches!(apply_code(Some(&code), Money::from_major(5000), now), Err(MarketError::CodeUnavailable)));
        code.is_active = false;
        assert!(matches!(apply_code(Some(&code), Money::from_major(5000), now), Err(MarketError::InvalidCode)));
    }

    #[test]
    fn test_max_discount_caps_percentage() {
        let mut code = seeded("PAKISTAN20");
        code.max_discount = Some(Money::from_major(1500));
        let capped = apply_code(Some(&code), Money::from_major(20000), Utc::now()).unwrap();
        assert_eq!(capped.amount, Money::from_major(1500));
        let under_cap = apply_code(Some(&code), Money::from_major(6000), Utc::now()).unwrap();
        assert_eq!(under_cap.amount, Money::from_major(1200));
        let t = totals(Money::from_major(20000), Some(&capped), Money::zero());
        assert_eq!(t.total, Money::from_major(18500));
    }

    #[test]
    fn test_validity_window() {
        let now = Utc::now();
        let mut code = seeded("FLASH50");
        code.valid_until = Some(now - chrono::Duration::minutes(1));
        assert!(matches!(apply_code(Some(&code), Money::from_major(5000), now), Err(MarketError::CodeUnavailable)));
        code.valid_until = None;
        code.valid_from = now + chrono::Duration::days(1);
        assert!(matches!(apply_code(Some(&code), Money::from_major(5000), now), Err(MarketError::CodeUnavailable)));
    }

    #[test]
    fn test_total_never_negative() {
        assert_eq!(checkout_total(Money::from_major(1000), Money::from_major(1500), Money::zero()), Money::zero());
        assert_eq!(checkout_total(Money::from_major(5000), Money::from_major(1000), Money::from_major(200)), Money::from_major(4200));
    }

    #[test]
    fn test_donation() {
        assert_eq!(validate_donation(None).unwrap(), Money::zero());
        assert_eq!(validate_donation(Some(Money::from_major(350))).unwrap(), Money::from_major(350));
        assert!(validate_donation(Some(Money::from_major(-1))).is_err());
        assert_eq!(donation_presets().len(), 4);
    }

    #[test]
    fn test_totals_view() {
        let applied = apply_code(Some(&seeded("WELCOME10")), Money::from_major(12500), Utc::now()).unwrap();
        let t = totals(Money::from_major(12500), Some(&applied), Money::from_major(100));
        assert_eq!(t.discount, Money::from_major(1250));
        assert_eq!(t.total, Money::from_major(11350));
        assert_eq!(t.total_display, "Rs. 11,350");
    }
}
