//! Discount code Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::Money;
use crate::forms::not_blank;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind { Percentage, Fixed }

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Percentage => "percentage", Self::Fixed => "fixed" }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s { "percentage" => Some(Self::Percentage), "fixed" => Some(Self::Fixed), _ => None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscountCode {
    pub id: Uuid,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: Decimal,
    pub min_amount: Money,
    pub max_discount: Option<Money>,
    pub description: Option<String>,
    pub is_active: bool,
    pub usage_limit: Option<u32>,
    pub usage_count: u32,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One redemption of a code against an order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscountUsage {
    pub id: Uuid,
    pub discount_code_id: Uuid,
    pub user_id: Uuid,
    pub order_id: Uuid,
    pub discount_amount: Money,
    pub used_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountRejection { Inactive, NotYetValid, Expired, UsageLimitReached, MinimumNotMet(Money) }

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct DiscountCodeForm {
    #[validate(custom = "not_blank")]
    pub code: String,
    #[serde(rename = "type")]
    pub kind: Option<DiscountKind>,
    pub value: Decimal,
    #[serde(default)]
    pub min_amount: Money,
    pub max_discount: Option<Money>,
    pub description: Option<String>,
    pub usage_limit: Option<u32>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn active() -> bool { true }

impl DiscountCodeForm {
    /// Fields that are absent rather than out of range.
    pub fn extra_checks(&self) -> [(&'static str, bool); 2] {
        [("type", self.kind.is_some()), ("value", self.value > Decimal::ZERO)]
    }

    /// First value that is present but out of range.
    pub fn range_error(&self) -> Option<&'static str> {
        if self.kind == Some(DiscountKind::Percentage) && self.value > Decimal::ONE_HUNDRED {
            return Some("Percentage discounts cannot exceed 100%");
        }
        if self.min_amount.is_negative() { return Some("Minimum order amount cannot be negative"); }
        if self.max_discount.is_some_and(|m| m.is_negative()) { return Some("Maximum discount cannot be negative"); }
        match (self.valid_from, self.valid_until) {
            (Some(from), Some(until)) if until <= from => Some("Valid until must be after valid from"),
            _ => None,
        }
    }
}

pub fn normalize_code(code: &str) -> String { code.trim().to_uppercase() }

impl DiscountCode {
    pub fn create(form: DiscountCodeForm) -> Self {
        let now = Utc::now();
        let mut code = Self {
            id: Uuid::now_v7(), code: String::new(), kind: DiscountKind::Percentage, value: Decimal::ZERO,
            min_amount: Money::zero(), max_discount: None, description: None, is_active: true, usage_limit: None,
            usage_count: 0, valid_from: now, valid_until: None, created_at: now, updated_at: now,
        };
        code.apply(form);
        code
    }

    pub fn apply(&mut self, form: DiscountCodeForm) {
        self.code = normalize_code(&form.code);
        if let Some(kind) = form.kind { self.kind = kind; }
        self.value = form.value;
        self.min_amount = form.min_amount;
        self.max_discount = form.max_discount;
        self.description = form.description;
        self.usage_limit = form.usage_limit;
        if let Some(from) = form.valid_from { self.valid_from = from; }
        self.valid_until = form.valid_until;
        self.is_active = form.is_active;
        self.updated_at = Utc::now();
    }

    pub fn is_available(&self, now: DateTime<Utc>) -> bool { self.availability(now).is_ok() }

    fn availability(&self, now: DateTime<Utc>) -> Result<(), DiscountRejection> {
        if !self.is_active { return Err(DiscountRejection::Inactive); }
        if now < self.valid_from { return Err(DiscountRejection::NotYetValid); }
        if self.valid_until.is_some_and(|until| now > until) { return Err(DiscountRejection::Expired); }
        if self.usage_limit.is_some_and(|limit| self.usage_count >= limit) { return Err(DiscountRejection::UsageLimitReached); }
        Ok(())
    }

    /// Amount taken off `subtotal`, or why the code does not apply.
    pub fn evaluate(&self, subtotal: Money, now: DateTime<Utc>) -> Result<Money, DiscountRejection> {
        self.availability(now)?;
        if subtotal < self.min_amount { return Err(DiscountRejection::MinimumNotMet(self.min_amount)); }
        let amount = match self.kind {
            DiscountKind::Percentage => subtotal.percent(self.value),
            DiscountKind::Fixed => Money::new(self.value),
        };
        Ok(match self.max_discount {
            Some(cap) => amount.min(cap),
            None => amount,
        })
    }

    /// One-line offer text for the storefront banner.
    pub fn headline(&self) -> String {
        if let Some(d) = self.description.as_deref().filter(|d| !d.is_empty()) { return d.to_string(); }
        match self.kind {
            DiscountKind::Percentage => format!("{}% off on orders above {}", self.value.normalize(), self.min_amount.display()),
            DiscountKind::Fixed => format!("{} off on orders above {}", Money::new(self.value).display(), self.min_amount.display()),
        }
    }
}

/// Public view of a code on the offers banner.
#[derive(Clone, Debug, Serialize)]
pub struct DiscountOffer {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: Decimal,
    pub min_amount: Money,
    pub description: String,
    pub usage_limit: Option<u32>,
    pub usage_count: u32,
    pub valid_until: Option<DateTime<Utc>>,
    pub days_until_expiry: Option<i64>,
    pub is_available: bool,
}

impl DiscountOffer {
    pub fn from_code(code: &DiscountCode, now: DateTime<Utc>) -> Self {
        Self {
            code: code.code.clone(), kind: code.kind, value: code.value, min_amount: code.min_amount, description: code.headline(),
            usage_limit: code.usage_limit, usage_count: code.usage_count, valid_until: code.valid_until,
            days_until_expiry: code.valid_until.map(|u| (u - now).num_days().max(0)),
            is_available: code.is_available(now),
        }
    }
}
