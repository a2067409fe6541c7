//! Charity Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::Money;
use crate::forms::not_blank;

pub const CHARITY_CATEGORIES: [&str; 8] = [
    "Healthcare", "Education", "Social Welfare", "Environment", "Housing", "Emergency", "Animal Welfare", "Other",
];

/// Checkout add-on amounts offered as one-tap buttons.
pub const DONATION_PRESETS: [i64; 4] = [100, 200, 500, 1000];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus { #[default] Pending, Verified, Rejected }

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Verified => "verified", Self::Rejected => "rejected" }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s { "pending" => Some(Self::Pending), "verified" => Some(Self::Verified), "rejected" => Some(Self::Rejected), _ => None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Charity {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub target_amount: Option<Money>,
    pub raised_amount: Money,
    pub is_active: bool,
    pub verification_status: VerificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct CharityForm {
    #[validate(custom = "not_blank")]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom = "not_blank")]
    pub category: String,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub target_amount: Option<Money>,
    #[serde(default = "active")]
    pub is_active: bool,
    pub verification_status: Option<VerificationStatus>,
}

fn active() -> bool { true }

impl CharityForm {
    pub fn extra_checks(&self) -> [(&'static str, bool); 2] {
        [
            ("category", self.category.is_empty() || CHARITY_CATEGORIES.contains(&self.category.as_str())),
            ("target_amount", self.target_amount.map_or(true, |t| !t.is_negative())),
        ]
    }
}

impl Charity {
    pub fn create(form: CharityForm) -> Self {
        let now = Utc::now();
        let mut charity = Self {
            id: Uuid::now_v7(), name: String::new(), description: None, category: String::new(), logo_url: None,
            website_url: None, contact_email: None, contact_phone: None, address: None, city: None, province: None,
            target_amount: None, raised_amount: Money::zero(), is_active: true, verification_status: VerificationStatus::Pending,
            created_at: now, updated_at: now,
        };
        charity.apply(form);
        charity
    }

    pub fn apply(&mut self, form: CharityForm) {
        self.name = form.name.trim().to_string();
        self.description = form.description;
        self.category = form.category;
        self.logo_url = form.logo_url;
        self.website_url = form.website_url;
        self.contact_email = form.contact_email;
        self.contact_phone = form.contact_phone;
        self.address = form.address;
        self.city = form.city;
        self.province = form.province;
        self.target_amount = form.target_amount;
        self.is_active = form.is_active;
        if let Some(status) = form.verification_status { self.verification_status = status; }
        self.updated_at = Utc::now();
    }

    /// Funding progress in percent, capped at 100; 0 without a target.
    pub fn progress_percentage(&self) -> f64 {
        let Some(target) = self.target_amount.filter(|t| !t.is_zero() && !t.is_negative()) else { return 0.0 };
        let pct = (self.raised_amount.amount() / target.amount() * Decimal::ONE_HUNDRED).min(Decimal::ONE_HUNDRED).round_dp(1);
        pct.to_f64().unwrap_or(0.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharityDonationStatus { Pending, #[default] Completed, Failed }

impl CharityDonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Completed => "completed", Self::Failed => "failed" }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s { "pending" => Some(Self::Pending), "completed" => Some(Self::Completed), "failed" => Some(Self::Failed), _ => None }
    }
}

/// Money given to a charity, usually as a checkout add-on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharityDonation {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub charity_id: Uuid,
    pub order_id: Option<Uuid>,
    pub amount: Money,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub status: CharityDonationStatus,
    pub anonymous: bool,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CharityListing {
    #[serde(flatten)]
    pub charity: Charity,
    pub progress_percentage: f64,
}

impl From<Charity> for CharityListing {
    fn from(charity: Charity) -> Self {
        Self { progress_percentage: charity.progress_percentage(), charity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> CharityForm {
        CharityForm { name: "Edhi Foundation".into(), category: "Social Welfare".into(), is_active: true, ..Default::default() }
    }

    #[test]
    fn test_progress() {
        let mut c = Charity::create(CharityForm { target_amount: Some(Money::from_major(1000)), ..form() });
        assert_eq!(c.progress_percentage(), 0.0);
        c.raised_amount = Money::from_major(250);
        assert_eq!(c.progress_percentage(), 25.0);
        c.raised_amount = Money::from_major(5000);
        assert_eq!(c.progress_percentage(), 100.0);
        c.target_amount = None;
        assert_eq!(c.progress_percentage(), 0.0);
    }

    #[test]
    fn test_form_checks() {
        assert!(form().validate().is_ok());
        let bad = CharityForm { category: "Sports".into(), ..form() };
        assert!(bad.extra_checks().iter().any(|(f, ok)| *f == "category" && !ok));
    }
}
