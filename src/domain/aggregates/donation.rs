//! Goods donation Aggregate

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::events::{DomainEvent, DonationEvent};
use crate::domain::value_objects::Money;
use crate::forms::not_blank;

pub const DONATION_CATEGORIES: [&str; 10] = [
    "Electronics", "Fashion", "Home & Garden", "Sports", "Books", "Toys & Games", "Baby & Kids", "Health & Beauty", "Automotive", "Other",
];

pub const DONATION_CONDITIONS: [&str; 6] = ["Brand New", "Like New", "Excellent", "Good", "Fair", "Needs Repair"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus { #[default] Pending, Approved, Rejected, PickedUp, Completed }

impl DonationStatus {
    pub const ALL: [DonationStatus; 5] = [Self::Pending, Self::Approved, Self::Rejected, Self::PickedUp, Self::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending", Self::Approved => "approved", Self::Rejected => "rejected",
            Self::PickedUp => "picked_up", Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> { Self::ALL.into_iter().find(|st| st.as_str() == s) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoodsDonation {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub product_name: String,
    pub description: Option<String>,
    pub condition: String,
    pub category: String,
    pub estimated_value: Money,
    pub quantity: u32,
    pub donor_name: String,
    pub donor_email: String,
    pub donor_phone: String,
    pub pickup_address: String,
    pub pickup_city: String,
    pub preferred_pickup_date: Option<NaiveDate>,
    pub additional_notes: Option<String>,
    pub image_urls: Vec<String>,
    pub status: DonationStatus,
    pub admin_notes: Option<String>,
    pub pickup_date: Option<NaiveDate>,
    pub pickup_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct DonationForm {
    #[validate(custom = "not_blank")]
    pub product_name: String,
    pub description: Option<String>,
    #[validate(custom = "not_blank")]
    pub condition: String,
    #[validate(custom = "not_blank")]
    pub category: String,
    #[serde(default)]
    pub estimated_value: Money,
    #[serde(default = "one")]
    #[validate(range(min = 1))]
    pub quantity: i64,
    #[validate(custom = "not_blank")]
    pub donor_name: String,
    #[validate(email)]
    pub donor_email: String,
    #[validate(custom = "not_blank")]
    pub donor_phone: String,
    #[validate(custom = "not_blank")]
    pub pickup_address: String,
    #[validate(custom = "not_blank")]
    pub pickup_city: String,
    pub preferred_pickup_date: Option<NaiveDate>,
    pub additional_notes: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

fn one() -> i64 { 1 }

impl DonationForm {
    /// Checks the form cannot express through the derive.
    pub fn extra_checks(&self) -> [(&'static str, bool); 3] {
        [
            ("condition", self.condition.is_empty() || DONATION_CONDITIONS.contains(&self.condition.as_str())),
            ("category", self.category.is_empty() || DONATION_CATEGORIES.contains(&self.category.as_str())),
            ("estimated_value", !self.estimated_value.is_negative()),
        ]
    }
}

impl GoodsDonation {
    pub fn submit(donor_id: Uuid, form: DonationForm) -> (Self, DomainEvent) {
        let now = Utc::now();
        let donation = Self {
            id: Uuid::now_v7(), donor_id, product_name: form.product_name.trim().into(), description: form.description,
            condition: form.condition, category: form.category, estimated_value: form.estimated_value,
            quantity: form.quantity.clamp(1, u32::MAX as i64) as u32, donor_name: form.donor_name.trim().into(),
            donor_email: form.donor_email.trim().into(), donor_phone: form.donor_phone.trim().into(),
            pickup_address: form.pickup_address.trim().into(), pickup_city: form.pickup_city.trim().into(),
            preferred_pickup_date: form.preferred_pickup_date, additional_notes: form.additional_notes, image_urls: form.image_urls,
            status: DonationStatus::Pending, admin_notes: None, pickup_date: None, pickup_time: None, created_at: now, updated_at: now,
        };
        let event = DomainEvent::Donation(DonationEvent::GoodsSubmitted { donation_id: donation.id, donor_id, category: donation.category.clone() });
        (donation, event)
    }

    pub fn set_status(&mut self, status: DonationStatus, admin_notes: Option<String>) -> DomainEvent {
        self.status = status;
        if let Some(notes) = admin_notes.filter(|n| !n.is_empty()) { self.admin_notes = Some(notes); }
        self.updated_at = Utc::now();
        DomainEvent::Donation(DonationEvent::GoodsStatusChanged { donation_id: self.id, status })
    }

    /// Booking a pickup slot approves the donation.
    pub fn schedule_pickup(&mut self, date: NaiveDate, time: String) -> DomainEvent {
        self.pickup_date = Some(date);
        self.pickup_time = Some(time);
        self.set_status(DonationStatus::Approved, None)
    }

    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.product_name.to_lowercase().contains(&term)
            || self.description.as_deref().is_some_and(|d| d.to_lowercase().contains(&term))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DonationStats {
    pub total_donations: usize,
    pub pending_donations: usize,
    pub approved_donations: usize,
    pub rejected_donations: usize,
    pub picked_up_donations: usize,
    pub completed_donations: usize,
    pub total_estimated_value: Money,
    pub avg_estimated_value: Money,
}

impl DonationStats {
    pub fn compute(donations: &[GoodsDonation]) -> Self {
        let count = |s: DonationStatus| donations.iter().filter(|d| d.status == s).count();
        let total: Money = donations.iter().map(|d| d.estimated_value).sum();
        let avg = if donations.is_empty() {
            Money::zero()
        } else {
            Money::new((total.amount() / rust_decimal::Decimal::from(donations.len() as u64)).round_dp(2))
        };
        Self {
            total_donations: donations.len(),
            pending_donations: count(DonationStatus::Pending),
            approved_donations: count(DonationStatus::Approved),
            rejected_donations: count(DonationStatus::Rejected),
            picked_up_donations: count(DonationStatus::PickedUp),
            completed_donations: count(DonationStatus::Completed),
            total_estimated_value: total,
            avg_estimated_value: avg,
        }
    }
}
