//! Seller Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::forms::not_blank;

pub const BUSINESS_TYPES: [&str; 10] = [
    "Electronics", "Fashion & Apparel", "Home & Garden", "Sports & Fitness", "Books & Education",
    "Health & Beauty", "Automotive", "Food & Beverages", "Toys & Games", "Other",
];

pub const CITIES: [&str; 11] = [
    "Karachi", "Lahore", "Islamabad", "Rawalpindi", "Faisalabad", "Multan", "Peshawar", "Quetta", "Sialkot", "Gujranwala", "Other",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub business_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub business_type: String,
    pub tax_id: String,
    pub is_verified: bool,
    pub preferences: StorePreferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Store options that are not part of the business profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorePreferences {
    pub description: String,
    pub auto_fulfill: bool,
    pub email_notifications: bool,
    pub low_stock_alerts: bool,
    pub commission_rate: Decimal,
    pub shipping_zones: Vec<String>,
    pub return_policy: String,
}

impl Default for StorePreferences {
    fn default() -> Self {
        Self {
            description: String::new(), auto_fulfill: false, email_notifications: true, low_stock_alerts: true,
            commission_rate: Decimal::from(15), shipping_zones: vec!["Pakistan".to_string()],
            return_policy: "30-day return policy".to_string(),
        }
    }
}

/// The dashboard's settings tab.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoreSettings {
    pub business_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub business_type: String,
    #[serde(flatten)]
    pub preferences: StorePreferences,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct StoreSettingsPatch {
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub business_type: Option<String>,
    pub description: Option<String>,
    pub auto_fulfill: Option<bool>,
    pub email_notifications: Option<bool>,
    pub low_stock_alerts: Option<bool>,
    pub commission_rate: Option<Decimal>,
    pub shipping_zones: Option<Vec<String>>,
    pub return_policy: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct SellerRegistration {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom = "not_blank")]
    pub full_name: String,
    #[validate(custom = "not_blank")]
    pub business_name: String,
    #[validate(custom = "not_blank")]
    pub phone: String,
    #[validate(custom = "not_blank")]
    pub address: String,
    #[validate(custom = "not_blank")]
    pub city: String,
    #[validate(custom = "not_blank")]
    pub business_type: String,
    #[validate(custom = "not_blank")]
    pub tax_id: String,
    #[serde(default)]
    pub agreed_to_terms: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SellerProfilePatch {
    pub full_name: Option<String>,
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub business_type: Option<String>,
    pub tax_id: Option<String>,
}

impl Seller {
    /// The seller record shares its id with the signed-in user.
    pub fn register(user_id: Uuid, email: String, form: SellerRegistration) -> Self {
        let now = Utc::now();
        Self {
            id: user_id, email, full_name: form.full_name.trim().into(), business_name: form.business_name.trim().into(),
            phone: form.phone.trim().into(), address: form.address.trim().into(), city: form.city, business_type: form.business_type,
            tax_id: form.tax_id.trim().into(), is_verified: false, preferences: StorePreferences::default(), created_at: now, updated_at: now,
        }
    }

    pub fn settings(&self) -> StoreSettings {
        StoreSettings {
            business_name: self.business_name.clone(), phone: self.phone.clone(), address: self.address.clone(),
            city: self.city.clone(), business_type: self.business_type.clone(), preferences: self.preferences.clone(),
        }
    }

    pub fn apply_profile(&mut self, patch: SellerProfilePatch) {
        fn set(field: &mut String, value: Option<String>) {
            if let Some(v) = value.filter(|v| !v.trim().is_empty()) { *field = v.trim().to_string(); }
        }
        set(&mut self.full_name, patch.full_name);
        set(&mut self.business_name, patch.business_name);
        set(&mut self.phone, patch.phone);
        set(&mut self.address, patch.address);
        set(&mut self.city, patch.city);
        set(&mut self.business_type, patch.business_type);
        set(&mut self.tax_id, patch.tax_id);
        self.updated_at = Utc::now();
    }

    pub fn apply_settings(&mut self, patch: StoreSettingsPatch) {
        self.apply_profile(SellerProfilePatch {
            business_name: patch.business_name, phone: patch.phone, address: patch.address, city: patch.city,
            business_type: patch.business_type, ..Default::default()
        });
        let prefs = &mut self.preferences;
        if let Some(v) = patch.description { prefs.description = v; }
        if let Some(v) = patch.auto_fulfill { prefs.auto_fulfill = v; }
        if let Some(v) = patch.email_notifications { prefs.email_notifications = v; }
        if let Some(v) = patch.low_stock_alerts { prefs.low_stock_alerts = v; }
        if let Some(v) = patch.commission_rate { prefs.commission_rate = v; }
        if let Some(v) = patch.shipping_zones { prefs.shipping_zones = v; }
        if let Some(v) = patch.return_policy { prefs.return_policy = v; }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> SellerRegistration {
        SellerRegistration {
            email: Some("seller@example.com".into()), full_name: "Ahmed Khan".into(), business_name: "TechHub Pakistan".into(),
            phone: "+92-300-1234567".into(), address: "123 Main Street".into(), city: "Karachi".into(),
            business_type: "Electronics".into(), tax_id: "NTN-1234567-8".into(), agreed_to_terms: true,
        }
    }

    #[test]
    fn test_registration_validation() {
        assert!(form().validate().is_ok());
        let bad = SellerRegistration { full_name: " ".into(), tax_id: String::new(), ..form() };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("full_name"));
        assert!(fields.contains_key("tax_id"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_default_settings() {
        let seller = Seller::register(Uuid::new_v4(), "s@example.com".into(), form());
        let settings = seller.settings();
        assert_eq!(settings.preferences.commission_rate, Decimal::from(15));
        assert_eq!(settings.preferences.shipping_zones, vec!["Pakistan".to_string()]);
        assert!(settings.preferences.email_notifications);
        assert!(!settings.preferences.auto_fulfill);
    }

    #[test]
    fn test_settings_patch() {
        let mut seller = Seller::register(Uuid::new_v4(), "s@example.com".into(), form());
        seller.apply_settings(StoreSettingsPatch { city: Some("Lahore".into()), auto_fulfill: Some(true), ..Default::default() });
        assert_eq!(seller.city, "Lahore");
        assert!(seller.preferences.auto_fulfill);
        assert_eq!(seller.business_name, "TechHub Pakistan");
    }
}
