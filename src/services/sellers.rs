use uuid::Uuid;

use super::Marketplace;
use crate::domain::aggregates::{Seller, SellerProfilePatch, SellerRegistration};
use crate::domain::events::{DomainEvent, SellerEvent};
use crate::error::{MarketError, Result};
use crate::forms;

impl Marketplace {
    /// `account_email` comes from the token; the form's email is only a fallback.
    pub async fn register_seller(&self, user_id: Uuid, account_email: Option<&str>, form: SellerRegistration) -> Result<Seller> {
        forms::require(&form, &[("agreed_to_terms", form.agreed_to_terms)])?;
        if self.store.seller(user_id).await?.is_some() {
            return Err(MarketError::Conflict("A seller account already exists for this user".into()));
        }
        let email = account_email.map(str::to_string).or_else(|| form.email.clone()).unwrap_or_default();
        let seller = Seller::register(user_id, email, form);
        self.store.insert_seller(&seller).await?;
        tracing::info!(seller_id = %seller.id, business = %seller.business_name, "seller registered");
        self.events.publish(DomainEvent::Seller(SellerEvent::Registered { seller_id: seller.id, business_name: seller.business_name.clone() })).await;
        Ok(seller)
    }

    pub async fn seller_profile(&self, user_id: Uuid) -> Result<Seller> {
        self.require_seller(user_id).await
    }

    pub async fn update_seller_profile(&self, user_id: Uuid, patch: SellerProfilePatch) -> Result<Seller> {
        let mut seller = self.require_seller(user_id).await?;
        seller.apply_profile(patch);
        self.store.update_seller(&seller).await?;
        Ok(seller)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::market;
    use super::*;
    use crate::store::DEMO_SELLER_ID;

    fn form() -> SellerRegistration {
        SellerRegistration {
            email: None, full_name: "Sana Malik".into(), business_name: "Lahore Looms".into(), phone: "03211234567".into(),
            address: "14 Liberty Market".into(), city: "Lahore".into(), business_type: "Fashion & Apparel".into(),
            tax_id: "NTN-7654321-0".into(), agreed_to_terms: true,
        }
    }

    #[tokio::test]
    async fn test_register_once() {
        let m = market();
        let user = Uuid::new_v4();
        let seller = m.register_seller(user, Some("sana@example.com"), form()).await.unwrap();
        assert_eq!(seller.id, user);
        assert_eq!(seller.email, "sana@example.com");
        assert!(!seller.is_verified);
        assert!(matches!(m.register_seller(user, None, form()).await, Err(MarketError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_reports_all_missing() {
        let m = market();
        let bad = SellerRegistration { phone: String::new(), city: " ".into(), agreed_to_terms: false, ..form() };
        let err = m.register_seller(Uuid::new_v4(), None, bad).await.unwrap_err();
        assert_eq!(err.to_string(), "Please fill in: agreed_to_terms, city, phone");
    }

    #[tokio::test]
    async fn test_profile_update() {
        let m = market();
        assert!(matches!(m.seller_profile(Uuid::new_v4()).await, Err(MarketError::NotASeller)));
        let patch = SellerProfilePatch { city: Some("Islamabad".into()), phone: Some("  ".into()), ..Default::default() };
        let updated = m.update_seller_profile(DEMO_SELLER_ID, patch).await.unwrap();
        assert_eq!(updated.city, "Islamabad");
        assert_eq!(updated.phone, "+92-300-1234567");
        assert_eq!(m.seller_profile(DEMO_SELLER_ID).await.unwrap().city, "Islamabad");
    }
}
