use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::Marketplace;
use crate::domain::aggregates::{DonationForm, DonationStats, DonationStatus, GoodsDonation};
use crate::error::{MarketError, Result};
use crate::forms;
use crate::store::DonationFilter;

/// Query string of the public donations page.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DonationBrowse {
    pub search: Option<String>,
    pub category: Option<String>,
    pub condition: Option<String>,
}

/// "All Categories", "All Conditions" and blanks mean no filter.
fn selected(choice: Option<&str>) -> Option<&str> {
    choice.map(str::trim).filter(|c| !c.is_empty() && !c.starts_with("All "))
}

#[derive(Clone, Debug, Deserialize)]
pub struct DonationStatusUpdate {
    pub status: DonationStatus,
    pub admin_notes: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PickupSlot {
    pub pickup_date: NaiveDate,
    pub pickup_time: String,
}

impl Marketplace {
    pub async fn submit_donation(&self, donor_id: Uuid, form: DonationForm) -> Result<GoodsDonation> {
        forms::require(&form, &form.extra_checks())?;
        let (donation, event) = GoodsDonation::submit(donor_id, form);
        self.store.insert_donation(&donation).await?;
        tracing::info!(donation_id = %donation.id, %donor_id, category = %donation.category, "donation submitted");
        self.events.publish(event).await;
        Ok(donation)
    }

    /// Pending donations anyone can see, newest first.
    pub async fn browse_donations(&self, query: DonationBrowse) -> Result<Vec<GoodsDonation>> {
        let filter = DonationFilter {
            status: Some(DonationStatus::Pending),
            category: selected(query.category.as_deref()).map(str::to_string),
            ..Default::default()
        };
        let condition = selected(query.condition.as_deref());
        let search = query.search.unwrap_or_default();
        Ok(self
            .store
            .list_donations(filter)
            .await?
            .into_iter()
            .filter(|d| condition.map_or(true, |c| d.condition == c) && d.matches_search(&search))
            .collect())
    }

    pub async fn my_donations(&self, donor_id: Uuid) -> Result<Vec<GoodsDonation>> {
        self.store.list_donations(DonationFilter { donor_id: Some(donor_id), ..Default::default() }).await
    }

    /// The thank-you page; only the donor may see it.
    pub async fn donation_confirmation(&self, donor_id: Uuid, id: Uuid) -> Result<GoodsDonation> {
        self.store.donation(id).await?.filter(|d| d.donor_id == donor_id).ok_or(MarketError::DonationNotFound)
    }

    pub async fn all_donations(&self, staff_id: Uuid) -> Result<Vec<GoodsDonation>> {
        self.require_seller(staff_id).await?;
        self.store.list_donations(DonationFilter::default()).await
    }

    pub async fn donations_by_status(&self, staff_id: Uuid, status: DonationStatus) -> Result<Vec<GoodsDonation>> {
        self.require_seller(staff_id).await?;
        self.store.list_donations(DonationFilter { status: Some(status), ..Default::default() }).await
    }

    pub async fn donations_by_category(&self, staff_id: Uuid, category: &str) -> Result<Vec<GoodsDonation>> {
        self.require_seller(staff_id).await?;
        self.store.list_donations(DonationFilter { category: Some(category.to_string()), ..Default::default() }).await
    }

    pub async fn donation_stats(&self, staff_id: Uuid) -> Result<DonationStats> {
        Ok(DonationStats::compute(&self.all_donations(staff_id).await?))
    }

    async fn staff_donation(&self, staff_id: Uuid, id: Uuid) -> Result<GoodsDonation> {
        self.require_seller(staff_id).await?;
        self.store.donation(id).await?.ok_or(MarketError::DonationNotFound)
    }

    pub async fn update_donation_status(&self, staff_id: Uuid, id: Uuid, update: DonationStatusUpdate) -> Result<GoodsDonation> {
        let mut donation = self.staff_donation(staff_id, id).await?;
        let event = donation.set_status(update.status, update.admin_notes);
        self.store.update_donation(&donation).await?;
        tracing::info!(donation_id = %id, status = update.status.as_str(), "donation status updated");
        self.events.publish(event).await;
        Ok(donation)
    }

    pub async fn schedule_pickup(&self, staff_id: Uuid, id: Uuid, slot: PickupSlot) -> Result<GoodsDonation> {
        let time = slot.pickup_time.trim().to_string();
        if time.is_empty() {
            return Err(MarketError::MissingFields(vec!["pickup_time".into()]));
        }
        let mut donation = self.staff_donation(staff_id, id).await?;
        let event = donation.schedule_pickup(slot.pickup_date, time);
        self.store.update_donation(&donation).await?;
        tracing::info!(donation_id = %id, date = %slot.pickup_date, "pickup scheduled");
        self.events.publish(event).await;
        Ok(donation)
    }

    pub async fn delete_donation(&self, staff_id: Uuid, id: Uuid) -> Result<()> {
        self.require_seller(staff_id).await?;
        if !self.store.delete_donation(id).await? {
            return Err(MarketError::DonationNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::market;
    use super::*;
    use crate::domain::value_objects::Money;
    use crate::store::DEMO_SELLER_ID;

    fn form(name: &str, category: &str, condition: &str) -> DonationForm {
        DonationForm {
            product_name: name.into(), description: Some("Gently used".into()), condition: condition.into(), category: category.into(),
            estimated_value: Money::from_major(2000), quantity: 1, donor_name: "Ayesha".into(), donor_email: "ayesha@example.com".into(),
            donor_phone: "03331234567".into(), pickup_address: "Flat 4, Block B".into(), pickup_city: "Karachi".into(), ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submit_and_browse() {
        let m = market();
        let donor = Uuid::new_v4();
        m.submit_donation(donor, form("School books", "Books", "Good")).await.unwrap();
        let jacket = m.submit_donation(donor, form("Leather jacket", "Fashion", "Like New")).await.unwrap();

        let all = m.browse_donations(DonationBrowse::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        let query = DonationBrowse { category: Some("All Categories".into()), condition: Some("Like New".into()), search: None };
        assert_eq!(m.browse_donations(query).await.unwrap()[0].id, jacket.id);
        let query = DonationBrowse { search: Some("BOOKS".into()), ..Default::default() };
        assert_eq!(m.browse_donations(query).await.unwrap().len(), 1);

        m.update_donation_status(DEMO_SELLER_ID, jacket.id, DonationStatusUpdate { status: DonationStatus::Rejected, admin_notes: None })
            .await
            .unwrap();
        assert_eq!(m.browse_donations(DonationBrowse::default()).await.unwrap().len(), 1);
        assert_eq!(m.my_donations(donor).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let m = market();
        let bad = DonationForm { pickup_city: String::new(), condition: "Shiny".into(), ..form("Toy car", "Toys & Games", "") };
        let err = m.submit_donation(Uuid::new_v4(), bad).await.unwrap_err();
        assert_eq!(err.to_string(), "Please fill in: condition, pickup_city");
    }

    #[tokio::test]
    async fn test_staff_actions() {
        let m = market();
        let donor = Uuid::new_v4();
        let d = m.submit_donation(donor, form("Cricket bat", "Sports", "Excellent")).await.unwrap();
        assert!(matches!(m.donation_confirmation(Uuid::new_v4(), d.id).await, Err(MarketError::DonationNotFound)));
        assert!(matches!(m.all_donations(donor).await, Err(MarketError::NotASeller)));

        let slot = PickupSlot { pickup_date: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(), pickup_time: "14:00".into() };
        let scheduled = m.schedule_pickup(DEMO_SELLER_ID, d.id, slot).await.unwrap();
        assert_eq!(scheduled.status, DonationStatus::Approved);
        assert_eq!(m.donations_by_status(DEMO_SELLER_ID, DonationStatus::Approved).await.unwrap().len(), 1);
        assert_eq!(m.donations_by_category(DEMO_SELLER_ID, "Sports").await.unwrap().len(), 1);

        let stats = m.donation_stats(DEMO_SELLER_ID).await.unwrap();
        assert_eq!((stats.total_donations, stats.approved_donations), (1, 1));
        assert_eq!(stats.avg_estimated_value, Money::from_major(2000));

        m.delete_donation(DEMO_SELLER_ID, d.id).await.unwrap();
        assert!(matches!(m.delete_donation(DEMO_SELLER_ID, d.id).await, Err(MarketError::DonationNotFound)));
    }
}
