use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::Marketplace;
use crate::domain::aggregates::charity::CHARITY_CATEGORIES;
use crate::domain::aggregates::{Charity, CharityForm, CharityListing};
use crate::domain::value_objects::Money;
use crate::error::{MarketError, Result};
use crate::forms;

/// Rupees raised per hundred people reached.
const RUPEES_PER_HUNDRED_HELPED: i64 = 1000;
const RUPEES_PER_PROJECT: i64 = 50000;

/// Headline numbers for the donation impact banner.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImpactSummary {
    pub charities: usize,
    pub total_raised: Money,
    pub total_target: Money,
    pub progress_percentage: f64,
    pub people_helped: u64,
    pub projects_completed: u64,
}

pub fn impact_summary(charities: &[Charity]) -> ImpactSummary {
    let total_raised: Money = charities.iter().map(|c| c.raised_amount).sum();
    let total_target: Money = charities.iter().filter_map(|c| c.target_amount).sum();
    let per = |rupees: i64| (total_raised.amount() / Decimal::from(rupees)).floor().to_u64().unwrap_or(0);
    let progress_percentage = if total_target.is_zero() {
        0.0
    } else {
        (total_raised.amount() / total_target.amount() * Decimal::ONE_HUNDRED).min(Decimal::ONE_HUNDRED).round_dp(1).to_f64().unwrap_or(0.0)
    };
    ImpactSummary {
        charities: charities.len(),
        total_raised,
        total_target,
        progress_percentage,
        people_helped: per(RUPEES_PER_HUNDRED_HELPED) * 100,
        projects_completed: per(RUPEES_PER_PROJECT),
    }
}

fn check(form: &CharityForm) -> Result<()> {
    forms::require(form, &form.extra_checks())
}

impl Marketplace {
    /// Active charities for the checkout picker, optionally narrowed to one category.
    pub async fn charities(&self, category: Option<&str>) -> Result<Vec<CharityListing>> {
        let category = category.map(str::trim).filter(|c| !c.is_empty() && !c.starts_with("All"));
        Ok(self
            .store
            .list_charities(true)
            .await?
            .into_iter()
            .filter(|c| category.map_or(true, |cat| c.category == cat))
            .map(CharityListing::from)
            .collect())
    }

    pub async fn charity_impact(&self) -> Result<ImpactSummary> {
        Ok(impact_summary(&self.store.list_charities(true).await?))
    }

    pub fn charity_categories(&self) -> &'static [&'static str] { &CHARITY_CATEGORIES }

    /// Every charity, inactive ones included.
    pub async fn manage_charities(&self, seller_id: Uuid) -> Result<Vec<CharityListing>> {
        self.require_seller(seller_id).await?;
        Ok(self.store.list_charities(false).await?.into_iter().map(CharityListing::from).collect())
    }

    pub async fn create_charity(&self, seller_id: Uuid, form: CharityForm) -> Result<Charity> {
        self.require_seller(seller_id).await?;
        check(&form)?;
        let charity = Charity::create(form);
        self.store.insert_charity(&charity).await?;
        tracing::info!(charity_id = %charity.id, name = %charity.name, %seller_id, "charity added");
        Ok(charity)
    }

    pub async fn update_charity(&self, seller_id: Uuid, id: Uuid, form: CharityForm) -> Result<Charity> {
        self.require_seller(seller_id).await?;
        check(&form)?;
        let mut charity = self.store.charity(id).await?.ok_or(MarketError::CharityNotFound)?;
        charity.apply(form);
        self.store.update_charity(&charity).await?;
        Ok(charity)
    }

    pub async fn delete_charity(&self, seller_id: Uuid, id: Uuid) -> Result<()> {
        self.require_seller(seller_id).await?;
        if !self.store.delete_charity(id).await? {
            return Err(MarketError::CharityNotFound);
        }
        tracing::info!(charity_id = %id, %seller_id, "charity removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::market;
    use super::*;
    use crate::store::DEMO_SELLER_ID;

    fn form(name: &str) -> CharityForm {
        CharityForm { name: name.into(), category: "Education".into(), target_amount: Some(Money::from_major(100000)), is_active: true, ..Default::default() }
    }

    #[test]
    fn test_impact_summary() {
        let mut a = Charity::create(form("A"));
        a.raised_amount = Money::from_major(125500);
        let mut b = Charity::create(CharityForm { target_amount: None, ..form("B") });
        b.raised_amount = Money::from_major(30000);
        let summary = impact_summary(&[a, b]);
        assert_eq!(summary.total_raised, Money::from_major(155500));
        assert_eq!(summary.total_target, Money::from_major(100000));
        assert_eq!(summary.people_helped, 15500);
        assert_eq!(summary.projects_completed, 3);
        assert_eq!(summary.progress_percentage, 100.0);
        assert_eq!(impact_summary(&[]).progress_percentage, 0.0);
    }

    #[tokio::test]
    async fn test_public_listing() {
        let m = market();
        let all = m.charities(None).await.unwrap();
        assert_eq!(all.len(), 6);
        let edhi = all.iter().find(|c| c.charity.name == "Edhi Foundation").unwrap();
        assert_eq!(edhi.progress_percentage, 25.0);
        assert!(m.charities(Some("All Categories")).await.unwrap().len() == 6);
        assert!(m.charities(Some("Healthcare")).await.unwrap().iter().all(|c| c.charity.category == "Healthcare"));
        assert_eq!(m.charity_impact().await.unwrap().charities, 6);
    }

    #[tokio::test]
    async fn test_seller_crud() {
        let m = market();
        assert!(matches!(m.create_charity(Uuid::new_v4(), form("X")).await, Err(MarketError::NotASeller)));
        let bad = CharityForm { name: String::new(), category: "Cricket".into(), ..form("") };
        assert_eq!(m.create_charity(DEMO_SELLER_ID, bad).await.unwrap_err().to_string(), "Please fill in: category, name");

        let created = m.create_charity(DEMO_SELLER_ID, form("Akhuwat")).await.unwrap();
        let hidden = m.update_charity(DEMO_SELLER_ID, created.id, CharityForm { is_active: false, ..form("Akhuwat") }).await.unwrap();
        assert!(!hidden.is_active);
        assert_eq!(m.charities(None).await.unwrap().len(), 6);
        assert_eq!(m.manage_charities(DEMO_SELLER_ID).await.unwrap().len(), 7);
        m.delete_charity(DEMO_SELLER_ID, created.id).await.unwrap();
        assert!(matches!(m.delete_charity(DEMO_SELLER_ID, created.id).await, Err(MarketError::CharityNotFound)));
    }
}
