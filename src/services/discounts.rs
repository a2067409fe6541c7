use chrono::Utc;
use uuid::Uuid;

use super::Marketplace;
use crate::domain::aggregates::discount::normalize_code;
use crate::domain::aggregates::{DiscountCode, DiscountCodeForm, DiscountOffer};
use crate::error::{MarketError, Result};
use crate::forms;

impl Marketplace {
    /// Codes a shopper can use right now.
    pub async fn discount_offers(&self) -> Result<Vec<DiscountOffer>> {
        let now = Utc::now();
        Ok(self.store.list_discounts().await?.iter().filter(|d| d.is_available(now)).map(|d| DiscountOffer::from_code(d, now)).collect())
    }

    pub async fn list_discount_codes(&self, seller_id: Uuid) -> Result<Vec<DiscountCode>> {
        self.require_seller(seller_id).await?;
        self.store.list_discounts().await
    }

    /// Codes are unique once trimmed and uppercased; `except` is the code being edited.
    async fn ensure_code_free(&self, code: &str, except: Option<Uuid>) -> Result<()> {
        match self.store.discount_by_code(&normalize_code(code)).await? {
            Some(existing) if Some(existing.id) != except => Err(MarketError::Conflict(format!("Discount code {} already exists", existing.code))),
            _ => Ok(()),
        }
    }

    fn check_code_form(form: &DiscountCodeForm) -> Result<()> {
        forms::require(form, &form.extra_checks())?;
        match form.range_error() {
            Some(msg) => Err(MarketError::Validation(msg.into())),
            None => Ok(()),
        }
    }

    pub async fn create_discount_code(&self, seller_id: Uuid, form: DiscountCodeForm) -> Result<DiscountCode> {
        self.require_seller(seller_id).await?;
        Self::check_code_form(&form)?;
        self.ensure_code_free(&form.code, None).await?;
        let code = DiscountCode::create(form);
        self.store.insert_discount(&code).await?;
        tracing::info!(code = %code.code, %seller_id, "discount code created");
        Ok(code)
    }

    pub async fn update_discount_code(&self, seller_id: Uuid, id: Uuid, form: DiscountCodeForm) -> Result<DiscountCode> {
        self.require_seller(seller_id).await?;
        Self::check_code_form(&form)?;
        let mut code = self.store.discount(id).await?.ok_or(MarketError::DiscountNotFound)?;
        self.ensure_code_free(&form.code, Some(id)).await?;
        code.apply(form);
        self.store.update_discount(&code).await?;
        Ok(code)
    }

    pub async fn delete_discount_code(&self, seller_id: Uuid, id: Uuid) -> Result<()> {
        self.require_seller(seller_id).await?;
        if !self.store.delete_discount(id).await? {
            return Err(MarketError::DiscountNotFound);
        }
        tracing::info!(discount_id = %id, %seller_id, "discount code deleted");
        Ok(())
    }
}
