use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use super::{text_matches, Marketplace};
use crate::domain::aggregates::category::{name_from_slug, slug_for};
use crate::domain::aggregates::{Category, DiscountOffer, Product, ProductCard, StockStatus};
use crate::error::{MarketError, Result};
use crate::store::ProductFilter;

#[derive(Clone, Debug, Serialize)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    pub slug: String,
    pub product_count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct CategoryListing {
    pub category: CategorySummary,
    pub total: usize,
    pub products: Vec<ProductCard>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SellerBadge {
    pub business_name: String,
    pub city: String,
    pub is_verified: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub card: ProductCard,
    pub category: Option<String>,
    pub stock_status: StockStatus,
    pub in_stock: bool,
    pub seller: Option<SellerBadge>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StoreStats {
    pub products: usize,
    pub categories: usize,
    pub orders: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Storefront {
    pub featured: Vec<ProductCard>,
    pub categories: Vec<CategorySummary>,
    pub offers: Vec<DiscountOffer>,
    pub stats: StoreStats,
}

/// Products shown on the homepage.
pub const FEATURED_COUNT: usize = 6;

fn product_matches(p: &Product, search: Option<&str>) -> bool {
    text_matches(search, &[Some(p.name.as_str()), p.description.as_deref()])
}

fn summarize(categories: Vec<Category>, active: &[Product]) -> Vec<CategorySummary> {
    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    for category_id in active.iter().filter_map(|p| p.category_id) {
        *counts.entry(category_id).or_default() += 1;
    }
    categories
        .into_iter()
        .map(|c| CategorySummary { slug: slug_for(&c.name), product_count: counts.get(&c.id).copied().unwrap_or(0), category: c })
        .collect()
}

impl Marketplace {
    pub async fn list_categories(&self, search: Option<&str>) -> Result<Vec<CategorySummary>> {
        let categories = self.store.list_categories().await?;
        let active = self.store.list_products(ProductFilter::active()).await?;
        Ok(summarize(categories, &active).into_iter().filter(|s| s.category.matches_search(search.unwrap_or_default())).collect())
    }

    pub async fn category_products(&self, slug: &str, search: Option<&str>) -> Result<CategoryListing> {
        let name = name_from_slug(slug);
        let category = self.store.category_by_name(&name).await?.ok_or(MarketError::CategoryNotFound)?;
        let products = self.store.list_products(ProductFilter { category_id: Some(category.id), ..ProductFilter::active() }).await?;
        let total = products.len();
        let summary = CategorySummary { slug: slug_for(&category.name), product_count: total, category };
        let products = products.iter().filter(|p| product_matches(p, search)).map(ProductCard::from).collect();
        Ok(CategoryListing { category: summary, total, products })
    }

    pub async fn product_detail(&self, id: Uuid) -> Result<ProductDetail> {
        let product = self.store.product(id).await?.filter(|p| p.is_active).ok_or(MarketError::ProductNotFound)?;
        let category = match product.category_id {
            Some(cid) => self.store.list_categories().await?.into_iter().find(|c| c.id == cid).map(|c| c.name),
            None => None,
        };
        let seller = match product.seller_id {
            Some(sid) => self.store.seller(sid).await?.map(|s| SellerBadge { business_name: s.business_name, city: s.city, is_verified: s.is_verified }),
            None => None,
        };
        Ok(ProductDetail {
            card: ProductCard::from(&product), category, stock_status: product.stock_status(), in_stock: product.is_in_stock(), seller,
        })
    }

    pub async fn storefront(&self) -> Result<Storefront> {
        let active = self.store.list_products(ProductFilter::active()).await?;
        let categories = summarize(self.store.list_categories().await?, &active);
        let now = Utc::now();
        let offers = self.store.list_discounts().await?.iter().filter(|d| d.is_available(now)).map(|d| DiscountOffer::from_code(d, now)).collect();
        let stats = StoreStats { products: active.len(), categories: categories.len(), orders: self.store.count_orders().await? };
        let featured = active.iter().take(FEATURED_COUNT).map(ProductCard::from).collect();
        Ok(Storefront { featured, categories, offers, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{market, product_id};
    use super::*;

    #[tokio::test]
    async fn test_categories_with_counts() {
        let m = market();
        let all = m.list_categories(None).await.unwrap();
        let fashion = all.iter().find(|c| c.category.name == "Fashion").unwrap();
        assert_eq!(fashion.product_count, 3);
        assert_eq!(fashion.slug, "fashion");
        let books = all.iter().find(|c| c.slug == "books").unwrap();
        assert_eq!(books.product_count, 0);
        let found = m.list_categories(Some("kitchen")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].slug, "home-garden");
    }

    #[tokio::test]
    async fn test_category_products_search() {
        let m = market();
        let listing = m.category_products("electronics", Some("laptop")).await.unwrap();
        assert_eq!(listing.total, 2);
        assert_eq!(listing.products.len(), 1);
        assert!(listing.products[0].name.starts_with("HP"));
        assert!(matches!(m.category_products("garden-tools", None).await, Err(MarketError::CategoryNotFound)));
    }

    #[tokio::test]
    async fn test_product_detail() {
        let m = market();
        let detail = m.product_detail(product_id(1)).await.unwrap();
        assert_eq!(detail.category.as_deref(), Some("Electronics"));
        assert_eq!(detail.seller.unwrap().business_name, "TechHub Pakistan");
        assert_eq!(detail.card.discount_percentage, 10);
        assert!(matches!(m.product_detail(Uuid::new_v4()).await, Err(MarketError::ProductNotFound)));
    }

    #[tokio::test]
    async fn test_storefront() {
        let front = market().storefront().await.unwrap();
        assert_eq!(front.featured.len(), 6);
        assert_eq!(front.stats.products, 6);
        assert_eq!(front.stats.categories, 5);
        assert_eq!(front.stats.orders, 0);
        assert_eq!(front.offers.len(), 4);
    }
}
