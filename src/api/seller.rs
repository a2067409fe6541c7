//! Seller dashboard endpoints; every handler requires a seller account.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::domain::aggregates::{
    Charity, CharityForm, CharityListing, DiscountCode, DiscountCodeForm, DonationStats, DonationStatus, GoodsDonation, Product,
    ProductDraft, Seller, SellerProfilePatch, SellerRegistration, StoreSettings, StoreSettingsPatch,
};
use crate::error::Result;
use crate::services::dashboard::{Analytics, Dashboard, SellerOrder, SellerProduct, StatusUpdate};
use crate::services::donations::{DonationStatusUpdate, PickupSlot};
use crate::services::Marketplace;

#[derive(Debug, Default, Deserialize)]
pub struct DonationQuery {
    pub status: Option<DonationStatus>,
    pub category: Option<String>,
}

pub async fn register(State(market): State<Marketplace>, user: CurrentUser, Json(form): Json<SellerRegistration>) -> Result<(StatusCode, Json<Seller>)> {
    Ok((StatusCode::CREATED, Json(market.register_seller(user.id, user.email.as_deref(), form).await?)))
}

pub async fn profile(State(market): State<Marketplace>, user: CurrentUser) -> Result<Json<Seller>> {
    Ok(Json(market.seller_profile(user.id).await?))
}

pub async fn update_profile(State(market): State<Marketplace>, user: CurrentUser, Json(patch): Json<SellerProfilePatch>) -> Result<Json<Seller>> {
    Ok(Json(market.update_seller_profile(user.id, patch).await?))
}

pub async fn dashboard(State(market): State<Marketplace>, user: CurrentUser) -> Result<Json<Dashboard>> {
    Ok(Json(market.load_dashboard(user.id).await?))
}

pub async fn list_products(State(market): State<Marketplace>, user: CurrentUser) -> Result<Json<Vec<SellerProduct>>> {
    Ok(Json(market.seller_products(user.id).await?))
}

pub async fn add_product(State(market): State<Marketplace>, user: CurrentUser, Json(draft): Json<ProductDraft>) -> Result<(StatusCode, Json<Product>)> {
    Ok((StatusCode::CREATED, Json(market.add_product(user.id, draft).await?)))
}

pub async fn update_product(
    State(market): State<Marketplace>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<Product>> {
    Ok(Json(market.update_product(user.id, id, draft).await?))
}

pub async fn delete_product(State(market): State<Marketplace>, user: CurrentUser, Path(id): Path<Uuid>) -> Result<StatusCode> {
    market.delete_product(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_orders(State(market): State<Marketplace>, user: CurrentUser) -> Result<Json<Vec<SellerOrder>>> {
    Ok(Json(market.seller_orders(user.id).await?))
}

pub async fn update_order_status(
    State(market): State<Marketplace>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<SellerOrder>> {
    Ok(Json(market.update_order_status(user.id, id, update).await?))
}

pub async fn analytics(State(market): State<Marketplace>, user: CurrentUser) -> Result<Json<Analytics>> {
    Ok(Json(market.seller_analytics(user.id).await?))
}

pub async fn settings(State(market): State<Marketplace>, user: CurrentUser) -> Result<Json<StoreSettings>> {
    Ok(Json(market.store_settings(user.id).await?))
}

pub async fn update_settings(State(market): State<Marketplace>, user: CurrentUser, Json(patch): Json<StoreSettingsPatch>) -> Result<Json<StoreSettings>> {
    Ok(Json(market.update_store_settings(user.id, patch).await?))
}

pub async fn list_discounts(State(market): State<Marketplace>, user: CurrentUser) -> Result<Json<Vec<DiscountCode>>> {
    Ok(Json(market.list_discount_codes(user.id).await?))
}

pub async fn create_discount(
    State(market): State<Marketplace>,
    user: CurrentUser,
    Json(form): Json<DiscountCodeForm>,
) -> Result<(StatusCode, Json<DiscountCode>)> {
    Ok((StatusCode::CREATED, Json(market.create_discount_code(user.id, form).await?)))
}

pub async fn update_discount(
    State(market): State<Marketplace>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(form): Json<DiscountCodeForm>,
) -> Result<Json<DiscountCode>> {
    Ok(Json(market.update_discount_code(user.id, id, form).await?))
}

pub async fn delete_discount(State(market): State<Marketplace>, user: CurrentUser, Path(id): Path<Uuid>) -> Result<StatusCode> {
    market.delete_discount_code(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_charities(State(market): State<Marketplace>, user: CurrentUser) -> Result<Json<Vec<CharityListing>>> {
    Ok(Json(market.manage_charities(user.id).await?))
}

pub async fn create_charity(State(market): State<Marketplace>, user: CurrentUser, Json(form): Json<CharityForm>) -> Result<(StatusCode, Json<Charity>)> {
    Ok((StatusCode::CREATED, Json(market.create_charity(user.id, form).await?)))
}

pub async fn update_charity(
    State(market): State<Marketplace>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(form): Json<CharityForm>,
) -> Result<Json<Charity>> {
    Ok(Json(market.update_charity(user.id, id, form).await?))
}

pub async fn delete_charity(State(market): State<Marketplace>, user: CurrentUser, Path(id): Path<Uuid>) -> Result<StatusCode> {
    market.delete_charity(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_donations(State(market): State<Marketplace>, user: CurrentUser, Query(q): Query<DonationQuery>) -> Result<Json<Vec<GoodsDonation>>> {
    let donations = match (q.status, q.category.filter(|c| !c.trim().is_empty())) {
        (Some(status), _) => market.donations_by_status(user.id, status).await?,
        (None, Some(category)) => market.donations_by_category(user.id, &category).await?,
        (None, None) => market.all_donations(user.id).await?,
    };
    Ok(Json(donations))
}

pub async fn donation_stats(State(market): State<Marketplace>, user: CurrentUser) -> Result<Json<DonationStats>> {
    Ok(Json(market.donation_stats(user.id).await?))
}

pub async fn update_donation_status(
    State(market): State<Marketplace>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(update): Json<DonationStatusUpdate>,
) -> Result<Json<GoodsDonation>> {
    Ok(Json(market.update_donation_status(user.id, id, update).await?))
}

pub async fn schedule_pickup(
    State(market): State<Marketplace>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(slot): Json<PickupSlot>,
) -> Result<Json<GoodsDonation>> {
    Ok(Json(market.schedule_pickup(user.id, id, slot).await?))
}

pub async fn delete_donation(State(market): State<Marketplace>, user: CurrentUser, Path(id): Path<Uuid>) -> Result<StatusCode> {
    market.delete_donation(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
