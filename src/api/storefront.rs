//! Shopper-facing endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::domain::aggregates::{CartView, CharityListing, DiscountOffer, DonationForm, GoodsDonation, ReturnRequest, ReturnableOrder};
use crate::error::{MarketError, Result};
use crate::media::{LocalMediaStore, StoredMedia};
use crate::services::catalog::{CategoryListing, CategorySummary, ProductDetail, Storefront};
use crate::services::charities::ImpactSummary;
use crate::services::checkout::{CheckoutConfirmation, CheckoutRequest, Quote, QuoteRequest};
use crate::services::donations::DonationBrowse;
use crate::services::orders::{OrderHistory, OrderSummary};
use crate::services::returns::{reason_options, ReasonOption, ReturnForm};
use crate::services::Marketplace;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CharityParams {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub product_id: Uuid,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SetQuantity {
    pub quantity: i64,
}

pub async fn storefront(State(market): State<Marketplace>) -> Result<Json<Storefront>> {
    Ok(Json(market.storefront().await?))
}

pub async fn list_categories(State(market): State<Marketplace>, Query(p): Query<SearchParams>) -> Result<Json<Vec<CategorySummary>>> {
    Ok(Json(market.list_categories(p.search.as_deref()).await?))
}

pub async fn category_products(
    State(market): State<Marketplace>,
    Path(slug): Path<String>,
    Query(p): Query<SearchParams>,
) -> Result<Json<CategoryListing>> {
    Ok(Json(market.category_products(&slug, p.search.as_deref()).await?))
}

pub async fn get_product(State(market): State<Marketplace>, Path(id): Path<Uuid>) -> Result<Json<ProductDetail>> {
    Ok(Json(market.product_detail(id).await?))
}

pub async fn get_cart(State(market): State<Marketplace>, user: CurrentUser) -> Result<Json<CartView>> {
    Ok(Json(market.cart(user.id).await?))
}

pub async fn add_to_cart(State(market): State<Marketplace>, user: CurrentUser, Json(r): Json<AddToCart>) -> Result<(StatusCode, Json<CartView>)> {
    Ok((StatusCode::CREATED, Json(market.add_to_cart(user.id, r.product_id, r.quantity).await?)))
}

pub async fn update_cart_line(
    State(market): State<Marketplace>,
    user: CurrentUser,
    Path(line_id): Path<Uuid>,
    Json(r): Json<SetQuantity>,
) -> Result<Json<CartView>> {
    Ok(Json(market.update_cart_quantity(user.id, line_id, r.quantity).await?))
}

pub async fn remove_cart_line(State(market): State<Marketplace>, user: CurrentUser, Path(line_id): Path<Uuid>) -> Result<Json<CartView>> {
    Ok(Json(market.remove_from_cart(user.id, line_id).await?))
}

pub async fn clear_cart(State(market): State<Marketplace>, user: CurrentUser) -> Result<StatusCode> {
    market.clear_cart(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn discount_offers(State(market): State<Marketplace>) -> Result<Json<Vec<DiscountOffer>>> {
    Ok(Json(market.discount_offers().await?))
}

pub async fn quote(State(market): State<Marketplace>, user: CurrentUser, Json(r): Json<QuoteRequest>) -> Result<Json<Quote>> {
    Ok(Json(market.quote(user.id, r).await?))
}

pub async fn checkout(
    State(market): State<Marketplace>,
    user: CurrentUser,
    Json(r): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutConfirmation>)> {
    Ok((StatusCode::CREATED, Json(market.place_order(user.id, r).await?)))
}

pub async fn list_orders(State(market): State<Marketplace>, user: CurrentUser) -> Result<Json<OrderHistory>> {
    Ok(Json(market.order_history(user.id).await?))
}

pub async fn get_order(State(market): State<Marketplace>, user: CurrentUser, Path(id): Path<Uuid>) -> Result<Json<OrderSummary>> {
    Ok(Json(market.order_detail(user.id, id).await?))
}

pub async fn returnable_orders(State(market): State<Marketplace>, user: CurrentUser) -> Result<Json<Vec<ReturnableOrder>>> {
    Ok(Json(market.returnable_orders(user.id).await?))
}

pub async fn return_reasons() -> Json<Vec<ReasonOption>> {
    Json(reason_options())
}

pub async fn list_returns(State(market): State<Marketplace>, user: CurrentUser) -> Result<Json<Vec<ReturnRequest>>> {
    Ok(Json(market.return_requests(user.id).await?))
}

pub async fn request_return(
    State(market): State<Marketplace>,
    user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(form): Json<ReturnForm>,
) -> Result<(StatusCode, Json<ReturnRequest>)> {
    Ok((StatusCode::CREATED, Json(market.request_return(user.id, order_id, form).await?)))
}

pub async fn list_charities(
    State(market): State<Marketplace>,
    Query(p): Query<CharityParams>,
) -> Result<Json<Vec<CharityListing>>> {
    Ok(Json(market.charities(p.category.as_deref()).await?))
}

pub async fn charity_impact(State(market): State<Marketplace>) -> Result<Json<ImpactSummary>> {
    Ok(Json(market.charity_impact().await?))
}

pub async fn charity_categories(State(market): State<Marketplace>) -> Json<&'static [&'static str]> {
    Json(market.charity_categories())
}

pub async fn browse_donations(State(market): State<Marketplace>, Query(q): Query<DonationBrowse>) -> Result<Json<Vec<GoodsDonation>>> {
    Ok(Json(market.browse_donations(q).await?))
}

pub async fn submit_donation(
    State(market): State<Marketplace>,
    user: CurrentUser,
    Json(form): Json<DonationForm>,
) -> Result<(StatusCode, Json<GoodsDonation>)> {
    Ok((StatusCode::CREATED, Json(market.submit_donation(user.id, form).await?)))
}

pub async fn my_donations(State(market): State<Marketplace>, user: CurrentUser) -> Result<Json<Vec<GoodsDonation>>> {
    Ok(Json(market.my_donations(user.id).await?))
}

pub async fn donation_confirmation(State(market): State<Marketplace>, user: CurrentUser, Path(id): Path<Uuid>) -> Result<Json<GoodsDonation>> {
    Ok(Json(market.donation_confirmation(user.id, id).await?))
}

/// Multipart upload: a `file` part plus an optional `folder` text part.
pub async fn upload(State(media): State<LocalMediaStore>, user: CurrentUser, mut multipart: Multipart) -> Result<(StatusCode, Json<StoredMedia>)> {
    let bad_part = |e: axum::extract::multipart::MultipartError| MarketError::Validation(e.body_text());
    let mut folder = None;
    let mut file = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_part)? {
        let part = field.name().unwrap_or_default().to_string();
        match part.as_str() {
            "folder" => folder = Some(field.text().await.map_err(bad_part)?),
            "file" => {
                let name = field.file_name().unwrap_or("image").to_string();
                let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
                file = Some((name, content_type, field.bytes().await.map_err(bad_part)?));
            }
            _ => {}
        }
    }
    let (name, content_type, bytes) = file.ok_or_else(|| MarketError::MissingFields(vec!["file".into()]))?;
    let stored = media.put(folder.as_deref().map(str::trim), &name, &content_type, &bytes).await?;
    tracing::debug!(user_id = %user.id, path = %stored.path, "upload accepted");
    Ok((StatusCode::CREATED, Json(stored)))
}
