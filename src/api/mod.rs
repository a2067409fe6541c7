//! HTTP surface: one JSON endpoint group per storefront screen, plus the seller dashboard.

pub mod seller;
pub mod storefront;

use axum::{
    extract::{DefaultBodyLimit, FromRef, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::auth::TokenVerifier;
use crate::media::{LocalMediaStore, MAX_IMAGE_BYTES};
use crate::services::Marketplace;

pub const SERVICE_NAME: &str = "shoppak-marketplace";

#[derive(Clone, FromRef)]
pub struct AppState {
    pub market: Marketplace,
    pub verifier: TokenVerifier,
    pub media: LocalMediaStore,
}

async fn health(State(market): State<Marketplace>) -> (StatusCode, Json<serde_json::Value>) {
    match market.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"status": "healthy", "service": SERVICE_NAME}))),
        Err(e) => {
            tracing::error!(error = %e, "backend unreachable");
            (StatusCode::SERVICE_UNAVAILABLE, Json(serde_json::json!({"status": "degraded", "service": SERVICE_NAME})))
        }
    }
}

pub fn router(state: AppState) -> Router {
    let media_dir = state.media.root().clone();
    let seller = Router::new()
        .route("/profile", get(seller::profile).put(seller::update_profile))
        .route("/dashboard", get(seller::dashboard))
        .route("/products", get(seller::list_products).post(seller::add_product))
        .route("/products/:id", put(seller::update_product).delete(seller::delete_product))
        .route("/orders", get(seller::list_orders))
        .route("/orders/:id/status", put(seller::update_order_status))
        .route("/analytics", get(seller::analytics))
        .route("/settings", get(seller::settings).put(seller::update_settings))
        .route("/discounts", get(seller::list_discounts).post(seller::create_discount))
        .route("/discounts/:id", put(seller::update_discount).delete(seller::delete_discount))
        .route("/charities", get(seller::list_charities).post(seller::create_charity))
        .route("/charities/:id", put(seller::update_charity).delete(seller::delete_charity))
        .route("/donations", get(seller::list_donations))
        .route("/donations/stats", get(seller::donation_stats))
        .route("/donations/:id", delete(seller::delete_donation))
        .route("/donations/:id/status", put(seller::update_donation_status))
        .route("/donations/:id/pickup", put(seller::schedule_pickup));

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/storefront", get(storefront::storefront))
        .route("/api/v1/categories", get(storefront::list_categories))
        .route("/api/v1/categories/:slug/products", get(storefront::category_products))
        .route("/api/v1/products/:id", get(storefront::get_product))
        .route("/api/v1/cart", get(storefront::get_cart).post(storefront::add_to_cart).delete(storefront::clear_cart))
        .route("/api/v1/cart/:line_id", put(storefront::update_cart_line).delete(storefront::remove_cart_line))
        .route("/api/v1/discounts", get(storefront::discount_offers))
        .route("/api/v1/checkout", post(storefront::checkout))
        .route("/api/v1/checkout/quote", post(storefront::quote))
        .route("/api/v1/orders", get(storefront::list_orders))
        .route("/api/v1/orders/:id", get(storefront::get_order))
        .route("/api/v1/orders/:id/returns", post(storefront::request_return))
        .route("/api/v1/returns", get(storefront::list_returns))
        .route("/api/v1/returns/eligible", get(storefront::returnable_orders))
        .route("/api/v1/returns/reasons", get(storefront::return_reasons))
        .route("/api/v1/charities", get(storefront::list_charities))
        .route("/api/v1/charities/impact", get(storefront::charity_impact))
        .route("/api/v1/charities/categories", get(storefront::charity_categories))
        .route("/api/v1/donations", get(storefront::browse_donations).post(storefront::submit_donation))
        .route("/api/v1/donations/mine", get(storefront::my_donations))
        .route("/api/v1/donations/:id", get(storefront::donation_confirmation))
        .route("/api/v1/uploads", post(storefront::upload).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)))
        .route("/api/v1/sellers", post(seller::register))
        .nest("/api/v1/seller", seller)
        .nest_service("/media", ServeDir::new(media_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::issue_token;
    use crate::payment::MockGateway;
    use crate::publisher::EventBus;
    use crate::store::{MemoryStore, DEMO_SELLER_ID};
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "test-secret";

    fn app() -> Router {
        let market = Marketplace::new(Arc::new(MemoryStore::seeded()), EventBus::disconnected(), Arc::new(MockGateway::new(Duration::ZERO, 1.0)));
        let media = LocalMediaStore::new(std::env::temp_dir().join(format!("shoppak-api-{}", Uuid::new_v4())), "/media");
        router(AppState { market, verifier: TokenVerifier::new(SECRET), media })
    }

    fn token(user: Uuid) -> String {
        issue_token(SECRET, user, Some("shopper@example.com")).unwrap()
    }

    async fn call(app: &Router, method: Method, uri: &str, user: Option<Uuid>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token(user)));
        }
        let req = match body {
            Some(b) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(b.to_string())).unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_health_and_storefront() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "shoppak-marketplace");
        let (status, body) = call(&app, Method::GET, "/api/v1/storefront", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["featured"].as_array().unwrap().len(), 6);
        let (status, body) = call(&app, Method::GET, "/api/v1/categories/home-garden/products", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        let (status, _) = call(&app, Method::GET, "/api/v1/categories/toys/products", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cart_requires_token() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/api/v1/cart", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authentication required");
    }

    #[tokio::test]
    async fn test_checkout_flow() {
        let app = app();
        let user = Uuid::new_v4();
        let product = Uuid::from_u128(0x4444_4444_4444_4444_4444_4444_4444_4444);
        let (status, body) = call(&app, Method::POST, "/api/v1/cart", Some(user), Some(json!({"product_id": product, "quantity": 2}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["total_items"], 2);

        let (status, body) = call(&app, Method::POST, "/api/v1/checkout/quote", Some(user), Some(json!({"discount_code": "flash50"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totals"]["total_display"], "Rs. 6,000");

        let request = json!({
            "shipping": {"first_name": "Ali", "last_name": "Raza", "email": "ali@example.com", "phone": "03001234567",
                         "address": "12 Canal Road", "city": "Faisalabad"},
            "payment_method": "easypaisa",
            "payment": {"phone": "0300-1234567", "otp": "123456"},
            "discount_code": "FLASH50"
        });
        let (status, body) = call(&app, Method::POST, "/api/v1/checkout", Some(user), Some(request)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["message"].as_str().unwrap().starts_with("Order #"));
        assert_eq!(body["order"]["shipping_address"], "12 Canal Road, Faisalabad");

        let (_, history) = call(&app, Method::GET, "/api/v1/orders", Some(user), None).await;
        assert_eq!(history["total_orders"], 1);
        let (_, cart) = call(&app, Method::GET, "/api/v1/cart", Some(user), None).await;
        assert_eq!(cart["total_items"], 0);
    }

    #[tokio::test]
    async fn test_seller_routes_need_seller_account() {
        let app = app();
        let (status, _) = call(&app, Method::GET, "/api/v1/seller/analytics", Some(Uuid::new_v4()), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = call(&app, Method::GET, "/api/v1/seller/dashboard", Some(DEMO_SELLER_ID), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analytics"]["total_products"], 2);
        assert_eq!(body["settings"]["return_policy"], "30-day return policy");
    }

    #[tokio::test]
    async fn test_donation_submit_and_staff_review() {
        let app = app();
        let donor = Uuid::new_v4();
        let form = json!({
            "product_name": "Study table", "condition": "Good", "category": "Home & Garden", "estimated_value": 4000,
            "donor_name": "Hina", "donor_email": "hina@example.com", "donor_phone": "03451234567",
            "pickup_address": "House 9, G-10", "pickup_city": "Islamabad"
        });
        let (status, created) = call(&app, Method::POST, "/api/v1/donations", Some(donor), Some(form)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (_, listed) = call(&app, Method::GET, "/api/v1/donations?category=All%20Categories", None, None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        let (status, _) = call(&app, Method::GET, &format!("/api/v1/donations/{id}"), Some(donor), None).await;
        assert_eq!(status, StatusCode::OK);

        let pickup = json!({"pickup_date": "2026-11-20", "pickup_time": "11:30"});
        let (status, body) = call(&app, Method::PUT, &format!("/api/v1/seller/donations/{id}/pickup"), Some(DEMO_SELLER_ID), Some(pickup)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "approved");
        let (_, stats) = call(&app, Method::GET, "/api/v1/seller/donations/stats", Some(DEMO_SELLER_ID), None).await;
        assert_eq!(stats["approved_donations"], 1);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_images() {
        let app = app();
        let boundary = "shoppakboundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\nContent-Type: text/plain\r\n\r\nhello\r\n--{boundary}--\r\n"
        );
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/uploads")
            .header(header::AUTHORIZATION, format!("Bearer {}", token(Uuid::new_v4())))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
