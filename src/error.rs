//! Service-wide error type and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::domain::aggregates::{CartError, OrderError, ProductError};
use crate::domain::value_objects::Money;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Please fill in: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Seller account required")]
    NotASeller,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Cart item not found")]
    CartItemNotFound,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Donation not found")]
    DonationNotFound,

    #[error("Charity not found")]
    CharityNotFound,

    #[error("Discount code not found")]
    DiscountNotFound,

    #[error("Seller not found")]
    SellerNotFound,

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Only {available} left in stock")]
    InsufficientStock { available: u32 },

    #[error("The discount code you entered is not valid.")]
    InvalidCode,

    #[error("This code requires a minimum order of {}.", .0.display())]
    MinimumNotMet(Money),

    #[error("This discount code is no longer available.")]
    CodeUnavailable,

    #[error("{0}")]
    PaymentDeclined(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Media storage error: {0}")]
    Media(String),
}

pub type Result<T> = std::result::Result<T, MarketError>;

impl MarketError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields(_) | Self::Validation(_) | Self::EmptyCart => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotASeller => StatusCode::FORBIDDEN,
            Self::ProductNotFound
            | Self::CategoryNotFound
            | Self::CartItemNotFound
            | Self::OrderNotFound
            | Self::DonationNotFound
            | Self::CharityNotFound
            | Self::DiscountNotFound
            | Self::SellerNotFound => StatusCode::NOT_FOUND,
            Self::InsufficientStock { .. } | Self::Conflict(_) | Self::InvalidTransition(_) => StatusCode::CONFLICT,
            Self::InvalidCode | Self::MinimumNotMet(_) | Self::CodeUnavailable => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PaymentDeclined(_) => StatusCode::PAYMENT_REQUIRED,
            Self::Backend(_) | Self::Media(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<sqlx::Error> for MarketError {
    fn from(e: sqlx::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for MarketError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Self::Backend(e.to_string())
    }
}

impl From<CartError> for MarketError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::ItemNotFound => Self::CartItemNotFound,
            CartError::InvalidQuantity => Self::Validation("Quantity must be at least 1".into()),
            CartError::InsufficientStock { available } => Self::InsufficientStock { available },
            CartError::ProductUnavailable => Self::ProductNotFound,
        }
    }
}

impl From<OrderError> for MarketError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NoItems => Self::EmptyCart,
            OrderError::InvalidTransition { .. } => Self::InvalidTransition(e.to_string()),
        }
    }
}

impl From<ProductError> for MarketError {
    fn from(e: ProductError) -> Self {
        Self::Validation(e.to_string())
    }
}
