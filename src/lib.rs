//! ShopPak Marketplace
//!
//! Backend-for-frontend of a Pakistani online marketplace.
//!
//! ## Features
//! - Catalogue browsing and shopping cart
//! - Checkout with discount codes, charity add-ons and a mock local payment flow
//! - Order history and returns
//! - Seller dashboard: listings, fulfilment, analytics, discounts and charities
//! - Donations of unused goods

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod forms;
pub mod media;
pub mod payment;
pub mod pricing;
pub mod publisher;
pub mod services;
pub mod store;

pub use error::{MarketError, Result};
