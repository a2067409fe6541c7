//! Bearer token verification for tokens issued by the hosted auth service

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::MarketError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

#[derive(Clone)]
pub struct TokenVerifier {
    key: Arc<DecodingKey>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self { key: Arc::new(DecodingKey::from_secret(secret.as_bytes())), validation: Validation::new(Algorithm::HS256) }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, MarketError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected bearer token");
                MarketError::Unauthorized
            })
    }
}

/// Mints a token the way the hosted auth service does; used by tests and local tooling.
pub fn issue_token(secret: &str, user_id: Uuid, email: Option<&str>) -> Result<String, MarketError> {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(24)).timestamp() as usize;
    let claims = Claims { sub: user_id, email: email.map(str::to_string), exp };
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| MarketError::Backend(e.to_string()))
}

/// The signed-in shopper or seller.
/// Usage in handlers: `async fn handler(user: CurrentUser) -> ...`
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    TokenVerifier: FromRef<S>,
{
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(MarketError::Unauthorized)?;
        let claims = TokenVerifier::from_ref(state).verify(token)?;
        Ok(CurrentUser { id: claims.sub, email: claims.email })
    }
}
