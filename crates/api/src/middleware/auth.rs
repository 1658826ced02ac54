//! # Authentication Module
//!
//! Bearer-token authentication for the Rebook API. There are no local
//! passwords: a login is validated against the booking portal itself, after
//! which the API issues a signed JWT carrying the portal username. The
//! [`AuthUser`] extractor gates every protected handler.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{middleware::error_handling::AppError, ApiState};
use rebook_core::errors::BookingError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Portal username.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// JWT signing and validation keys with a fixed token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl JwtKeys {
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    /// Issue an access token for the given username.
    pub fn issue(&self, username: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: username.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
    }

    /// Validate a token and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}

/// The authenticated portal user, extracted from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError(BookingError::AuthFailed(
                    "Missing authorization header".to_string(),
                ))
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError(BookingError::AuthFailed(
                "Authorization header is not a bearer token".to_string(),
            ))
        })?;

        let claims = state.jwt.validate(token).map_err(|_| {
            AppError(BookingError::AuthFailed(
                "Invalid or expired token".to_string(),
            ))
        })?;

        Ok(AuthUser {
            username: claims.sub,
        })
    }
}
