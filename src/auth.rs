//! Token issuing and verification, plus the request extractors that turn a
//! Bearer header into a verified claim struct.

use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::models::{Role, User};
use crate::settings::Settings;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unauthorized request")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error(transparent)]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies the two JWT kinds with separate secrets.
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(settings: &Settings) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(settings.access_token_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(settings.access_token_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(settings.refresh_token_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(settings.refresh_token_secret.as_bytes()),
            access_ttl: Duration::minutes(settings.access_token_ttl_minutes),
            refresh_ttl: Duration::days(settings.refresh_token_ttl_days),
        }
    }

    pub fn issue_access(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.access_encoding)?)
    }

    pub fn issue_refresh(&self, user_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.refresh_encoding)?)
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        decode::<AccessClaims>(token, &self.access_decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

/// Verified claim struct handed to the services. Carries exactly what the
/// core reads from a caller: the id and the role.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ApiError::from(AuthError::MissingToken))?;
        let claims = state.tokens.verify_access(bearer.token())?;
        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

/// Extractor gating admin-only routes on the token's role claim.
pub struct Admin(pub AuthUser);

impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(ApiError::Forbidden("Access denied. Admins only.".into()));
        }
        Ok(Admin(user))
    }
}
