//! Bearer credential verification for both the live handshake and the
//! REST endpoints.
//!
//! Credentials are HS256 JWTs carrying a `userId` claim, signed with the
//! secret shared with the service that issues them. `exp` is enforced when
//! present.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{error::ChatError, AppState};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing credential")]
    Missing,
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token could not be signed")]
    Signing,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
}

#[derive(Clone)]
pub struct TokenKey {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenKey {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        let mut validation = Validation::new(Algorithm::HS256);
        // the issuer may omit exp; when it is set it is checked exactly
        validation.required_spec_claims.clear();
        validation.leeway = 0;
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret)),
            decoding: Arc::new(DecodingKey::from_secret(secret)),
            validation: Arc::new(validation),
        }
    }

    /// Issues a token for `user_id` valid for `ttl` from now.
    pub fn issue(&self, user_id: &str, ttl: Duration) -> Result<String, AuthError> {
        let expires_at = OffsetDateTime::now_utc().unix_timestamp() + ttl.as_secs() as i64;
        self.issue_until(user_id, expires_at)
    }

    /// Issues a token expiring at the given Unix second.
    pub fn issue_until(&self, user_id: &str, expires_at: i64) -> Result<String, AuthError> {
        let claims = Claims {
            user_id: user_id.to_string(),
            iat: Some(OffsetDateTime::now_utc().unix_timestamp()),
            exp: Some(expires_at),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| AuthError::Signing)
    }

    /// Returns the user id bound to a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::BadSignature,
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Malformed,
            })?;
        if data.claims.user_id.is_empty() {
            return Err(AuthError::Malformed);
        }
        Ok(data.claims.user_id)
    }

    /// Handshake entry point: absence of a credential is an error, never anonymous.
    pub fn authenticate(&self, token: Option<&str>) -> Result<String, AuthError> {
        match token.map(str::trim) {
            Some(t) if !t.is_empty() => self.verify(t),
            _ => Err(AuthError::Missing),
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Caller identity of an authenticated REST request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ChatError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let state = parts
            .extensions
            .get::<Arc<AppState>>()
            .cloned()
            .ok_or_else(|| ChatError::Internal("application state not installed".to_string()))?;
        let user_id = state.tokens.authenticate(bearer_token(&parts.headers))?;
        Ok(AuthUser(user_id))
    }
}
