use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
    RequestPartsExt,
};
use axum_extra::{
    extract::TypedHeader,
    headers::{authorization::Bearer, Authorization},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::User;
use crate::AppState;

/// Fixed id of the seeded demo account.
pub const DEMO_USER_ID: Uuid = Uuid::from_u128(0x6893646d_0a74_4324_a777_7ee200000001);
pub const DEMO_USER_NAME: &str = "Demo User";
pub const DEMO_USER_EMAIL: &str = "demo@demo.com";
pub const DEMO_USER_PASSWORD: &str = "demopass";

// --- Error Types ---

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No token provided")]
    MissingCredential,

    #[error("Invalid token")]
    InvalidCredential,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

// --- Tokens ---

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies HS256 session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours as i64),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default()).map(|data| data.claims)
    }
}

// --- Identity ---

/// Maps a bearer credential to the user it speaks for.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, credential: &str) -> Result<Uuid, AuthError>;
}

/// Accepts tokens from a `TokenIssuer`, plus an optional fixed demo token.
pub struct JwtIdentityProvider {
    tokens: TokenIssuer,
    demo_token: Option<String>,
}

impl JwtIdentityProvider {
    pub fn new(tokens: TokenIssuer, demo_token: Option<String>) -> Self {
        Self {
            tokens,
            demo_token: demo_token.filter(|t| !t.is_empty()),
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn resolve(&self, credential: &str) -> Result<Uuid, AuthError> {
        if self.demo_token.as_deref() == Some(credential) {
            return Ok(DEMO_USER_ID);
        }

        let claims = self.tokens.verify(credential).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AuthError::InvalidCredential
        })?;
        Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidCredential)
    }
}

// --- Passwords ---

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or(false)
}

// --- Authenticated User Extractor ---

/// Identity of the caller, resolved from the `Authorization: Bearer` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(cached_result) = parts.extensions.get::<Result<Self, Self::Rejection>>() {
            return cached_result.clone();
        }

        let app_state = AppState::from_ref(state);

        let result = async {
            let TypedHeader(Authorization(bearer)) = parts
                .extract::<TypedHeader<Authorization<Bearer>>>()
                .await
                .map_err(|rejection| {
                    if rejection.is_missing() {
                        AuthError::MissingCredential
                    } else {
                        AuthError::InvalidCredential
                    }
                })?;

            let user_id = app_state.identity.resolve(bearer.token()).await?;
            Ok(AuthenticatedUser(user_id))
        }
        .await;

        if let Err(e) = &result {
            tracing::debug!(error = %e, "Authentication failed");
        }
        parts.extensions.insert(result.clone());
        result
    }
}
