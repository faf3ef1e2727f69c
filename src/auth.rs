use crate::{AppState, errors::ApiError};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub token_type: TokenType,
    pub jti: String,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, ApiError> {
        self.sub.parse().map_err(|_| ApiError::InvalidToken)
    }
}

pub fn create_token(
    user_id: i64,
    token_type: TokenType,
    ttl: Duration,
    secret: &str,
) -> Result<String, ApiError> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(ttl)
        .ok_or_else(|| ApiError::InternalError("Failed to calculate expiration".into()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        token_type,
        jti: Uuid::new_v4().simple().to_string(),
        iat: now.timestamp() as usize,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::InternalError(format!("Token Creation failed: {}", e)))
}

/// Decodes a token and checks it is of the expected kind.
pub fn decode_token(token: &str, expected: TokenType, secret: &str) -> Result<Claims, ApiError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::InvalidToken)?;

    if claims.token_type != expected {
        return Err(ApiError::InvalidToken);
    }

    Ok(claims)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

/// Who is making the request. Anonymous when no `Authorization` header is sent.
#[derive(Debug, Clone, Default)]
pub struct Identity(pub Option<CurrentUser>);

impl Identity {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn user(&self) -> Result<&CurrentUser, ApiError> {
        self.0.as_ref().ok_or(ApiError::NotAuthenticated)
    }
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(Identity::anonymous());
        };

        // A header that is present but unusable is an error, not an anonymous request.
        let token = auth_header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::InvalidToken)?;

        let claims = decode_token(token, TokenType::Access, &state.config.jwt_secret)?;
        let user = state
            .store
            .user(claims.user_id()?)
            .ok_or(ApiError::InvalidToken)?;

        Ok(Identity(Some(CurrentUser {
            id: user.id,
            username: user.username,
        })))
    }
}
