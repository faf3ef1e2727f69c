use super::method_not_allowed;
use crate::{
    AppState,
    auth::{Identity, TokenType, create_token, decode_token},
    dto::{
        AccessTokenResponse, LoginRequest, Payload, RefreshRequest, SignupRequest,
        TokenPairResponse, UserResponse, VerifyRequest,
    },
    errors::ApiError,
    permissions::Policy,
    throttle::throttle,
};
use axum::{
    Json, Router,
    extract::State,
    http::{Method, StatusCode},
    middleware,
    routing::{get, post},
};
use bcrypt::{hash, verify};
use tracing::info;
use validator::Validate;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users/", post(signup).fallback(method_not_allowed))
        .route("/users/me/", get(get_current_user).fallback(method_not_allowed))
        .route(
            "/jwt/create/",
            post(login)
                .fallback(method_not_allowed)
                .route_layer(middleware::from_fn_with_state(state, throttle)),
        )
        .route("/jwt/refresh/", post(refresh).fallback(method_not_allowed))
        .route("/jwt/verify/", post(verify_token).fallback(method_not_allowed))
}

fn issue_pair(state: &AppState, user_id: i64) -> Result<TokenPairResponse, ApiError> {
    let config = &state.config;
    Ok(TokenPairResponse {
        refresh: create_token(
            user_id,
            TokenType::Refresh,
            config.refresh_token_ttl,
            &config.jwt_secret,
        )?,
        access: create_token(
            user_id,
            TokenType::Access,
            config.access_token_ttl,
            &config.jwt_secret,
        )?,
    })
}

/// Runs bcrypt work off the async worker threads.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::InternalError(format!("Blocking task failed: {}", e)))
}

/// POST /v1/users/
/// Body: { "username": "...", "email": "...", "password": "..." }
async fn signup(
    State(state): State<AppState>,
    body: Payload,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let payload: SignupRequest = body.decode()?;
    payload.validate()?;

    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let cost = state.config.bcrypt_cost;
    let hashed_password = blocking(move || hash(password, cost))
        .await?
        .map_err(|e| ApiError::InternalError(format!("Password hashing failed: {}", e)))?;

    let user = state
        .store
        .create_user(&username, &payload.email, hashed_password)?;

    info!("New user registered: {}", user.username);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /v1/jwt/create/
/// Body: { "username": "...", "password": "..." }
async fn login(
    State(state): State<AppState>,
    body: Payload,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let payload: LoginRequest = body.decode()?;
    payload.validate()?;

    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    // Find user by username
    let user = state
        .store
        .user_by_username(&username)
        .ok_or(ApiError::InvalidCredentials)?;

    // Verify password
    let hashed_password = user.hashed_password.clone();
    let valid = blocking(move || verify(password, &hashed_password))
        .await?
        .map_err(|e| ApiError::InternalError(format!("Password verification failed: {}", e)))?;

    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    let tokens = issue_pair(&state, user.id)?;

    info!("User logged in: {}", user.username);

    Ok(Json(tokens))
}

/// POST /v1/jwt/refresh/
/// Body: { "refresh": "..." }
async fn refresh(
    State(state): State<AppState>,
    body: Payload,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let payload: RefreshRequest = body.decode()?;
    payload.validate()?;

    let token = payload.refresh.unwrap_or_default();
    let claims = decode_token(&token, TokenType::Refresh, &state.config.jwt_secret)?;
    let user = state
        .store
        .user(claims.user_id()?)
        .ok_or(ApiError::InvalidToken)?;

    let access = create_token(
        user.id,
        TokenType::Access,
        state.config.access_token_ttl,
        &state.config.jwt_secret,
    )?;

    Ok(Json(AccessTokenResponse { access }))
}

/// POST /v1/jwt/verify/
/// Body: { "token": "..." }
async fn verify_token(
    State(state): State<AppState>,
    body: Payload,
) -> Result<Json<serde_json::Value>, ApiError> {
    let payload: VerifyRequest = body.decode()?;
    payload.validate()?;

    let token = payload.token.unwrap_or_default();
    // Either kind of token may be verified.
    decode_token(&token, TokenType::Access, &state.config.jwt_secret)
        .or_else(|_| decode_token(&token, TokenType::Refresh, &state.config.jwt_secret))?;

    Ok(Json(serde_json::json!({})))
}

/// GET /v1/users/me/
/// Headers: Authorization: Bearer <token>
async fn get_current_user(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
) -> Result<Json<UserResponse>, ApiError> {
    Policy::Authenticated.check(&identity, &method)?;
    let current = identity.user()?;

    let user = state.store.user(current.id).ok_or(ApiError::NotFound)?;

    Ok(Json(user.into()))
}
