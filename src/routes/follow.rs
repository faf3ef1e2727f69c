use super::method_not_allowed;
use crate::{
    AppState,
    auth::Identity,
    dto::{FollowRequest, FollowResponse, Payload},
    errors::ApiError,
    permissions::Policy,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{Method, StatusCode},
    routing::get,
};
use serde::Deserialize;
use tracing::info;

const POLICY: Policy = Policy::Authenticated;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/follow/",
        get(list_follows)
            .post(create_follow)
            .fallback(method_not_allowed),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

impl SearchParams {
    /// Search terms, split on whitespace and commas, lowercased.
    fn terms(&self) -> Vec<String> {
        self.search
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
            .collect()
    }
}

/// True when every term occurs in `username`, ignoring case.
fn matches_all(username: &str, terms: &[String]) -> bool {
    let username = username.to_lowercase();
    terms.iter().all(|term| username.contains(term.as_str()))
}

/// GET /v1/follow/?search=...
/// Headers: Authorization: Bearer <token>
async fn list_follows(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<FollowResponse>>, ApiError> {
    POLICY.check(&identity, &method)?;
    let user = identity.user()?;
    let terms = params.terms();

    let follows = state
        .store
        .follows_of(user.id)
        .iter()
        .map(|follow| FollowResponse::render(follow, &state.store))
        .filter(|follow| matches_all(&follow.following, &terms))
        .collect();

    Ok(Json(follows))
}

/// POST /v1/follow/
/// Headers: Authorization: Bearer <token>
/// Body: { "following": "username" }
async fn create_follow(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
    body: Payload,
) -> Result<(StatusCode, Json<FollowResponse>), ApiError> {
    POLICY.check(&identity, &method)?;
    let user = identity.user()?;

    let payload: FollowRequest = body.decode()?;
    let target = payload.target(&state.store)?;
    let follow = state.store.create_follow(user.id, target.id)?;

    info!("User {} now follows {}", user.username, target.username);

    Ok((
        StatusCode::CREATED,
        Json(FollowResponse::render(&follow, &state.store)),
    ))
}
