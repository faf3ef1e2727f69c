use super::{Ids, method_not_allowed};
use crate::{AppState, auth::Identity, errors::ApiError, models::Group, permissions::Policy};
use axum::{Json, Router, extract::State, http::Method, routing::get};

const POLICY: Policy = Policy::ReadOnly;

// Groups are seeded at startup; every write verb falls through to 405.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups/", get(list_groups).fallback(method_not_allowed))
        .route("/groups/{id}/", get(get_group).fallback(method_not_allowed))
}

/// GET /v1/groups/
async fn list_groups(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
) -> Result<Json<Vec<Group>>, ApiError> {
    POLICY.check(&identity, &method)?;
    Ok(Json(state.store.groups()))
}

/// GET /v1/groups/{id}/
async fn get_group(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
    Ids(id): Ids<i64>,
) -> Result<Json<Group>, ApiError> {
    POLICY.check(&identity, &method)?;
    let group = state.store.group(id).ok_or(ApiError::NotFound)?;

    Ok(Json(group))
}
