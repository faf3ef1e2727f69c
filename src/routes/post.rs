use super::{Ids, method_not_allowed};
use crate::{
    AppState,
    auth::Identity,
    dto::{Payload, PostRequest, PostResponse},
    errors::ApiError,
    pagination::{LimitOffset, Listing, PageLink},
    permissions::Policy,
};
use axum::{
    Json, Router,
    extract::{OriginalUri, Query, State},
    http::{HeaderMap, Method, StatusCode},
    routing::get,
};
use tracing::info;

const POLICY: Policy = Policy::AuthorOrReadOnly;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/posts/",
            get(list_posts)
                .post(create_post)
                .fallback(method_not_allowed),
        )
        .route(
            "/posts/{post_id}/",
            get(get_post)
                .put(update_post)
                .patch(partial_update_post)
                .delete(delete_post)
                .fallback(method_not_allowed),
        )
}

/// GET /v1/posts/?limit=10&offset=0
async fn list_posts(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
    Query(params): Query<LimitOffset>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Json<Listing<PostResponse>>, ApiError> {
    POLICY.check(&identity, &method)?;

    let link = PageLink::from_request(&headers, &uri);
    let listing = params
        .paginate(state.store.posts(), state.config.page_size_max, &link)
        .map(|post| PostResponse::render(post, &state.store));

    Ok(Json(listing))
}

/// POST /v1/posts/
/// Headers: Authorization: Bearer <token>
/// Body: { "text": "...", "image": "...", "group": 1 }
async fn create_post(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
    body: Payload,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    POLICY.check(&identity, &method)?;
    let user = identity.user()?;

    let payload: PostRequest = body.decode()?;
    payload.check(&state.store, false)?;
    let post = state.store.create_post(payload.into_new_post(user.id));

    info!("Post created: {} by user {}", post.id, user.username);

    Ok((StatusCode::CREATED, Json(PostResponse::render(post, &state.store))))
}

/// GET /v1/posts/{post_id}/
async fn get_post(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
    Ids(id): Ids<i64>,
) -> Result<Json<PostResponse>, ApiError> {
    POLICY.check(&identity, &method)?;
    let post = state.store.post(id).ok_or(ApiError::NotFound)?;

    Ok(Json(PostResponse::render(post, &state.store)))
}

/// PUT /v1/posts/{post_id}/
async fn update_post(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
    Ids(id): Ids<i64>,
    body: Payload,
) -> Result<Json<PostResponse>, ApiError> {
    save_post(&state, &identity, &method, id, &body, false)
}

/// PATCH /v1/posts/{post_id}/
async fn partial_update_post(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
    Ids(id): Ids<i64>,
    body: Payload,
) -> Result<Json<PostResponse>, ApiError> {
    save_post(&state, &identity, &method, id, &body, true)
}

fn save_post(
    state: &AppState,
    identity: &Identity,
    method: &Method,
    id: i64,
    body: &Payload,
    partial: bool,
) -> Result<Json<PostResponse>, ApiError> {
    POLICY.check(identity, method)?;
    let post = state.store.post(id).ok_or(ApiError::NotFound)?;
    POLICY.check_object(identity, method, &post)?;

    let payload: PostRequest = body.decode()?;
    payload.check(&state.store, partial)?;
    let post = state
        .store
        .update_post(id, |post| payload.apply(post))
        .ok_or(ApiError::NotFound)?;

    info!("Post updated: {} by user {}", post.id, identity.user()?.username);

    Ok(Json(PostResponse::render(post, &state.store)))
}

/// DELETE /v1/posts/{post_id}/
/// Headers: Authorization: Bearer <token>
async fn delete_post(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
    Ids(id): Ids<i64>,
) -> Result<StatusCode, ApiError> {
    POLICY.check(&identity, &method)?;
    let post = state.store.post(id).ok_or(ApiError::NotFound)?;

    // Check ownership
    POLICY.check_object(&identity, &method, &post)?;

    state.store.delete_post(id).ok_or(ApiError::NotFound)?;

    info!("Post deleted: {} by user {}", id, identity.user()?.username);

    Ok(StatusCode::NO_CONTENT)
}
