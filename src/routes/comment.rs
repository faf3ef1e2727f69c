use super::{Ids, method_not_allowed};
use crate::{
    AppState,
    auth::Identity,
    dto::{CommentRequest, CommentResponse, Payload},
    errors::ApiError,
    models::Comment,
    permissions::Policy,
};
use axum::{
    Json, Router,
    extract::State,
    http::{Method, StatusCode},
    routing::get,
};
use tracing::info;

const POLICY: Policy = Policy::AuthorOrReadOnly;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/posts/{post_id}/comments/",
            get(list_comments)
                .post(create_comment)
                .fallback(method_not_allowed),
        )
        .route(
            "/posts/{post_id}/comments/{id}/",
            get(get_comment)
                .put(update_comment)
                .patch(partial_update_comment)
                .delete(delete_comment)
                .fallback(method_not_allowed),
        )
}

/// Comment operations only proceed under a post that exists.
fn require_post(state: &AppState, post_id: i64) -> Result<(), ApiError> {
    state
        .store
        .post(post_id)
        .map(|_| ())
        .ok_or(ApiError::NotFound)
}

fn find_comment(state: &AppState, post_id: i64, id: i64) -> Result<Comment, ApiError> {
    require_post(state, post_id)?;
    state.store.comment(post_id, id).ok_or(ApiError::NotFound)
}

/// GET /v1/posts/{post_id}/comments/
async fn list_comments(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
    Ids(post_id): Ids<i64>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    POLICY.check(&identity, &method)?;
    require_post(&state, post_id)?;

    let comments = state
        .store
        .comments_for(post_id)
        .into_iter()
        .map(|comment| CommentResponse::render(comment, &state.store))
        .collect();

    Ok(Json(comments))
}

/// POST /v1/posts/{post_id}/comments/
/// Headers: Authorization: Bearer <token>
/// Body: { "text": "..." }
async fn create_comment(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
    Ids(post_id): Ids<i64>,
    body: Payload,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    POLICY.check(&identity, &method)?;
    let user = identity.user()?;
    require_post(&state, post_id)?;

    let payload: CommentRequest = body.decode()?;
    payload.check(false)?;
    let text = payload.into_text().unwrap_or_default();
    let comment = state.store.create_comment(post_id, user.id, text)?;

    info!(
        "Comment created: {} on post {} by user {}",
        comment.id, post_id, user.username
    );

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse::render(comment, &state.store)),
    ))
}

/// GET /v1/posts/{post_id}/comments/{id}/
async fn get_comment(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
    Ids((post_id, id)): Ids<(i64, i64)>,
) -> Result<Json<CommentResponse>, ApiError> {
    POLICY.check(&identity, &method)?;
    let comment = find_comment(&state, post_id, id)?;

    Ok(Json(CommentResponse::render(comment, &state.store)))
}

/// PUT /v1/posts/{post_id}/comments/{id}/
async fn update_comment(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
    Ids((post_id, id)): Ids<(i64, i64)>,
    body: Payload,
) -> Result<Json<CommentResponse>, ApiError> {
    save_comment(&state, &identity, &method, (post_id, id), &body, false)
}

/// PATCH /v1/posts/{post_id}/comments/{id}/
async fn partial_update_comment(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
    Ids((post_id, id)): Ids<(i64, i64)>,
    body: Payload,
) -> Result<Json<CommentResponse>, ApiError> {
    save_comment(&state, &identity, &method, (post_id, id), &body, true)
}

fn save_comment(
    state: &AppState,
    identity: &Identity,
    method: &Method,
    (post_id, id): (i64, i64),
    body: &Payload,
    partial: bool,
) -> Result<Json<CommentResponse>, ApiError> {
    POLICY.check(identity, method)?;
    let comment = find_comment(state, post_id, id)?;
    POLICY.check_object(identity, method, &comment)?;

    let payload: CommentRequest = body.decode()?;
    payload.check(partial)?;
    let comment = match payload.into_text() {
        Some(text) => state.store.update_comment(id, text).ok_or(ApiError::NotFound)?,
        None => comment,
    };

    info!("Comment updated: {} by user {}", comment.id, identity.user()?.username);

    Ok(Json(CommentResponse::render(comment, &state.store)))
}

/// DELETE /v1/posts/{post_id}/comments/{id}/
async fn delete_comment(
    State(state): State<AppState>,
    identity: Identity,
    method: Method,
    Ids((post_id, id)): Ids<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    POLICY.check(&identity, &method)?;
    let comment = find_comment(&state, post_id, id)?;
    POLICY.check_object(&identity, &method, &comment)?;

    state.store.delete_comment(id).ok_or(ApiError::NotFound)?;

    info!("Comment deleted: {} by user {}", id, identity.user()?.username);

    Ok(StatusCode::NO_CONTENT)
}
