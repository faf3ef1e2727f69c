use crate::{AppState, errors::ApiError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

/// Rejects requests once the token endpoint's per-minute quota is spent.
pub async fn throttle(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.token_limiter.check().is_err() {
        warn!("Throttled {} {}", request.method(), request.uri().path());
        return Err(ApiError::Throttled);
    }

    Ok(next.run(request).await)
}
