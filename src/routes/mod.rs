mod comment;
mod follow;
mod group;
mod health;
mod post;
mod user;

use crate::{AppState, errors::ApiError};
use axum::{
    Router,
    extract::{FromRequestParts, Path},
    http::{Method, request::Parts},
    routing::get,
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Every route the service answers, with state attached.
pub fn router(state: AppState) -> Router {
    let v1 = Router::new()
        .merge(post::routes())
        .merge(comment::routes())
        .merge(group::routes())
        .merge(follow::routes())
        .merge(user::routes(state.clone()));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/v1", v1)
        .fallback(not_found)
        .with_state(state)
}

/// Numeric path parameters. Anything that does not parse is a missing resource.
#[derive(Debug)]
pub struct Ids<T>(pub T);

impl<S, T> FromRequestParts<S> for Ids<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(ids)| Ids(ids))
            .map_err(|rejection| {
                debug!("Unroutable path parameters: {}", rejection);
                ApiError::NotFound
            })
    }
}

/// Fallback for verbs a route does not serve.
pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
