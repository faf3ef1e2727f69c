use crate::{config::Config, store::Store};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::sync::Arc;

// ============================================================================
// APPLICATION STATE - Shared data across all requests
// ============================================================================
/// Cloned into every handler; all fields are behind `Arc`.
///
/// The store does its own locking (`DashMap` shards), the config is read-only
/// and the token limiter is lock-free.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub config: Arc<Config>,
    pub token_limiter: Arc<DefaultDirectRateLimiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let quota = Quota::per_minute(config.token_rate_per_minute);
        Self {
            store: Arc::new(Store::new()),
            config: Arc::new(config),
            token_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}
