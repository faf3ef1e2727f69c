use tracing::info;
use tracing_subscriber::EnvFilter;
use yatube_api::{AppState, app, config::Config, seed};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("yatube_api=info,tower_http=info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env().expect("invalid configuration");
    let addr = config.bind_addr.clone();
    let state = AppState::new(config);

    if let Some(path) = state.config.groups_file.clone() {
        let count = seed::load_groups(&state.store, &path).expect("failed to seed groups");
        info!("Seeded {} groups from {}", count, path.display());
    }

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listen address");

    info!("Server running on http://{}", addr);
    info!("API Endpoints:");
    info!("  GET    /health                              - Health check");
    info!("  POST   /v1/users/                           - Create account");
    info!("  POST   /v1/jwt/create/                      - Obtain tokens");
    info!("  GET    /v1/posts/                           - List posts (?limit&offset)");
    info!("  POST   /v1/posts/                           - Create post (auth)");
    info!("  *      /v1/posts/{{id}}/                      - Read, or edit as author");
    info!("  *      /v1/posts/{{post_id}}/comments/        - Comments on a post");
    info!("  GET    /v1/groups/                          - List groups");
    info!("  GET    /v1/follow/                          - Own follows (auth, ?search)");

    axum::serve(listener, app(state)).await.expect("server error");
}
