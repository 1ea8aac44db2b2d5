use std::sync::Arc;

use axum::Router;
use identity_gateway::auth::{IdentityResolver, JwksVerifier};
use identity_gateway::config::Config;
use identity_gateway::store::SqliteUserStore;
use identity_gateway::{logging, routes, AppState};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Identity Gateway");

    // Initialize components
    let jwks = JwksVerifier::new(&config.oidc.issuer).await?;
    let users = Arc::new(SqliteUserStore::new(&config.database.url)?);
    let resolver = IdentityResolver::new(users.clone());

    let state = Arc::new(AppState {
        config: config.clone(),
        jwks,
        users,
        resolver,
    });

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::me::router(state.clone()))
        .nest("/api/v1/admin", routes::admin::router(state.clone()))
        .layer(axum::middleware::from_fn(logging::request_logger))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
