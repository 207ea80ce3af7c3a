//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but request-level
//! errors go through `gateway::GatewayError` / `kernel::error::AppError`.

use axum::{
    Router, http,
    http::{Method, header},
};
use gateway::{GatewayConfig, gateway_router_with_state, handlers::GatewayState};
use platform::rate_limit::InMemoryRateLimitStore;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Gateway configuration (release builds require JWT_SECRET)
    let config = GatewayConfig::from_env()?;
    let csrf_header = config.csrf_header_name.clone();
    let sweep_interval = config.rate_limit_sweep_interval;

    tracing::info!(
        algorithm = ?config.token_algorithm,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window.as_secs(),
        trust_forwarded_for = config.trust_forwarded_for,
        session_max_age_secs = ?config.session_max_age_secs(),
        "Gateway configured"
    );

    // Rate limit store, swept periodically so idle clients do not pile up
    let store = Arc::new(InMemoryRateLimitStore::new());
    let state = GatewayState::new(config, store);
    let _sweeper = state.limiter.clone().spawn_sweeper(sweep_interval);

    // CORS configuration
    let frontend_origins =
        env::var("FRONTEND_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            csrf_header,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .merge(gateway_router_with_state(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
        .parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
