//! Gateway Router

use axum::{
    Router, middleware,
    routing::{get, post},
};
use platform::rate_limit::{InMemoryRateLimitStore, RateLimitStore};
use std::sync::Arc;

use crate::application::config::GatewayConfig;
use crate::presentation::handlers::{self, GatewayState};
use crate::presentation::middleware::{enforce_rate_limit, require_bearer, require_session};

/// Create the gateway router with an in-process rate limit store
pub fn gateway_router(config: GatewayConfig) -> Router {
    let state = GatewayState::new(config, Arc::new(InMemoryRateLimitStore::new()));
    gateway_router_with_state(state)
}

/// Create the gateway router around prepared state (any store implementation)
pub fn gateway_router_with_state<S>(state: GatewayState<S>) -> Router
where
    S: RateLimitStore + Send + Sync + 'static,
{
    let bearer_routes: Router<GatewayState<S>> = Router::new()
        .route("/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer::<S>,
        ));

    let session_routes: Router<GatewayState<S>> = Router::new()
        .route("/me/update", post(handlers::update_me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session::<S>,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/token", post(handlers::issue_token::<S>))
        .route("/auth/session", post(handlers::issue_session::<S>))
        .merge(bearer_routes)
        .merge(session_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_rate_limit::<S>,
        ))
        .with_state(state)
}
