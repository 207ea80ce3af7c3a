//! Gateway (Request Authentication & Abuse Control) Module
//!
//! Clean Architecture structure:
//! - `domain/` - Claim sets, session payloads, client identities
//! - `application/` - Token, session, CSRF and rate limit services
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Features
//! - Short-lived bearer tokens (HMAC-signed JWS, `sub` + `exp`)
//! - Stateless signed sessions delivered via cookie
//! - Double-submit cookie CSRF protection for session routes
//! - Per-client sliding-window rate limiting ahead of every route
//!
//! ## Security Model
//! - Token, session and CSRF secrets are independent
//! - Every signature check is constant time
//! - Session bodies are parsed only after their signature verifies
//! - Clients see one generic message per failure category

pub mod application;
pub mod domain;
pub mod error;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{ConfigError, GatewayConfig};
pub use error::{GatewayError, GatewayResult};
pub use presentation::router::{gateway_router, gateway_router_with_state};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::identity::*;
    pub use crate::presentation::middleware::*;
}
