//! Application Layer
//!
//! Signing services, rate limiter and configuration.

pub mod access_token;
pub mod config;
pub mod csrf;
pub mod rate_limit;
pub mod session;

// Re-exports
pub use access_token::AccessTokenService;
pub use config::{ConfigError, GatewayConfig};
pub use csrf::CsrfGuard;
pub use rate_limit::{Admission, RateLimiter};
pub use session::SignedSessionService;
