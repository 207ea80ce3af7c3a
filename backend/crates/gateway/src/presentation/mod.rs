//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, middleware and client identity strategies.

pub mod dto;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod router;

pub use handlers::GatewayState;
pub use identity::{ClientIdentityExtractor, ForwardedForIdentity, RemoteAddrIdentity};
pub use middleware::{AuthenticatedSubject, enforce_rate_limit, require_bearer, require_session};
pub use router::{gateway_router, gateway_router_with_state};
