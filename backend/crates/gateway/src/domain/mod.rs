//! Domain Layer
//!
//! Claim sets, session payloads and client identities.

pub mod claims;
pub mod client_identity;
pub mod session_payload;

// Re-exports
pub use claims::AccessClaims;
pub use client_identity::ClientIdentity;
pub use session_payload::SessionPayload;
