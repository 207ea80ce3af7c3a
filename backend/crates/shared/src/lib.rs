//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" shared by every gateway crate:
//! - Common error types and result aliases
//! - Problem-details rendering of errors at the HTTP boundary
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all crates.

pub mod error {
    pub mod app_error;
    pub mod kind;
    #[cfg(feature = "axum")]
    pub mod response;
}
