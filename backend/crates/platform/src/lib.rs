//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - HMAC-SHA256 signing primitive, secret keys and OS randomness
//! - Cookie management
//! - Client address extraction
//! - Sliding-window rate limiting infrastructure

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod rate_limit;
