//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

// ============================================================================
// Issuance
// ============================================================================

/// `?username=` query for token and session issuance
#[derive(Debug, Clone, Deserialize)]
pub struct UsernameQuery {
    pub username: String,
}

/// Bearer token response
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always "bearer"
    pub token_type: &'static str,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

/// Session created response
#[derive(Debug, Clone, Serialize)]
pub struct SessionCreatedResponse {
    pub status: &'static str,
}

// ============================================================================
// Protected
// ============================================================================

/// Current user response
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user: String,
}

/// Update response
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResponse {
    pub user: String,
    pub updated: bool,
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
