//! HTTP Handlers

use axum::Json;
use axum::extract::{Extension, Query, State};
use axum::http::header;
use axum::response::{AppendHeaders, IntoResponse};
use platform::cookie::{encode_cookie_value, set_cookie_header};
use platform::rate_limit::{InMemoryRateLimitStore, RateLimitStore};
use std::sync::Arc;

use crate::application::{
    AccessTokenService, CsrfGuard, GatewayConfig, RateLimiter, SignedSessionService,
};
use crate::domain::session_payload::SessionPayload;
use crate::error::{GatewayError, GatewayResult};
use crate::presentation::dto::{
    HealthResponse, SessionCreatedResponse, TokenResponse, UpdateResponse, UserResponse,
    UsernameQuery,
};
use crate::presentation::identity::{
    ClientIdentityExtractor, ForwardedForIdentity, RemoteAddrIdentity,
};
use crate::presentation::middleware::AuthenticatedSubject;

/// Shared state for gateway handlers and middleware
pub struct GatewayState<S = InMemoryRateLimitStore>
where
    S: RateLimitStore + Send + Sync + 'static,
{
    pub tokens: Arc<AccessTokenService>,
    pub sessions: Arc<SignedSessionService>,
    pub csrf: Arc<CsrfGuard>,
    pub limiter: RateLimiter<S>,
    pub identity: Arc<dyn ClientIdentityExtractor>,
    pub config: Arc<GatewayConfig>,
}

impl<S> Clone for GatewayState<S>
where
    S: RateLimitStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            tokens: self.tokens.clone(),
            sessions: self.sessions.clone(),
            csrf: self.csrf.clone(),
            limiter: self.limiter.clone(),
            identity: self.identity.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S> GatewayState<S>
where
    S: RateLimitStore + Send + Sync + 'static,
{
    /// Wire every service from `config` around the given rate limit store
    pub fn new(config: GatewayConfig, store: Arc<S>) -> Self {
        let identity: Arc<dyn ClientIdentityExtractor> = if config.trust_forwarded_for {
            Arc::new(ForwardedForIdentity)
        } else {
            Arc::new(RemoteAddrIdentity)
        };

        Self {
            tokens: Arc::new(AccessTokenService::from_config(&config)),
            sessions: Arc::new(SignedSessionService::from_config(&config)),
            csrf: Arc::new(CsrfGuard::from_config(&config)),
            limiter: RateLimiter::new(store, config.rate_limit),
            identity,
            config: Arc::new(config),
        }
    }

    /// Replace the client identity strategy
    pub fn with_identity(mut self, identity: impl ClientIdentityExtractor + 'static) -> Self {
        self.identity = Arc::new(identity);
        self
    }
}

// ============================================================================
// Public
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// POST /auth/token?username=
pub async fn issue_token<S>(
    State(state): State<GatewayState<S>>,
    Query(query): Query<UsernameQuery>,
) -> GatewayResult<Json<TokenResponse>>
where
    S: RateLimitStore + Send + Sync + 'static,
{
    let token = state.tokens.issue(&query.username, None)?;
    tracing::info!(user = %query.username, "Access token issued");

    Ok(Json(TokenResponse::bearer(token)))
}

/// POST /auth/session?username=
///
/// Sets the HttpOnly session cookie and a script-readable CSRF cookie.
pub async fn issue_session<S>(
    State(state): State<GatewayState<S>>,
    Query(query): Query<UsernameQuery>,
) -> GatewayResult<impl IntoResponse>
where
    S: RateLimitStore + Send + Sync + 'static,
{
    if query.username.is_empty() {
        return Err(GatewayError::InvalidSubject);
    }

    let session = state
        .sessions
        .create(SessionPayload::for_subject(query.username.as_str()))?;
    let csrf_token = state.csrf.issue_token();

    let session_cookie = set_cookie_header(
        &state.config.session_cookie(),
        &encode_cookie_value(&session),
    )
    .ok_or_else(|| GatewayError::Internal("Invalid session cookie".to_string()))?;
    let csrf_cookie = set_cookie_header(&state.config.csrf_cookie(), &csrf_token)
        .ok_or_else(|| GatewayError::Internal("Invalid CSRF cookie".to_string()))?;

    tracing::info!(user = %query.username, "Session created");

    Ok((
        AppendHeaders([
            (header::SET_COOKIE, session_cookie),
            (header::SET_COOKIE, csrf_cookie),
        ]),
        Json(SessionCreatedResponse {
            status: "session_created",
        }),
    ))
}

// ============================================================================
// Protected
// ============================================================================

/// GET /me (bearer)
pub async fn me(Extension(subject): Extension<AuthenticatedSubject>) -> Json<UserResponse> {
    Json(UserResponse { user: subject.0 })
}

/// POST /me/update (session + CSRF)
pub async fn update_me(
    Extension(subject): Extension<AuthenticatedSubject>,
) -> Json<UpdateResponse> {
    Json(UpdateResponse {
        user: subject.0,
        updated: true,
    })
}
