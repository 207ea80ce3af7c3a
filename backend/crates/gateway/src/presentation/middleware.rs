//! Gateway Middleware
//!
//! Rate limiting for every route, then bearer or session + CSRF
//! authorization depending on the route's trust model.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Request, header};
use axum::middleware::Next;
use axum::response::Response;
use platform::cookie::{decode_cookie_value, extract_cookie};
use platform::rate_limit::RateLimitStore;

use crate::error::GatewayError;
use crate::presentation::handlers::GatewayState;

/// Header reporting the quota left after an admitted request
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Subject authorized by bearer token or session, stored in request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSubject(pub String);

/// Middleware that admits or rejects the request before anything else runs
pub async fn enforce_rate_limit<S>(
    State(state): State<GatewayState<S>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GatewayError>
where
    S: RateLimitStore + Send + Sync + 'static,
{
    let identity = state.identity.identify_or_unknown(&req);
    let admission = state.limiter.check(&identity).await?;

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(RATE_LIMIT_REMAINING, HeaderValue::from(admission.remaining));
    Ok(response)
}

/// Middleware that requires a valid `Authorization: Bearer` token
pub async fn require_bearer<S>(
    State(state): State<GatewayState<S>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, GatewayError>
where
    S: RateLimitStore + Send + Sync + 'static,
{
    let token = bearer_token(req.headers()).ok_or(GatewayError::InvalidToken)?;
    let claims = state.tokens.validate(token)?;

    req.extensions_mut()
        .insert(AuthenticatedSubject(claims.sub.clone()));
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Middleware that requires a valid session cookie and a matching CSRF pair
pub async fn require_session<S>(
    State(state): State<GatewayState<S>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, GatewayError>
where
    S: RateLimitStore + Send + Sync + 'static,
{
    let headers = req.headers();

    let session = extract_cookie(headers, &state.config.session_cookie_name)
        .and_then(|value| decode_cookie_value(&value))
        .ok_or(GatewayError::InvalidSession)?;
    let payload = state.sessions.verify(&session)?;

    let cookie_token = extract_cookie(headers, &state.config.csrf_cookie_name).unwrap_or_default();
    let header_token = headers
        .get(&state.config.csrf_header_name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    state.csrf.validate(&cookie_token, header_token)?;

    let subject = payload
        .subject()
        .filter(|subject| !subject.is_empty())
        .map(str::to_owned)
        .ok_or(GatewayError::InvalidSession)?;

    req.extensions_mut().insert(AuthenticatedSubject(subject));
    req.extensions_mut().insert(payload);

    Ok(next.run(req).await)
}

/// Token from `Authorization: Bearer <token>` (scheme is case-insensitive)
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(authorization: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(authorization));
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("BEARER  abc ")), Some("abc"));
    }

    #[test]
    fn test_bearer_token_rejects_garbage() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("abc")), None);
    }
}
