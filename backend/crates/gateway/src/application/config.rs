//! Application Configuration
//!
//! Configuration for the gateway's signing services, cookies and rate limiter.

use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderName;
use jsonwebtoken::Algorithm;
use platform::cookie::CookieConfig;
use platform::crypto::{SecretKey, sign};
use platform::rate_limit::RateLimitConfig;
use thiserror::Error;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Length of secrets generated when none are configured
const GENERATED_SECRET_LEN: usize = 32;

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("Unsupported token algorithm {0:?} (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),
}

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Access token secret
    pub token_secret: SecretKey,
    /// Access token HMAC algorithm
    pub token_algorithm: Algorithm,
    /// Access token lifetime (30 minutes)
    pub access_token_ttl: Duration,
    /// Session secret key for HMAC signing
    pub session_secret: SecretKey,
    /// Session cookie name
    pub session_cookie_name: String,
    /// Server-side session lifetime; `None` means sessions never expire
    pub session_max_age: Option<Duration>,
    /// CSRF secret key for HMAC signing
    pub csrf_secret: SecretKey,
    /// CSRF cookie name
    pub csrf_cookie_name: String,
    /// Header echoing the CSRF cookie
    pub csrf_header_name: HeaderName,
    /// Sliding-window quota
    pub rate_limit: RateLimitConfig,
    /// How often idle rate limit buckets are swept
    pub rate_limit_sweep_interval: Duration,
    /// Key clients by `X-Forwarded-For` instead of the peer address
    pub trust_forwarded_for: bool,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            token_secret: SecretKey::generate(GENERATED_SECRET_LEN),
            token_algorithm: Algorithm::HS256,
            access_token_ttl: Duration::from_secs(30 * 60), // 30 minutes
            session_secret: SecretKey::generate(GENERATED_SECRET_LEN),
            session_cookie_name: "session".to_string(),
            session_max_age: None,
            csrf_secret: SecretKey::generate(GENERATED_SECRET_LEN),
            csrf_cookie_name: "csrf".to_string(),
            csrf_header_name: HeaderName::from_static("x-csrf-token"),
            rate_limit: RateLimitConfig::default(),
            rate_limit_sweep_interval: Duration::from_secs(60),
            trust_forwarded_for: false,
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
        }
    }
}

impl GatewayConfig {
    /// Create config for development (random secrets, insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Default::default()
        }
    }

    /// Load from the process environment
    ///
    /// Release builds refuse to start without `JWT_SECRET`; debug builds
    /// generate throwaway secrets instead.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::load(lookup, !cfg!(debug_assertions))
    }

    fn load<F>(lookup: F, require_secrets: bool) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let shared_secret = get("JWT_SECRET");
        if shared_secret.is_none() {
            if require_secrets {
                return Err(ConfigError::Missing("JWT_SECRET"));
            }
            tracing::warn!(
                "JWT_SECRET not set, using generated secrets (tokens will not survive a restart)"
            );
        }
        // Unset session/CSRF secrets get their own key derived from JWT_SECRET.
        let secret_or = |key: &str, label: &[u8], generated: SecretKey| {
            match (get(key), shared_secret.as_deref()) {
                (Some(secret), _) => SecretKey::from(secret),
                (None, Some(shared)) => derive_secret(shared, label),
                (None, None) => generated,
            }
        };

        let token_algorithm = match get("JWT_ALGORITHM") {
            Some(raw) => parse_algorithm(&raw)?,
            None => defaults.token_algorithm,
        };

        let ttl_minutes = parse_nonzero(&get, "ACCESS_TOKEN_EXPIRE_MINUTES", 30)?;
        let session_max_age = match get("SESSION_MAX_AGE_SECONDS") {
            Some(raw) => Some(Duration::from_secs(nonzero("SESSION_MAX_AGE_SECONDS", &raw)?)),
            None => None,
        };

        let csrf_header_name = match get("CSRF_HEADER_NAME") {
            Some(raw) => HeaderName::from_bytes(raw.trim().to_ascii_lowercase().as_bytes())
                .map_err(|_| ConfigError::Invalid {
                    key: "CSRF_HEADER_NAME",
                    value: raw,
                })?,
            None => defaults.csrf_header_name.clone(),
        };

        let max_requests = parse_nonzero(&get, "RATE_LIMIT_REQUESTS", 100)?;
        let max_requests = u32::try_from(max_requests).map_err(|_| ConfigError::Invalid {
            key: "RATE_LIMIT_REQUESTS",
            value: max_requests.to_string(),
        })?;
        let window_secs = parse_nonzero(&get, "RATE_LIMIT_WINDOW_SECONDS", 60)?;
        let sweep_secs = parse_nonzero(&get, "RATE_LIMIT_SWEEP_SECONDS", 60)?;

        Ok(Self {
            token_secret: shared_secret
                .clone()
                .map(SecretKey::from)
                .unwrap_or_else(|| defaults.token_secret.clone()),
            token_algorithm,
            access_token_ttl: Duration::from_secs(ttl_minutes * 60),
            session_secret: secret_or("SESSION_SECRET", b"session", defaults.session_secret.clone()),
            session_cookie_name: get("SESSION_COOKIE_NAME")
                .unwrap_or_else(|| defaults.session_cookie_name.clone()),
            session_max_age,
            csrf_secret: secret_or("CSRF_SECRET", b"csrf", defaults.csrf_secret.clone()),
            csrf_cookie_name: get("CSRF_COOKIE_NAME")
                .unwrap_or_else(|| defaults.csrf_cookie_name.clone()),
            csrf_header_name,
            rate_limit: RateLimitConfig::new(max_requests, window_secs),
            rate_limit_sweep_interval: Duration::from_secs(sweep_secs),
            trust_forwarded_for: parse_bool(&get, "RATE_LIMIT_TRUST_FORWARDED_FOR", false)?,
            cookie_secure: parse_bool(&get, "COOKIE_SECURE", true)?,
            cookie_same_site: defaults.cookie_same_site,
        })
    }

    /// Session max-age in whole seconds, if configured
    pub fn session_max_age_secs(&self) -> Option<i64> {
        self.session_max_age
            .map(|age| i64::try_from(age.as_secs()).unwrap_or(i64::MAX))
    }

    /// Attributes of the HttpOnly session cookie
    pub fn session_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.session_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: self.session_max_age_secs(),
        }
    }

    /// Attributes of the CSRF cookie (readable by client script)
    pub fn csrf_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.csrf_cookie_name.clone(),
            http_only: false,
            ..self.session_cookie()
        }
    }
}

/// Accept only the HMAC family; the token secret is symmetric
fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    match Algorithm::from_str(raw.trim()) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        _ => Err(ConfigError::UnsupportedAlgorithm(raw.to_string())),
    }
}

fn nonzero(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        }),
    }
}

fn parse_nonzero<G>(get: &G, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    get(key).map_or(Ok(default), |raw| nonzero(key, &raw))
}

fn parse_bool<G>(get: &G, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}

/// Per-purpose key: hex HMAC of `label` under the shared secret
fn derive_secret(shared: &str, label: &[u8]) -> SecretKey {
    SecretKey::from(sign(label, shared.as_bytes()))
}
