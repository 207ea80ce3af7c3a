//! Access Token Service
//!
//! Issues and validates short-lived bearer tokens (JWS compact form).
//! Tokens are stateless: validity is signature plus expiry, nothing is stored
//! and nothing can be revoked before `exp`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use platform::crypto::SecretKey;
use serde_json::{Map, Value};

use crate::application::config::GatewayConfig;
use crate::domain::claims::AccessClaims;
use crate::error::{GatewayError, GatewayResult};

/// Access token service
#[derive(Clone)]
pub struct AccessTokenService {
    algorithm: Algorithm,
    ttl_secs: i64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AccessTokenService {
    pub fn new(secret: &SecretKey, algorithm: Algorithm, ttl: Duration) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            algorithm,
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            &config.token_secret,
            config.token_algorithm,
            config.access_token_ttl,
        )
    }

    /// Issue a token for `subject`, expiring one TTL from now
    ///
    /// `extra_claims` are merged last and may overwrite `sub` or `exp`.
    pub fn issue(
        &self,
        subject: &str,
        extra_claims: Option<&Map<String, Value>>,
    ) -> GatewayResult<String> {
        self.issue_at(subject, extra_claims, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        extra_claims: Option<&Map<String, Value>>,
        now: DateTime<Utc>,
    ) -> GatewayResult<String> {
        if subject.is_empty() {
            return Err(GatewayError::InvalidSubject);
        }

        let mut claims = Map::new();
        claims.insert("sub".to_string(), Value::from(subject));
        claims.insert(
            "exp".to_string(),
            Value::from(now.timestamp().saturating_add(self.ttl_secs)),
        );
        if let Some(extra) = extra_claims {
            claims.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| GatewayError::Internal(format!("Token encoding failed: {e}")))
    }

    /// Verify signature and expiry in one step
    ///
    /// Every failure collapses into [`GatewayError::InvalidToken`].
    pub fn validate(&self, token: &str) -> GatewayResult<AccessClaims> {
        let data = jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(reason = ?e.kind(), "Access token rejected");
                GatewayError::InvalidToken
            })?;

        if data.claims.sub.is_empty() {
            tracing::debug!("Access token rejected: empty subject");
            return Err(GatewayError::InvalidToken);
        }

        Ok(data.claims)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}
