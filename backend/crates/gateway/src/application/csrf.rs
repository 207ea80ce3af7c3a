//! CSRF Guard
//!
//! Double-submit cookie defense. The same signed token is set as a cookie
//! and must be echoed back in a request header; a cross-site page can make
//! the browser send the cookie but cannot read it to forge the header.

use platform::crypto::{SecretKey, Signer, constant_time_eq, random_token};

use crate::application::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};

/// Random bytes per CSRF token (256 bits)
pub const CSRF_TOKEN_BYTES: usize = 32;

/// CSRF guard
#[derive(Debug, Clone)]
pub struct CsrfGuard {
    signer: Signer,
}

impl CsrfGuard {
    pub fn new(secret: SecretKey) -> Self {
        Self {
            signer: Signer::new(secret),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.csrf_secret.clone())
    }

    /// Fresh signed token: `base64url(32 random bytes).hexdigest`
    pub fn issue_token(&self) -> String {
        self.signer.sign_value(&random_token(CSRF_TOKEN_BYTES))
    }

    /// Validate the cookie token against the header token
    pub fn validate(&self, cookie_token: &str, header_token: &str) -> GatewayResult<()> {
        if cookie_token.is_empty() || header_token.is_empty() {
            return Err(GatewayError::MissingCsrfToken);
        }

        let cookie_raw = self
            .signer
            .unsign_value(cookie_token)
            .ok_or(GatewayError::InvalidCsrfSignature)?;
        let header_raw = self
            .signer
            .unsign_value(header_token)
            .ok_or(GatewayError::InvalidCsrfSignature)?;

        if !constant_time_eq(cookie_raw.as_bytes(), header_raw.as_bytes()) {
            return Err(GatewayError::CsrfMismatch);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> CsrfGuard {
        CsrfGuard::new(SecretKey::from("csrf-secret"))
    }

    #[test]
    fn test_same_token_validates() {
        let guard = guard();
        let token = guard.issue_token();
        assert!(guard.validate(&token, &token).is_ok());
    }

    #[test]
    fn test_token_shape() {
        let token = guard().issue_token();
        let (raw, digest) = token.rsplit_once('.').unwrap();
        assert_eq!(raw.len(), 43);
        assert_eq!(digest.len(), 64);
    }

    #[test]
    fn test_distinct_tokens_mismatch() {
        let guard = guard();
        let a = guard.issue_token();
        let b = guard.issue_token();

        assert_ne!(a, b);
        assert!(matches!(
            guard.validate(&a, &b),
            Err(GatewayError::CsrfMismatch)
        ));
    }

    #[test]
    fn test_missing_tokens() {
        let guard = guard();
        let token = guard.issue_token();

        for (cookie, header) in [("", token.as_str()), (token.as_str(), ""), ("", "")] {
            assert!(matches!(
                guard.validate(cookie, header),
                Err(GatewayError::MissingCsrfToken)
            ));
        }
    }

    #[test]
    fn test_unsigned_or_foreign_tokens() {
        let guard = guard();
        let token = guard.issue_token();
        let foreign = CsrfGuard::new(SecretKey::from("other")).issue_token();
        let (raw, _) = token.rsplit_once('.').unwrap();

        for bad in [raw, foreign.as_str(), "plain"] {
            assert!(matches!(
                guard.validate(&token, bad),
                Err(GatewayError::InvalidCsrfSignature)
            ));
            assert!(matches!(
                guard.validate(bad, &token),
                Err(GatewayError::InvalidCsrfSignature)
            ));
        }
    }
}
