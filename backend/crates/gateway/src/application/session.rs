//! Signed Session Service
//!
//! Self-contained browser sessions. The payload travels client-side as
//! `body.signature`; the server keeps no session state.

use std::time::Duration;

use chrono::{DateTime, Utc};
use platform::crypto::{SIGNATURE_SEPARATOR, SecretKey, Signer};
use serde_json::{Map, Value};

use crate::application::config::GatewayConfig;
use crate::domain::session_payload::SessionPayload;
use crate::error::{GatewayError, GatewayResult};

/// Signed session service
#[derive(Debug, Clone)]
pub struct SignedSessionService {
    signer: Signer,
    max_age_secs: Option<i64>,
}

impl SignedSessionService {
    pub fn new(secret: SecretKey, max_age: Option<Duration>) -> Self {
        Self {
            signer: Signer::new(secret),
            max_age_secs: max_age.map(|age| i64::try_from(age.as_secs()).unwrap_or(i64::MAX)),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.session_secret.clone(), config.session_max_age)
    }

    /// Stamp `iat`, serialize and sign
    pub fn create(&self, payload: SessionPayload) -> GatewayResult<String> {
        self.create_at(payload, Utc::now())
    }

    pub fn create_at(
        &self,
        mut payload: SessionPayload,
        now: DateTime<Utc>,
    ) -> GatewayResult<String> {
        payload.set_issued_at(now.timestamp());

        let body = serde_json::to_string(&payload)
            .map_err(|e| GatewayError::Internal(format!("Session serialization failed: {e}")))?;
        let signature = self.signer.sign(body.as_bytes());

        Ok(format!("{body}{SIGNATURE_SEPARATOR}{signature}"))
    }

    /// Check the signature, then parse the body
    ///
    /// The body is never parsed before its signature has been verified.
    pub fn verify(&self, session: &str) -> GatewayResult<SessionPayload> {
        self.verify_at(session, Utc::now())
    }

    pub fn verify_at(&self, session: &str, now: DateTime<Utc>) -> GatewayResult<SessionPayload> {
        let Some((body, signature)) = session.rsplit_once(SIGNATURE_SEPARATOR) else {
            return Err(reject("malformed"));
        };

        if !self.signer.verify(body.as_bytes(), signature) {
            return Err(reject("bad signature"));
        }

        let payload = serde_json::from_str::<Map<String, Value>>(body)
            .map(SessionPayload::from)
            .map_err(|_| reject("unparseable body"))?;

        if let Some(max_age) = self.max_age_secs {
            let fresh = payload
                .issued_at()
                .is_some_and(|iat| iat >= now.timestamp().saturating_sub(max_age));
            if !fresh {
                return Err(reject("expired"));
            }
        }

        Ok(payload)
    }
}

fn reject(reason: &'static str) -> GatewayError {
    tracing::warn!(reason, "Session rejected");
    GatewayError::InvalidSession
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> SignedSessionService {
        SignedSessionService::new(SecretKey::from("session-secret"), None)
    }

    #[test]
    fn test_create_and_verify() {
        let sessions = service();
        let now = Utc::now();
        let mut payload = SessionPayload::for_subject("alice");
        payload.insert("theme", json!("dark"));

        let session = sessions.create_at(payload, now).unwrap();
        let verified = sessions.verify(&session).unwrap();

        assert_eq!(verified.subject(), Some("alice"));
        assert_eq!(verified.get("theme"), Some(&json!("dark")));
        assert_eq!(verified.issued_at(), Some(now.timestamp()));
    }

    #[test]
    fn test_wire_format() {
        let sessions = service();
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let session = sessions
            .create_at(SessionPayload::for_subject("alice"), now)
            .unwrap();

        let (body, signature) = session.rsplit_once('.').unwrap();
        assert_eq!(body, r#"{"iat":1700000000,"sub":"alice"}"#);
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_flipping_any_byte_fails() {
        let sessions = service();
        let session = sessions
            .create(SessionPayload::for_subject("alice"))
            .unwrap();

        for i in 0..session.len() {
            let mut bytes = session.clone().into_bytes();
            bytes[i] ^= 0x01;
            let Ok(tampered) = String::from_utf8(bytes) else {
                continue;
            };
            assert!(
                sessions.verify(&tampered).is_err(),
                "tampering at byte {i} went unnoticed"
            );
        }
    }

    #[test]
    fn test_swapped_body_fails() {
        let sessions = service();
        let alice = sessions
            .create(SessionPayload::for_subject("alice"))
            .unwrap();
        let mallory = sessions
            .create(SessionPayload::for_subject("mallory"))
            .unwrap();

        let (_, alice_sig) = alice.rsplit_once('.').unwrap();
        let (mallory_body, _) = mallory.rsplit_once('.').unwrap();

        assert!(sessions.verify(&format!("{mallory_body}.{alice_sig}")).is_err());
    }

    #[test]
    fn test_malformed_sessions() {
        let sessions = service();
        for input in ["", "no-separator", "{}.", ".abc", "garbage.garbage"] {
            assert!(matches!(
                sessions.verify(input),
                Err(GatewayError::InvalidSession)
            ));
        }
    }

    #[test]
    fn test_payload_without_subject_round_trips() {
        let sessions = service();
        let mut payload = SessionPayload::new();
        payload.insert("theme", json!("dark"));
        payload.insert("prefs", json!({"lang": "ja", "size": 3}));
        payload.insert("visits", json!(7));

        let session = sessions.create(payload).unwrap();
        let verified = sessions.verify(&session).unwrap();

        assert_eq!(verified.subject(), None);
        assert_eq!(verified.get("theme"), Some(&json!("dark")));
        assert_eq!(verified.get("prefs"), Some(&json!({"lang": "ja", "size": 3})));
        assert_eq!(verified.get("visits"), Some(&json!(7)));
        assert!(verified.issued_at().is_some());
    }

    #[test]
    fn test_signed_but_not_an_object() {
        let sessions = service();
        let signer = Signer::new(SecretKey::from("session-secret"));

        for body in ["[1,2,3]", "42", "not json", r#""alice""#] {
            let forged = format!("{body}.{}", signer.sign(body.as_bytes()));
            assert!(sessions.verify(&forged).is_err());
        }
    }

    #[test]
    fn test_other_secret_fails() {
        let session = service()
            .create(SessionPayload::for_subject("alice"))
            .unwrap();
        let other = SignedSessionService::new(SecretKey::from("other"), None);
        assert!(other.verify(&session).is_err());
    }

    #[test]
    fn test_max_age() {
        let sessions =
            SignedSessionService::new(SecretKey::from("k"), Some(Duration::from_secs(3600)));
        let created = Utc::now();
        let session = sessions
            .create_at(SessionPayload::for_subject("alice"), created)
            .unwrap();

        let just_inside = created + chrono::Duration::seconds(3600);
        let too_late = created + chrono::Duration::seconds(3601);
        assert!(sessions.verify_at(&session, just_inside).is_ok());
        assert!(sessions.verify_at(&session, too_late).is_err());
    }

    #[test]
    fn test_no_max_age_never_expires() {
        let sessions = service();
        let created = DateTime::from_timestamp(0, 0).unwrap();
        let session = sessions
            .create_at(SessionPayload::for_subject("alice"), created)
            .unwrap();

        assert!(sessions.verify(&session).is_ok());
    }
}
