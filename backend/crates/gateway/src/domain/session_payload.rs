//! Session Payload
//!
//! The JSON object carried inside a signed session.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claim holding the session owner
pub const SUBJECT_CLAIM: &str = "sub";

/// Claim stamped with the creation time (Unix seconds)
pub const ISSUED_AT_CLAIM: &str = "iat";

/// Arbitrary JSON object with well-known `sub` / `iat` keys
///
/// Serialization goes through `serde_json::Map`, which keeps keys sorted,
/// so the same payload always produces the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionPayload(Map<String, Value>);

impl SessionPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload holding only a subject
    pub fn for_subject(subject: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(SUBJECT_CLAIM.to_string(), Value::String(subject.into()));
        Self(map)
    }

    pub fn subject(&self) -> Option<&str> {
        self.0.get(SUBJECT_CLAIM).and_then(Value::as_str)
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.0.get(ISSUED_AT_CLAIM).and_then(Value::as_i64)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub(crate) fn set_issued_at(&mut self, iat: i64) {
        self.0.insert(ISSUED_AT_CLAIM.to_string(), Value::from(iat));
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for SessionPayload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialization_is_sorted_and_compact() {
        let mut payload = SessionPayload::for_subject("alice");
        payload.insert("role", json!("admin"));
        payload.set_issued_at(1_700_000_000);

        let body = serde_json::to_string(&payload).unwrap();
        assert_eq!(body, r#"{"iat":1700000000,"role":"admin","sub":"alice"}"#);
    }

    #[test]
    fn test_accessors() {
        let payload = SessionPayload::from(
            json!({"sub": "bob", "iat": 5})
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert_eq!(payload.subject(), Some("bob"));
        assert_eq!(payload.issued_at(), Some(5));
        assert_eq!(SessionPayload::new().subject(), None);
    }
}
