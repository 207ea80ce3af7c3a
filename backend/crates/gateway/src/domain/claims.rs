//! Access Token Claims

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded claim set of a validated access token
///
/// `sub` and `exp` are always present; anything else the issuer merged in
/// lands in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccessClaims {
    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extra_claims_flatten() {
        let claims: AccessClaims =
            serde_json::from_value(json!({"sub": "alice", "exp": 10, "role": "admin"})).unwrap();

        assert_eq!(claims.subject(), "alice");
        assert_eq!(claims.exp, 10);
        assert_eq!(claims.get("role"), Some(&json!("admin")));
        assert!(claims.get("sub").is_none());
    }
}
