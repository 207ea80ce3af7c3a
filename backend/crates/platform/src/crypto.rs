//! Cryptographic Utilities
//!
//! The HMAC-SHA256 signing primitive shared by every signed artifact the
//! gateway hands out, plus secret handling and OS randomness.
//!
//! Signed values use the wire form `raw.hexdigest`. The digest is always
//! [`DIGEST_HEX_LEN`] hex characters and never contains the separator, so
//! splitting on the last `.` is unambiguous.

use std::fmt;

use base64::{Engine, engine::general_purpose};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Length of a hex-encoded HMAC-SHA256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// Separator between a value and its digest
pub const SIGNATURE_SEPARATOR: char = '.';

/// Secret key material, wiped from memory when dropped
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Generate a random key (for development setups without configured secrets)
    pub fn generate(len: usize) -> Self {
        Self(random_bytes(len))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

impl From<&str> for SecretKey {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<String> for SecretKey {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

// HMAC accepts keys of any length; new_from_slice cannot fail here.
#[allow(clippy::expect_used)]
fn keyed_mac(secret: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size")
}

/// Compute the hex-encoded HMAC-SHA256 of `message` under `secret`
pub fn sign(message: &[u8], secret: &[u8]) -> String {
    let mut mac = keyed_mac(secret);
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Check a hex digest against `message` in constant time
///
/// Digests of the wrong length or with non-hex characters simply do not match.
pub fn verify(message: &[u8], secret: &[u8], digest: &str) -> bool {
    if digest.len() != DIGEST_HEX_LEN {
        return false;
    }
    let Ok(expected) = hex::decode(digest) else {
        return false;
    };

    let mut mac = keyed_mac(secret);
    mac.update(message);
    mac.verify_slice(&expected).is_ok()
}

/// Append a digest to `raw`, producing `raw.hexdigest`
pub fn sign_value(raw: &str, secret: &[u8]) -> String {
    format!("{raw}{SIGNATURE_SEPARATOR}{}", sign(raw.as_bytes(), secret))
}

/// Split `raw.hexdigest` on the last separator and return `raw` if the digest matches
pub fn unsign_value<'a>(signed: &'a str, secret: &[u8]) -> Option<&'a str> {
    let (raw, digest) = signed.rsplit_once(SIGNATURE_SEPARATOR)?;
    verify(raw.as_bytes(), secret, digest).then_some(raw)
}

/// Signing primitive bound to a single secret
///
/// Each signed artifact (session, CSRF token) owns its own `Signer`
/// so the secrets stay independently configurable.
#[derive(Debug, Clone)]
pub struct Signer {
    secret: SecretKey,
}

impl Signer {
    pub fn new(secret: SecretKey) -> Self {
        Self { secret }
    }

    pub fn sign(&self, message: &[u8]) -> String {
        sign(message, self.secret.as_bytes())
    }

    pub fn verify(&self, message: &[u8], digest: &str) -> bool {
        verify(message, self.secret.as_bytes(), digest)
    }

    pub fn sign_value(&self, raw: &str) -> String {
        sign_value(raw, self.secret.as_bytes())
    }

    pub fn unsign_value<'a>(&self, signed: &'a str) -> Option<&'a str> {
        unsign_value(signed, self.secret.as_bytes())
    }
}

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Generate a URL-safe token from `len` random bytes
pub fn random_token(len: usize) -> String {
    to_base64url(&random_bytes(len))
}

/// Encode bytes as URL-safe base64 without padding
pub fn to_base64url(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode URL-safe base64 without padding
pub fn from_base64url(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::URL_SAFE_NO_PAD.decode(s)
}

/// Compare two byte strings without short-circuiting on the first difference
///
/// Only the length is allowed to leak.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
