//! Cookie Management Infrastructure
//!
//! Cookie attributes, `Set-Cookie` rendering and request cookie lookup.
//! Values that may contain characters outside RFC 6265 cookie-octets
//! (quotes, commas, spaces) go through [`encode_cookie_value`] first.

use std::fmt::{self, Write};

use axum::http::{HeaderMap, HeaderValue, header};

use crate::crypto::{from_base64url, to_base64url};

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        })
    }
}

/// Attributes of one named cookie
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    /// Must be false for cookies that client script has to read back
    pub http_only: bool,
    pub same_site: SameSite,
    pub path: String,
    /// `None` makes it a browser-session cookie
    pub max_age_secs: Option<i64>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age_secs: None,
        }
    }
}

impl CookieConfig {
    /// Render `name=value` plus attributes for a `Set-Cookie` header
    pub fn build_set_cookie(&self, value: &str) -> String {
        let mut cookie = format!("{}={value}; Path={}", self.name, self.path);

        // Writing into a String cannot fail.
        let _ = write!(cookie, "; SameSite={}", self.same_site);
        if let Some(max_age) = self.max_age_secs {
            let _ = write!(cookie, "; Max-Age={max_age}");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }

        cookie
    }
}

/// Look up a cookie by name across every `Cookie` header of the request
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Render a `Set-Cookie` header value
///
/// Returns `None` if the rendered cookie is not a valid header value.
pub fn set_cookie_header(config: &CookieConfig, value: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&config.build_set_cookie(value)).ok()
}

/// Wrap an arbitrary string so it only uses cookie-octets
pub fn encode_cookie_value(value: &str) -> String {
    to_base64url(value.as_bytes())
}

/// Reverse of [`encode_cookie_value`]
pub fn decode_cookie_value(value: &str) -> Option<String> {
    let bytes = from_base64url(value).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let config = CookieConfig {
            path: "/api".to_string(),
            max_age_secs: Some(3600),
            ..Default::default()
        };

        assert_eq!(
            config.build_set_cookie("v1"),
            "session=v1; Path=/api; SameSite=Lax; Max-Age=3600; Secure; HttpOnly"
        );
    }

    #[test]
    fn test_script_readable_cookie() {
        let config = CookieConfig {
            name: "csrf".to_string(),
            secure: false,
            http_only: false,
            same_site: SameSite::Strict,
            ..Default::default()
        };

        assert_eq!(
            config.build_set_cookie("token"),
            "csrf=token; Path=/; SameSite=Strict"
        );
    }

    #[test]
    fn test_extract_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("foo=bar; session=abc123; other=xyz"),
        );

        assert_eq!(
            extract_cookie(&headers, "session"),
            Some("abc123".to_string())
        );
        assert_eq!(extract_cookie(&headers, "foo"), Some("bar".to_string()));
        assert_eq!(extract_cookie(&headers, "sess"), None);
        assert_eq!(extract_cookie(&HeaderMap::new(), "session"), None);
    }

    #[test]
    fn test_extract_cookie_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("session=abc"));
        headers.append(header::COOKIE, HeaderValue::from_static("csrf=def.123"));

        assert_eq!(extract_cookie(&headers, "csrf"), Some("def.123".to_string()));
    }

    #[test]
    fn test_cookie_value_encoding() {
        let raw = r#"{"iat":1,"sub":"alice, bob"}.abcdef"#;
        let encoded = encode_cookie_value(raw);
        assert!(!encoded.contains(['"', ',', ';', ' ']));
        assert_eq!(decode_cookie_value(&encoded).as_deref(), Some(raw));
        assert_eq!(decode_cookie_value("not base64!"), None);
    }

    #[test]
    fn test_set_cookie_header() {
        let config = CookieConfig::default();
        assert!(set_cookie_header(&config, "ok").is_some());
        assert!(set_cookie_header(&config, "bad\nvalue").is_none());
    }
}
