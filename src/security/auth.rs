//! Credential extraction from the `Authorization` header.
//!
//! Scheme names compare case-insensitively; a header with any other scheme,
//! or one that fails to decode, yields `None` rather than an error.

use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Decoded `Basic` credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Parse `Authorization: Basic <base64(user:password)>`.
///
/// A missing `:password` part yields an empty password.
pub fn basic_auth(headers: &HeaderMap) -> Option<BasicCredentials> {
    let encoded = credentials_for(headers, "Basic")?;
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    let (username, password) = match decoded.split_once(':') {
        Some((user, pass)) => (user.to_string(), pass.to_string()),
        None => (decoded, String::new()),
    };
    Some(BasicCredentials { username, password })
}

/// Parse `Authorization: Bearer <token>`, returning the raw token.
pub fn bearer_auth(headers: &HeaderMap) -> Option<String> {
    credentials_for(headers, "Bearer").map(str::to_string)
}

fn credentials_for<'a>(headers: &'a HeaderMap, scheme: &str) -> Option<&'a str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (name, rest) = value.split_once(' ')?;
    if !name.eq_ignore_ascii_case(scheme) {
        return None;
    }
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn basic_decodes_user_and_password() {
        let creds = basic_auth(&headers(&format!("Basic {}", STANDARD.encode("alice:s3cret:x"))))
            .unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "s3cret:x");
    }

    #[test]
    fn basic_without_password() {
        let creds = basic_auth(&headers(&format!("Basic {}", STANDARD.encode("bob")))).unwrap();
        assert_eq!(creds.username, "bob");
        assert_eq!(creds.password, "");
    }

    #[test]
    fn basic_rejects_garbage() {
        assert_eq!(basic_auth(&headers("Basic !!!not-base64")), None);
        assert_eq!(basic_auth(&headers("Basic")), None);
        assert_eq!(basic_auth(&HeaderMap::new()), None);
    }

    #[test]
    fn bearer_returns_raw_token() {
        assert_eq!(
            bearer_auth(&headers("Bearer abc.def.ghi")).as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(
            bearer_auth(&headers("bearer lower")).as_deref(),
            Some("lower")
        );
    }

    #[test]
    fn wrong_scheme_is_absent() {
        let basic = headers(&format!("Basic {}", STANDARD.encode("a:b")));
        assert_eq!(bearer_auth(&basic), None);
        assert_eq!(basic_auth(&headers("Bearer token")), None);
    }
}
