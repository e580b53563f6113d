use base64::{engine::general_purpose, Engine as _};
use http::HeaderValue;
use serde::Deserialize;
use std::fmt;

use crate::utils::{ProxyError, Result};

const BASIC_PREFIX: &[u8] = b"Basic ";

/// A username/password pair. Equality is exact and case-sensitive.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

// passwords must never reach the logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Check a raw `Authorization` value against `expected`.
///
/// True only for `Basic <base64(user:pass)>` where the decoded payload splits on its
/// first colon into exactly `expected.username` and `expected.password`. Any other
/// shape (wrong scheme, bad base64, no colon) is a rejection, never an error.
pub fn validate(header: &[u8], expected: &Credential) -> bool {
    let Some(encoded) = header.strip_prefix(BASIC_PREFIX) else {
        return false;
    };
    let decoded = match general_purpose::STANDARD.decode(encoded) {
        Ok(d) => d,
        Err(_) => return false,
    };
    let Some(colon) = decoded.iter().position(|b| *b == b':') else {
        return false;
    };
    let (user, pass) = (&decoded[..colon], &decoded[colon + 1..]);
    user == expected.username.as_bytes() && pass == expected.password.as_bytes()
}

/// Build the `Authorization` value for `credential`.
pub fn build(credential: &Credential) -> Result<HeaderValue> {
    let raw = format!("{}:{}", credential.username, credential.password);
    let value = format!("Basic {}", general_purpose::STANDARD.encode(raw));
    let mut header = HeaderValue::from_str(&value)
        .map_err(|e| ProxyError::InvalidRequest(format!("unencodable credential: {}", e)))?;
    header.set_sensitive(true);
    Ok(header)
}
