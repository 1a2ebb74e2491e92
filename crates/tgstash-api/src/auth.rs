//! HTTP Basic authentication for the admin surface.
//!
//! The gate is open when the admin credentials are not configured. Once they
//! are, a request passes only with an exact (case-sensitive) match; anything
//! malformed fails closed.

use axum::http::{HeaderMap, header};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use tgstash_common::config::AdminConfig;

/// Credentials carried by an `Authorization: Basic ...` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub user: String,
    pub pass: String,
}

/// Decode an `Authorization` header value.
///
/// The password is everything after the first `:`, so it may itself contain colons.
pub fn parse_basic(value: &str) -> Option<BasicCredentials> {
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = B64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some(BasicCredentials {
        user: user.to_owned(),
        pass: pass.to_owned(),
    })
}

/// Whether a request with `headers` may use the admin surface.
pub fn is_authorized(headers: &HeaderMap, admin: &AdminConfig) -> bool {
    let Some((user, pass)) = admin.credentials() else {
        return true;
    };

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic)
        .is_some_and(|creds| creds.user == user && creds.pass == pass)
}
