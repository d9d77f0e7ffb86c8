//! Identity cookie plumbing between HTTP headers and the signed codec.

use auth_adapters::{IdentityCookieCodec, COOKIE_NAME};
use axum::http::{header, HeaderMap, HeaderValue};
use chrono::Utc;
use domains::Identity;
use tracing::warn;

/// Reads the `board_identity` value from the `Cookie` header(s).
pub fn read_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value.trim_matches('"').to_string())
}

/// Verified identity from the request's cookie, if any.
pub fn remembered_identity(codec: &IdentityCookieCodec, headers: &HeaderMap) -> Option<Identity> {
    read_token(headers).and_then(|token| codec.remembered(&token, Utc::now()))
}

/// `Set-Cookie` value remembering `identity` for the codec's lifetime.
/// Returns `None` (and logs) if the token cannot be issued; the request
/// itself still succeeds.
pub fn set_cookie(
    codec: &IdentityCookieCodec,
    identity: &Identity,
    secure: bool,
) -> Option<HeaderValue> {
    let token = match codec.issue(identity, Utc::now()) {
        Ok(token) => token,
        Err(err) => {
            warn!(error = %err, "could not issue identity cookie");
            return None;
        }
    };

    let mut cookie = format!(
        "{COOKIE_NAME}={token}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        codec.max_age_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}
