//! # Identity cookie
//!
//! After a successful post the transport remembers the poster's identity so
//! a later topic update can omit the seed. The token is
//! `base64url(identity "|" expires_unix) "." base64url(hmac_sha256(payload))`.
//!
//! Only the derived identity is ever placed in the token, never the seed.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use domains::Identity;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Cookie name used by the HTTP layer.
pub const COOKIE_NAME: &str = "board_identity";

/// Remembered identities are honoured for seven days.
pub const COOKIE_TTL_DAYS: i64 = 7;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed identity token")]
    Malformed,
    #[error("identity token signature mismatch")]
    BadSignature,
    #[error("identity token expired")]
    Expired,
    #[error("signing key rejected: {0}")]
    Key(String),
}

pub struct IdentityCookieCodec {
    secret: SecretString,
    ttl: Duration,
}

impl IdentityCookieCodec {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            ttl: Duration::days(COOKIE_TTL_DAYS),
        }
    }

    /// Lifetime in seconds, for the cookie's `Max-Age`.
    pub fn max_age_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| TokenError::Key(e.to_string()))
    }

    pub fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String, TokenError> {
        let expires = (now + self.ttl).timestamp();
        let payload = format!("{}|{}", identity.as_str(), expires);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let (payload_b64, sig_b64) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(&payload);
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let payload = String::from_utf8(payload).map_err(|_| TokenError::Malformed)?;
        let (identity, expires) = payload.rsplit_once('|').ok_or(TokenError::Malformed)?;
        let expires: i64 = expires.parse().map_err(|_| TokenError::Malformed)?;
        if now.timestamp() >= expires {
            return Err(TokenError::Expired);
        }
        Ok(Identity::new(identity))
    }

    /// Lenient form for request handling: any failure means "no identity".
    pub fn remembered(&self, token: &str, now: DateTime<Utc>) -> Option<Identity> {
        match self.verify(token, now) {
            Ok(identity) => Some(identity),
            Err(err) => {
                debug!(error = %err, "ignoring identity cookie");
                None
            }
        }
    }
}
