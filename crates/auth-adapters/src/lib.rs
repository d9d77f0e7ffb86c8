//! # auth-adapters
//!
//! Signed identity cookies. Seeds are never stored or echoed; the cookie
//! carries only the derived identity and an expiry under an HMAC.

pub mod cookie;

pub use cookie::{IdentityCookieCodec, TokenError, COOKIE_NAME, COOKIE_TTL_DAYS};
