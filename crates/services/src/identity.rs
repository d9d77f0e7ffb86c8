//! Seed → public identity derivation.

use domains::Identity;
use sha2::{Digest, Sha256};

/// Leading character of every derived identity.
pub const IDENTITY_MARKER: char = '@';

/// Number of hex digits of the digest kept in the identity.
pub const IDENTITY_HEX_LEN: usize = 7;

/// Derives the public identity for `seed`: the marker followed by the first
/// seven lowercase hex digits of SHA-256 over the seed's UTF-8 bytes.
///
/// Pure and total; the empty seed is a valid input.
pub fn derive(seed: &str) -> Identity {
    let digest = hex::encode(Sha256::digest(seed.as_bytes()));
    let mut id = String::with_capacity(1 + IDENTITY_HEX_LEN);
    id.push(IDENTITY_MARKER);
    id.push_str(&digest[..IDENTITY_HEX_LEN]);
    Identity::new(id)
}

/// Whether `value` has the shape of a derived identity.
pub fn is_well_formed(value: &str) -> bool {
    value
        .strip_prefix(IDENTITY_MARKER)
        .is_some_and(|hex| {
            hex.len() == IDENTITY_HEX_LEN
                && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        })
}
