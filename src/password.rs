//! Password hashing
//!
//! One-way salted key derivation with PBKDF2-HMAC-SHA256. Each hash embeds
//! its own random salt (`hex(salt) + ":" + hex(key)`), so verification needs
//! nothing beyond the stored string. Comparison is constant-time.

use hmac::Hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SALT_BYTES: usize = 16;
const KEY_BYTES: usize = 32;
const ITERATIONS: u32 = 120_000;

/// Derives a fresh salted digest for `password`.
///
/// Two calls on the same password produce different outputs (distinct salts)
/// that both verify.
pub fn hash(password: &str) -> String {
    let mut salt = [0u8; SALT_BYTES];
    rand::rng().fill_bytes(&mut salt);

    let key = derive_key(password, &salt);
    format!("{}:{}", hex::encode(salt), hex::encode(key))
}

/// Checks `password` against a digest produced by [`hash`].
///
/// Malformed stored digests verify as false rather than erroring; a login
/// path has no use for the distinction.
pub fn verify(password: &str, stored: &str) -> bool {
    let Some((salt_hex, expected_hex)) = stored.split_once(':') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(expected_hex) else {
        return false;
    };
    if expected.len() != KEY_BYTES {
        return false;
    }

    let derived = derive_key(password, &salt);
    derived.ct_eq(expected.as_slice()).into()
}

fn derive_key(password: &str, salt: &[u8]) -> [u8; KEY_BYTES] {
    let mut key = [0u8; KEY_BYTES];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, ITERATIONS, &mut key)
        .expect("HMAC accepts keys of any length");
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_verifies() {
        let stored = hash("correct horse battery staple");
        assert!(verify("correct horse battery staple", &stored));
    }

    #[test]
    fn wrong_password_fails() {
        let stored = hash("correct horse battery staple");
        assert!(!verify("incorrect horse", &stored));
    }

    #[test]
    fn salts_differ_between_calls() {
        let first = hash("same password");
        let second = hash("same password");
        assert_ne!(first, second);
        assert!(verify("same password", &first));
        assert!(verify("same password", &second));
    }

    #[test]
    fn malformed_digest_is_rejected() {
        assert!(!verify("anything", "no-delimiter"));
        assert!(!verify("anything", "nothex:alsonothex"));
        assert!(!verify("anything", "abcd:1234"));
    }

    #[test]
    fn digest_embeds_salt_and_key_as_hex() {
        let stored = hash("pw");
        let (salt_hex, key_hex) = stored.split_once(':').unwrap();
        assert_eq!(salt_hex.len(), SALT_BYTES * 2);
        assert_eq!(key_hex.len(), KEY_BYTES * 2);
    }
}
