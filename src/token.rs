//! Token issuing and verification
//!
//! Self-contained signed bearer tokens in the JWT compact form
//! `header.payload.signature`, each segment base64url-encoded without
//! padding, signed with HMAC-SHA256 over `header + "." + payload`.
//!
//! Verification yields a single opaque outcome: malformed input, a foreign
//! algorithm, a bad signature, a missing claim and an expired token are all
//! just `None`, so callers cannot be used as an oracle for which check
//! failed.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::model::Claims;

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies signed, expiring tokens. Stateless aside from the
/// secret and the clock.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
    ttl_seconds: i64,
}

impl TokenService {
    /// `secret` must be non-empty and `ttl_seconds` positive; config
    /// enforces both before this is reached.
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        debug_assert!(!secret.is_empty());
        debug_assert!(ttl_seconds > 0);
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl_seconds,
        }
    }

    /// Issues a token for the given identity, expiring `ttl_seconds` from
    /// now.
    pub fn issue(&self, user_id: u64, name: &str, email: &str) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            name: name.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_seconds)).timestamp(),
        };

        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_string(&claims).expect("claims serialize to JSON"),
        );
        let signing_input = format!("{}.{}", header, payload);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(&signing_input));

        format!("{}.{}", signing_input, signature)
    }

    /// Verifies a token and returns its claims, or `None` for any invalid
    /// token whatsoever.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let mut segments = token.split('.');
        let header_part = segments.next()?;
        let payload_part = segments.next()?;
        let signature_part = segments.next()?;
        if segments.next().is_some() {
            return None;
        }

        let header_raw = URL_SAFE_NO_PAD.decode(header_part).ok()?;
        let payload_raw = URL_SAFE_NO_PAD.decode(payload_part).ok()?;
        let signature: Vec<u8> = URL_SAFE_NO_PAD.decode(signature_part).ok()?;

        // Only the algorithm this service signs with is acceptable.
        let header: Value = serde_json::from_slice(&header_raw).ok()?;
        if header.get("alg").and_then(Value::as_str) != Some("HS256") {
            return None;
        }

        let signing_input = format!("{}.{}", header_part, payload_part);
        let expected = self.sign(&signing_input);
        if expected.len() != signature.len() {
            return None;
        }
        if !bool::from(expected.as_slice().ct_eq(signature.as_slice())) {
            return None;
        }

        // `sub` and `exp` are required; Claims deserialization enforces
        // their presence and shape.
        let claims: Claims = serde_json::from_slice(&payload_raw).ok()?;
        if claims.exp <= Utc::now().timestamp() {
            return None;
        }

        Some(claims)
    }

    fn sign(&self, data: &str) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(data.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", 3600)
    }

    #[test]
    fn issue_then_verify_round_trips_claims() {
        let svc = service();
        let before = Utc::now().timestamp();
        let token = svc.issue(42, "Alice", "alice@example.com");
        let claims = svc.verify(&token).expect("token verifies");

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.name, "Alice");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.exp, claims.iat + 3600);
        assert!(claims.iat >= before);
    }

    #[test]
    fn token_has_three_base64url_segments() {
        let token = service().issue(1, "A", "a@example.com");
        let segments: Vec<&str> = token.split('.').collect();
        assert_eq!(segments.len(), 3);
        for segment in segments {
            assert!(!segment.contains('='));
            assert!(URL_SAFE_NO_PAD.decode(segment).is_ok());
        }
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let svc = service();
        let token = svc.issue(42, "Alice", "alice@example.com");
        let (rest, signature) = token.rsplit_once('.').unwrap();

        // Flip every character of the signature in turn.
        for i in 0..signature.len() {
            let mut bytes = signature.as_bytes().to_vec();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = format!("{}.{}", rest, String::from_utf8(bytes).unwrap());
            assert!(svc.verify(&tampered).is_none(), "position {} accepted", i);
        }
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let svc = service();
        let token = svc.issue(42, "Alice", "alice@example.com");
        let parts: Vec<&str> = token.split('.').collect();

        let forged_claims = Claims {
            sub: 999,
            name: "Mallory".to_string(),
            email: "m@example.com".to_string(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 3600,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_string(&forged_claims).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert!(svc.verify(&forged).is_none());
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let svc = service();
        assert!(svc.verify("").is_none());
        assert!(svc.verify("only-one-segment").is_none());
        assert!(svc.verify("two.segments").is_none());
        assert!(svc.verify("a.b.c.d").is_none());
        assert!(svc.verify("not base64!.also not!.nope!").is_none());
    }

    #[test]
    fn foreign_algorithm_is_rejected() {
        let svc = service();
        let token = svc.issue(1, "A", "a@example.com");
        let parts: Vec<&str> = token.split('.').collect();

        // Re-sign with the real secret but declare alg "none".
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let signing_input = format!("{}.{}", header, parts[1]);
        let signature = URL_SAFE_NO_PAD.encode(svc.sign(&signing_input));
        let downgraded = format!("{}.{}", signing_input, signature);
        assert!(svc.verify(&downgraded).is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Sign a payload whose exp is already in the past with the real key.
        let svc = service();
        let now = Utc::now();
        let claims = Claims {
            sub: 42,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            iat: now.timestamp() - 7200,
            exp: now.timestamp() - 3600,
        };
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_string(&claims).unwrap());
        let signing_input = format!("{}.{}", header, payload);
        let signature = URL_SAFE_NO_PAD.encode(svc.sign(&signing_input));
        let token = format!("{}.{}", signing_input, signature);

        assert!(svc.verify(&token).is_none());
    }

    #[test]
    fn missing_required_claims_are_rejected() {
        let svc = service();
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        // No `sub`.
        let payload = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"name":"A","email":"a@example.com","iat":0,"exp":{}}}"#,
            Utc::now().timestamp() + 3600
        ));
        let signing_input = format!("{}.{}", header, payload);
        let signature = URL_SAFE_NO_PAD.encode(svc.sign(&signing_input));
        assert!(svc.verify(&format!("{}.{}", signing_input, signature)).is_none());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = TokenService::new("secret-a", 3600).issue(1, "A", "a@example.com");
        assert!(TokenService::new("secret-b", 3600).verify(&token).is_none());
    }
}
