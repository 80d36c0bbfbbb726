//! HMAC-SHA256 request signing.
//!
//! The signed message is exactly the UTF-8 bytes of
//! `"<timestamp_ms>:<nonce>:<body>"`. The gateway rebuilds the same string
//! from the `X-Scrybe-*` headers and the raw request body.

use crate::error::SignError;
use crate::session::generate_id;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "X-Scrybe-Timestamp";
pub const NONCE_HEADER: &str = "X-Scrybe-Nonce";
pub const SIGNATURE_HEADER: &str = "X-Scrybe-Signature";

/// The byte-exact string that gets signed.
pub fn canonical_message(body: &str, timestamp_ms: i64, nonce: &str) -> String {
    format!("{timestamp_ms}:{nonce}:{body}")
}

/// Lower-case hex HMAC-SHA256 of the canonical message, keyed by the raw
/// bytes of `key`.
pub fn sign(body: &str, timestamp_ms: i64, nonce: &str, key: &[u8]) -> Result<String, SignError> {
    let mut mac = new_mac(key)?;
    mac.update(canonical_message(body, timestamp_ms, nonce).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Single-use nonce in the session identifier format.
pub fn generate_nonce() -> String {
    generate_id()
}

fn new_mac(key: &[u8]) -> Result<HmacSha256, SignError> {
    if key.is_empty() {
        return Err(SignError::EmptyKey);
    }
    HmacSha256::new_from_slice(key).map_err(|e| SignError::InvalidKey(e.to_string()))
}

/// A payload body together with its authentication material.
///
/// Created once per submission and never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub body: String,
    pub timestamp_ms: i64,
    pub nonce: String,
    pub signature: String,
}

impl SignedEnvelope {
    /// Sign `body` with a fresh nonce at `timestamp_ms`.
    pub fn seal(body: String, timestamp_ms: i64, key: &[u8]) -> Result<Self, SignError> {
        let nonce = generate_nonce();
        let signature = sign(&body, timestamp_ms, &nonce, key)?;
        Ok(Self {
            body,
            timestamp_ms,
            nonce,
            signature,
        })
    }

    /// Authentication headers in transmission order.
    pub fn headers(&self) -> [(&'static str, String); 3] {
        [
            (TIMESTAMP_HEADER, self.timestamp_ms.to_string()),
            (NONCE_HEADER, self.nonce.clone()),
            (SIGNATURE_HEADER, self.signature.clone()),
        ]
    }

    /// Recompute the MAC and compare in constant time.
    pub fn verify(&self, key: &[u8]) -> bool {
        verify(
            &self.body,
            self.timestamp_ms,
            &self.nonce,
            &self.signature,
            key,
        )
    }
}

/// Constant-time check of a hex signature against the canonical message.
pub fn verify(body: &str, timestamp_ms: i64, nonce: &str, signature_hex: &str, key: &[u8]) -> bool {
    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = new_mac(key) else {
        return false;
    };
    mac.update(canonical_message(body, timestamp_ms, nonce).as_bytes());
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"sessionId":"abc","timestamp":1}"#;
    const NONCE: &str = "123e4567-e89b-42d3-a456-426614174000";

    #[test]
    fn test_canonical_message_exact_bytes() {
        assert_eq!(
            canonical_message("{}", 1700000000000, "n"),
            "1700000000000:n:{}"
        );
    }

    #[test]
    fn test_rfc4231_case_2() {
        // HMAC-SHA256(key="Jefe", "what do ya want for nothing?")
        let mut mac = HmacSha256::new_from_slice(b"Jefe").unwrap();
        mac.update(b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(mac.finalize().into_bytes()),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_sign_matches_independent_recomputation() {
        let signature = sign(BODY, 1_700_000_000_000, NONCE, b"shared-key").unwrap();

        let mut mac = HmacSha256::new_from_slice(b"shared-key").unwrap();
        mac.update(format!("1700000000000:{NONCE}:{BODY}").as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(signature, expected);
        assert_eq!(signature.len(), 64);
        assert_eq!(signature, signature.to_lowercase());
    }

    #[test]
    fn test_any_field_change_changes_signature() {
        let base = sign(BODY, 1000, NONCE, b"key").unwrap();
        assert_ne!(base, sign("{}", 1000, NONCE, b"key").unwrap());
        assert_ne!(base, sign(BODY, 1001, NONCE, b"key").unwrap());
        assert_ne!(base, sign(BODY, 1000, "other-nonce", b"key").unwrap());
        assert_ne!(base, sign(BODY, 1000, NONCE, b"other-key").unwrap());
    }

    #[test]
    fn test_empty_key_is_encoding_failure() {
        assert_eq!(sign(BODY, 1, NONCE, b""), Err(SignError::EmptyKey));
    }

    #[test]
    fn test_envelope_verify() {
        let envelope = SignedEnvelope::seal(BODY.to_string(), 42, b"key").unwrap();
        assert!(envelope.verify(b"key"));
        assert!(!envelope.verify(b"wrong"));

        let mut tampered = envelope.clone();
        tampered.body.push(' ');
        assert!(!tampered.verify(b"key"));

        assert!(!verify(BODY, 42, &envelope.nonce, "not-hex", b"key"));
    }

    #[test]
    fn test_envelopes_never_share_nonce() {
        let a = SignedEnvelope::seal(BODY.to_string(), 42, b"key").unwrap();
        let b = SignedEnvelope::seal(BODY.to_string(), 42, b"key").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.signature, b.signature);
    }

    #[test]
    fn test_headers() {
        let envelope = SignedEnvelope {
            body: String::new(),
            timestamp_ms: 7,
            nonce: "n".to_string(),
            signature: "s".to_string(),
        };
        let headers = envelope.headers();
        assert_eq!(headers[0], (TIMESTAMP_HEADER, "7".to_string()));
        assert_eq!(headers[1], (NONCE_HEADER, "n".to_string()));
        assert_eq!(headers[2], (SIGNATURE_HEADER, "s".to_string()));
    }
}
