//! Claim Signer - compact HMAC-SHA256 signed tokens.
//!
//! A signed token is three base64url segments joined by dots:
//! `header.claims.signature`, where the header is always
//! `{"alg":"HS256","typ":"JWT"}` and the signature is HMAC-SHA256 over the
//! first two segments keyed with a caller-supplied secret.
//!
//! # Security Model
//!
//! - One algorithm, fixed at compile time; a header naming any other
//!   algorithm is rejected
//! - Signatures are compared in constant time
//! - The signature is checked before any claim JSON is parsed
//! - The signer proves authenticity, shape and freshness only; issuer checks
//!   belong to the token service

use crate::claims::{Claims, REQUIRED_MEMBERS};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// The only supported signing algorithm.
pub const ALGORITHM: &str = "HS256";

const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default)]
    typ: Option<String>,
}

/// Errors that can occur while signing or verifying claims.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Claim serialization failed: {reason}")]
    Serialization { reason: String },
}

/// Result of verifying a signed token's authenticity.
///
/// `claims` is `None` when the authenticated payload does not carry the
/// required claim members. `valid` is false when claims are absent or expired.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    claims: Option<Claims>,
    valid: bool,
}

impl VerifiedToken {
    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    pub fn into_claims(self) -> Option<Claims> {
        self.claims
    }

    /// Signature-validity flag, which also covers expiry.
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// HS256 claim signer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimSigner;

impl ClaimSigner {
    pub fn new() -> Self {
        Self
    }

    pub fn algorithm(&self) -> &'static str {
        ALGORITHM
    }

    /// Serialize `claims` and sign them with `secret`.
    ///
    /// Fails only when extension data cannot be represented canonically.
    pub fn sign(&self, claims: &Claims, secret: &str) -> Result<String, SignerError> {
        if !claims.is_canonical() {
            return Err(SignerError::Serialization {
                reason: "extension data has a non-finite number or nests too deeply".to_string(),
            });
        }

        let payload = serde_json::to_vec(claims).map_err(|e| SignerError::Serialization {
            reason: e.to_string(),
        })?;

        self.sign_payload(&payload, secret)
    }

    /// Sign an arbitrary JSON payload under the fixed header.
    pub(crate) fn sign_payload(&self, payload: &[u8], secret: &str) -> Result<String, SignerError> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: Some(TOKEN_TYPE.to_string()),
        };
        let header_json = serde_json::to_vec(&header).map_err(|e| SignerError::Serialization {
            reason: e.to_string(),
        })?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(payload)
        );

        let mut mac = new_mac(secret).map_err(|_| SignerError::Serialization {
            reason: "signing key rejected".to_string(),
        })?;
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Verify `token` against `secret` using the system clock.
    pub fn verify(&self, token: &str, secret: &str) -> Result<VerifiedToken, SignerError> {
        self.verify_at(token, secret, unix_now())
    }

    /// Verify `token` against `secret`, judging expiry at `now` (unix seconds).
    pub fn verify_at(
        &self,
        token: &str,
        secret: &str,
        now: i64,
    ) -> Result<VerifiedToken, SignerError> {
        let mut segments = token.split('.');
        let (header_b64, payload_b64, signature_b64) = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(h), Some(p), Some(s), None) => (h, p, s),
            _ => return Err(SignerError::MalformedToken),
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| SignerError::MalformedToken)?;

        let mut mac = new_mac(secret).map_err(|_| SignerError::InvalidSignature)?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SignerError::InvalidSignature)?;

        let header: Header = decode_json(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(SignerError::InvalidSignature);
        }

        let payload: serde_json::Value = decode_json(payload_b64)?;
        let members = payload.as_object().ok_or(SignerError::MalformedToken)?;

        if !REQUIRED_MEMBERS.iter().all(|m| members.contains_key(*m)) {
            return Ok(VerifiedToken {
                claims: None,
                valid: false,
            });
        }

        let claims: Claims =
            serde_json::from_value(payload).map_err(|_| SignerError::MalformedToken)?;
        let valid = !claims.is_expired_at(now);

        Ok(VerifiedToken {
            claims: Some(claims),
            valid,
        })
    }
}

/// HMAC accepts keys of any length (longer keys are hashed first), so the
/// error arm is never taken for `Hmac<Sha256>`. Callers still map it rather
/// than panic.
fn new_mac(secret: &str) -> Result<HmacSha256, hmac::digest::InvalidLength> {
    <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
}

fn decode_json<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, SignerError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| SignerError::MalformedToken)?;
    serde_json::from_slice(&bytes).map_err(|_| SignerError::MalformedToken)
}

/// Current time in unix seconds.
pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
