//! Authenticated-encryption envelope for signed tokens.
//!
//! An envelope is `base64url(nonce || ciphertext || tag)` without padding,
//! sealed with ChaCha20-Poly1305 under a [`DerivedKey`]. Every seal draws a
//! fresh 96-bit nonce from the operating system RNG.
//!
//! # Failure reporting
//!
//! Opening distinguishes only two outcomes: input that is not an envelope at
//! all ([`EnvelopeError::Malformed`]) and an envelope that fails
//! authentication ([`EnvelopeError::DecryptionFailed`]). A wrong key and a
//! tampered ciphertext produce the same error value and message.

use crate::kdf::DerivedKey;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

/// Nonce size for ChaCha20-Poly1305 (96 bits / 12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag size.
pub const TAG_SIZE: usize = 16;

/// Largest plaintext accepted for sealing. Signed tokens are far smaller.
pub const MAX_PLAINTEXT_LEN: usize = 64 * 1024;

/// Largest envelope text accepted for opening.
pub const MAX_ENVELOPE_LEN: usize = (NONCE_SIZE + MAX_PLAINTEXT_LEN + TAG_SIZE) * 4 / 3 + 4;

/// Envelope error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("Malformed envelope")]
    Malformed,

    #[error("Envelope decryption failed")]
    DecryptionFailed,

    #[error("Plaintext exceeds envelope capacity")]
    Oversized,
}

/// Result type for envelope operations.
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

/// ChaCha20-Poly1305 envelope cipher bound to one key.
pub struct EnvelopeCipher {
    cipher: ChaCha20Poly1305,
}

impl EnvelopeCipher {
    pub fn new(key: &DerivedKey) -> Self {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
        Self { cipher }
    }

    /// Seal `plaintext` into transport-safe envelope text.
    pub fn seal(&self, plaintext: &[u8]) -> EnvelopeResult<String> {
        if plaintext.len() > MAX_PLAINTEXT_LEN {
            return Err(EnvelopeError::Oversized);
        }

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| EnvelopeError::Oversized)?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Open envelope text and return the authenticated plaintext.
    pub fn open(&self, envelope: &str) -> EnvelopeResult<Vec<u8>> {
        if envelope.len() > MAX_ENVELOPE_LEN {
            tracing::debug!(len = envelope.len(), "envelope text exceeds maximum length");
            return Err(EnvelopeError::Malformed);
        }

        let raw = URL_SAFE_NO_PAD
            .decode(envelope)
            .map_err(|_| EnvelopeError::Malformed)?;

        if raw.len() < NONCE_SIZE {
            tracing::debug!(len = raw.len(), "envelope shorter than nonce");
            return Err(EnvelopeError::Malformed);
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_SIZE);

        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| EnvelopeError::DecryptionFailed)
    }
}

/// Seal `plaintext` under `key`.
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> EnvelopeResult<String> {
    EnvelopeCipher::new(key).seal(plaintext)
}

/// Open `envelope` under `key`.
pub fn decrypt(envelope: &str, key: &DerivedKey) -> EnvelopeResult<Vec<u8>> {
    EnvelopeCipher::new(key).open(envelope)
}

/// Short, non-reversible identifier for an envelope, safe to log.
///
/// First 8 bytes of the BLAKE3 hash of the envelope text, hex encoded.
pub fn fingerprint(envelope: &str) -> String {
    let hash = blake3::hash(envelope.as_bytes());
    hex::encode(&hash.as_bytes()[..8])
}
