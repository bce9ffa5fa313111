//! Password-based key derivation for envelope keys.
//!
//! Turns the service's long-lived shared secret and per-deployment salt into
//! a 256-bit ChaCha20-Poly1305 key using PBKDF2-HMAC-SHA256. Derivation is
//! deterministic and stateless, so independent verification calls reproduce
//! the same key without sharing any mutable state.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub use tessera_core::{DEFAULT_KDF_ITERATIONS, KDF_VERSION};

/// Derived key length in bytes (ChaCha20-Poly1305 key size).
pub const KEY_SIZE: usize = 32;

/// Versioned PBKDF2 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub version: u16,
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            version: KDF_VERSION,
            iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

impl KdfParams {
    /// Version 1 parameters with a non-default iteration count.
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            version: KDF_VERSION,
            iterations,
        }
    }
}

/// A 256-bit symmetric key.
///
/// Zeroized on drop and redacted from `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Derive an envelope key with the default version 1 parameters.
pub fn derive_key(shared_secret: &str, salt: &str) -> DerivedKey {
    derive_key_with(&KdfParams::default(), shared_secret, salt)
}

/// Derive an envelope key with explicit parameters.
pub fn derive_key_with(params: &KdfParams, shared_secret: &str, salt: &str) -> DerivedKey {
    let mut okm = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(
        shared_secret.as_bytes(),
        salt.as_bytes(),
        params.iterations.max(1),
        &mut okm,
    );

    let key = DerivedKey(okm);
    okm.zeroize();
    key
}
