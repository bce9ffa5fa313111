//! Cryptographic primitives for the Tessera token envelope.
//!
//! This crate provides the two keyed building blocks of an issued token:
//!
//! - **Key Derivation** ([`kdf`]): PBKDF2-HMAC-SHA256 from the service's shared
//!   secret and salt to a 256-bit key
//! - **Envelope Cipher** ([`envelope`]): ChaCha20-Poly1305 sealing of a signed
//!   token into transport-safe text
//!
//! # Security Principles
//!
//! - Never roll custom cryptographic primitives
//! - A fresh random nonce for every seal
//! - Derived keys are zeroized on drop and never logged
//! - Decryption failures never reveal whether the key or the ciphertext was wrong

pub mod envelope;
pub mod kdf;

pub use envelope::{
    decrypt, encrypt, fingerprint, EnvelopeCipher, EnvelopeError, EnvelopeResult,
    MAX_PLAINTEXT_LEN, NONCE_SIZE, TAG_SIZE,
};
pub use kdf::{derive_key, derive_key_with, DerivedKey, KdfParams, KEY_SIZE};
