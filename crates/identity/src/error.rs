//! Error types for token issuance and redemption.
//!
//! Every rejection has its own variant so an outer layer (an HTTP handler,
//! say) can map each cause to a response without re-deriving it. Display
//! messages are fixed strings: they never carry secrets, keys, token text or
//! the underlying cryptographic error.

use tessera_core::ConfigError;
use tessera_crypto::EnvelopeError;
use thiserror::Error;

use crate::signer::SignerError;

/// Errors that can occur in token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Input is not envelope text, or too short to hold a nonce
    #[error("Malformed token envelope")]
    MalformedEnvelope,

    /// Authenticated decryption failed (wrong key or tampered envelope)
    #[error("Token decryption failed")]
    DecryptionFailed,

    /// The inner signed token could not be parsed
    #[error("Malformed token")]
    MalformedToken,

    /// The inner signature did not verify
    #[error("Invalid token signature")]
    InvalidSignature,

    /// The authenticated payload carries no claims
    #[error("Token is missing claims")]
    TokenMissingClaims,

    /// Claims are present but not valid (expired)
    #[error("Invalid token")]
    InvalidToken,

    /// Claims were issued by a different authority
    #[error("Invalid token issuer")]
    InvalidIssuer,

    /// Claims could not be serialized at issuance
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Service configuration rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl TokenError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::MalformedEnvelope => "malformed_envelope",
            TokenError::DecryptionFailed => "decryption_failed",
            TokenError::MalformedToken => "malformed_token",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::TokenMissingClaims => "token_missing_claims",
            TokenError::InvalidToken => "invalid_token",
            TokenError::InvalidIssuer => "invalid_issuer",
            TokenError::Serialization(_) => "serialization",
            TokenError::Config(_) => "config",
        }
    }

    /// Whether the error describes a token presented for redemption, as
    /// opposed to a failure on the issuing side.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, TokenError::Serialization(_) | TokenError::Config(_))
    }
}

impl From<EnvelopeError> for TokenError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Malformed => TokenError::MalformedEnvelope,
            EnvelopeError::DecryptionFailed => TokenError::DecryptionFailed,
            EnvelopeError::Oversized => {
                TokenError::Serialization("signed token exceeds envelope capacity".to_string())
            }
        }
    }
}

impl From<SignerError> for TokenError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::MalformedToken => TokenError::MalformedToken,
            SignerError::InvalidSignature => TokenError::InvalidSignature,
            SignerError::Serialization { reason } => TokenError::Serialization(reason),
        }
    }
}

/// Result type for token operations.
pub type TokenResult<T> = Result<T, TokenError>;
