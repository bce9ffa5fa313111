//! Identity tokens for the Tessera session layer.
//!
//! This crate issues and redeems session identity tokens. A token is a signed
//! claim set sealed inside an authenticated-encryption envelope:
//!
//! ```text
//! envelope = base64url( nonce || ChaCha20-Poly1305( header.claims.hmac ) )
//! ```
//!
//! # Core Concepts
//!
//! - **Claims**: subject, display name, issuer, expiry and optional extension data
//! - **Claim Signer**: HS256 signing and constant-time verification
//! - **Token Service**: issuance and redemption, including issuer and expiry checks
//!
//! # Security Model
//!
//! - Envelopes are keyed from the service's shared secret and salt
//! - Signatures are keyed by a secret the caller supplies per call
//! - Every failure is a distinct [`TokenError`] variant whose message carries
//!   no secret or token material
//! - Redemption is idempotent; tokens stay valid until they expire

pub mod claims;
pub mod clock;
pub mod error;
pub mod service;
pub mod signer;

pub use claims::{Claims, ExtensionMap, ExtensionValue, MAX_EXTENSION_DEPTH};
pub use clock::{Clock, SystemClock};
pub use error::{TokenError, TokenResult};
pub use service::{TokenAuthority, TokenService};
pub use signer::{ClaimSigner, SignerError, VerifiedToken, ALGORITHM};

// Re-export configuration for convenience
pub use tessera_core::ServiceConfig;
