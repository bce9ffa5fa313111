//! Token Service - issuance and redemption of enveloped identity tokens.
//!
//! Issuance signs a fresh claim set with a caller-supplied secret, then seals
//! the signed token in an envelope keyed from the service's own shared secret
//! and salt. Redemption reverses both layers and applies the business checks.
//!
//! The two keys are independent. The envelope key is the same for every
//! token the service emits; the signing secret is supplied per call and must
//! be presented again at redemption.
//!
//! # Concurrency
//!
//! [`TokenService`] holds only immutable configuration. Every operation takes
//! `&self`, so one instance can be shared across threads without locking.
//! Tokens are not consumed by redemption; they stay redeemable until expiry.

use std::sync::Arc;
use std::time::Duration;

use tessera_core::ServiceConfig;
use tessera_crypto::{derive_key_with, fingerprint, EnvelopeCipher, KdfParams};
use tracing::{debug, info, warn};

use crate::claims::{Claims, ExtensionMap};
use crate::clock::{Clock, SystemClock};
use crate::error::{TokenError, TokenResult};
use crate::signer::{ClaimSigner, VerifiedToken};

/// Operations a token authority exposes to the request-handling layer.
///
/// `issue_token`, `redeem_token` and `redeem_claims` are composed from the
/// lower-level operations, so a test double only needs to supply those.
pub trait TokenAuthority: Send + Sync {
    /// Build and sign claims without encrypting them.
    fn create_token(
        &self,
        caller_secret: &str,
        subject: &str,
        display_name: &str,
        extensions: Option<ExtensionMap>,
    ) -> TokenResult<String>;

    /// Seal a signed token into envelope text.
    fn encrypt_token(&self, signed_token: &str) -> TokenResult<String>;

    /// Open envelope text and return the signed token inside.
    fn decrypt_token(&self, envelope: &str) -> TokenResult<String>;

    /// Decrypt, verify and validate an envelope.
    fn parse(&self, envelope: &str, caller_secret: &str) -> TokenResult<VerifiedToken>;

    /// Business checks on a verified token: claims present, valid, issuer.
    fn is_token_valid(&self, token: &VerifiedToken) -> TokenResult<()>;

    /// Subject and display name of a verified token.
    fn user_from_token(&self, token: &VerifiedToken) -> TokenResult<(String, String)> {
        let claims = token.claims().ok_or(TokenError::TokenMissingClaims)?;
        Ok((
            claims.subject().to_string(),
            claims.display_name().to_string(),
        ))
    }

    /// Issue an envelope for `subject`, signed with `caller_secret`.
    fn issue_token(
        &self,
        caller_secret: &str,
        subject: &str,
        display_name: &str,
        extensions: Option<ExtensionMap>,
    ) -> TokenResult<String> {
        let signed = self.create_token(caller_secret, subject, display_name, extensions)?;
        let envelope = self.encrypt_token(&signed)?;
        debug!(
            subject = %subject,
            token = %fingerprint(&envelope),
            "Issued token"
        );
        Ok(envelope)
    }

    /// Redeem an envelope, returning `(subject, display_name)`.
    fn redeem_token(&self, envelope: &str, caller_secret: &str) -> TokenResult<(String, String)> {
        let verified = self.parse(envelope, caller_secret)?;
        self.user_from_token(&verified)
    }

    /// Redeem an envelope, returning the full claim set.
    fn redeem_claims(&self, envelope: &str, caller_secret: &str) -> TokenResult<Claims> {
        self.parse(envelope, caller_secret)?
            .into_claims()
            .ok_or(TokenError::TokenMissingClaims)
    }
}

/// Issues and redeems enveloped tokens for one configured issuer.
pub struct TokenService {
    config: ServiceConfig,
    kdf: KdfParams,
    signer: ClaimSigner,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.config)
            .field("kdf", &self.kdf)
            .field("algorithm", &self.signer.algorithm())
            .finish()
    }
}

impl TokenService {
    /// Create a service on the system clock.
    pub fn new(config: ServiceConfig) -> TokenResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a service reading time from `clock`.
    pub fn with_clock(config: ServiceConfig, clock: Arc<dyn Clock>) -> TokenResult<Self> {
        config.validate()?;
        let kdf = KdfParams::with_iterations(config.kdf_iterations);

        info!(
            issuer = %config.issuer,
            timeout_minutes = config.timeout_minutes,
            kdf_version = kdf.version,
            algorithm = ClaimSigner::new().algorithm(),
            "Token service initialized"
        );

        Ok(Self {
            config,
            kdf,
            signer: ClaimSigner::new(),
            clock,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }

    /// Lifetime given to every issued token.
    pub fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    /// Cipher keyed for this service, derived fresh for each operation.
    /// Both the derived key and the cipher's copy of it are wiped on drop.
    fn envelope_cipher(&self) -> EnvelopeCipher {
        let key = derive_key_with(&self.kdf, &self.config.shared_secret, &self.config.salt);
        EnvelopeCipher::new(&key)
    }

    fn reject(&self, envelope: &str, err: TokenError) -> TokenError {
        warn!(
            reason = err.kind(),
            token = %fingerprint(envelope),
            "Token rejected"
        );
        err
    }
}

impl TokenAuthority for TokenService {
    fn create_token(
        &self,
        caller_secret: &str,
        subject: &str,
        display_name: &str,
        extensions: Option<ExtensionMap>,
    ) -> TokenResult<String> {
        let claims = Claims::new(
            subject,
            display_name,
            self.config.issuer.as_str(),
            self.clock.now_unix(),
            self.timeout(),
            extensions,
        );
        Ok(self.signer.sign(&claims, caller_secret)?)
    }

    fn encrypt_token(&self, signed_token: &str) -> TokenResult<String> {
        Ok(self.envelope_cipher().seal(signed_token.as_bytes())?)
    }

    fn decrypt_token(&self, envelope: &str) -> TokenResult<String> {
        let plaintext = self.envelope_cipher().open(envelope)?;
        String::from_utf8(plaintext).map_err(|_| TokenError::MalformedToken)
    }

    fn parse(&self, envelope: &str, caller_secret: &str) -> TokenResult<VerifiedToken> {
        let signed = self
            .decrypt_token(envelope)
            .map_err(|e| self.reject(envelope, e))?;

        let verified = self
            .signer
            .verify_at(&signed, caller_secret, self.clock.now_unix())
            .map_err(|e| self.reject(envelope, e.into()))?;

        self.is_token_valid(&verified)
            .map_err(|e| self.reject(envelope, e))?;

        Ok(verified)
    }

    fn is_token_valid(&self, token: &VerifiedToken) -> TokenResult<()> {
        let claims = token.claims().ok_or(TokenError::TokenMissingClaims)?;

        if !token.is_valid() {
            return Err(TokenError::InvalidToken);
        }

        if claims.issuer() != self.config.issuer {
            return Err(TokenError::InvalidIssuer);
        }

        Ok(())
    }
}
