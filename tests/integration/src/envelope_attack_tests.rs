//! Adversarial envelope tests
//!
//! Every forged or damaged envelope must be rejected with the error for the
//! layer that catches it, and never yield an identity.
//!
//! # Test Scenarios
//!
//! 1. **Bit flips**: any single byte of the decoded envelope
//! 2. **Truncation**: envelopes cut short, down to below one nonce
//! 3. **Splicing**: nonce from one envelope, ciphertext from another
//! 4. **Issuer spoofing**: valid envelope from a service with another issuer
//! 5. **Inner re-signing**: a token signed with a different caller secret

use crate::test_utils::*;
use tessera_crypto::NONCE_SIZE;
use tessera_identity::{TokenAuthority, TokenError, TokenService};

#[test]
fn test_concrete_scenario() {
    let service = test_service();
    let token = service.issue_token("s3cr3t", "u1", "Alice", None).unwrap();

    assert_eq!(
        service.redeem_token(&token, "s3cr3t").unwrap(),
        ("u1".to_string(), "Alice".to_string())
    );
    assert!(service.redeem_token(&token, "wrong").is_err());
}

#[test]
fn test_every_single_byte_flip_is_detected() {
    let service = test_service();
    let token = service
        .issue_token(CALLER_SECRET, "u1", "Alice", None)
        .unwrap();
    let raw = envelope_bytes(&token);

    for index in 0..raw.len() {
        let mut tampered = raw.clone();
        tampered[index] ^= 0x80;

        let result = service.redeem_token(&envelope_text(&tampered), CALLER_SECRET);
        assert!(
            matches!(result, Err(TokenError::DecryptionFailed)),
            "byte {} flip gave {:?}",
            index,
            result
        );
    }
}

#[test]
fn test_truncated_envelopes() {
    let service = test_service();
    let token = service
        .issue_token(CALLER_SECRET, "u1", "Alice", None)
        .unwrap();
    let raw = envelope_bytes(&token);

    for len in [raw.len() - 1, NONCE_SIZE + 1, NONCE_SIZE] {
        assert!(matches!(
            service.redeem_token(&envelope_text(&raw[..len]), CALLER_SECRET),
            Err(TokenError::DecryptionFailed)
        ));
    }

    for len in [NONCE_SIZE - 1, 1, 0] {
        assert!(matches!(
            service.redeem_token(&envelope_text(&raw[..len]), CALLER_SECRET),
            Err(TokenError::MalformedEnvelope)
        ));
    }
}

#[test]
fn test_spliced_envelopes_rejected() {
    let service = test_service();
    let first = envelope_bytes(&service.issue_token(CALLER_SECRET, "u1", "Alice", None).unwrap());
    let second = envelope_bytes(&service.issue_token(CALLER_SECRET, "u2", "Bob", None).unwrap());

    let mut spliced = first[..NONCE_SIZE].to_vec();
    spliced.extend_from_slice(&second[NONCE_SIZE..]);

    assert!(matches!(
        service.redeem_token(&envelope_text(&spliced), CALLER_SECRET),
        Err(TokenError::DecryptionFailed)
    ));
}

#[test]
fn test_standard_base64_is_not_an_envelope() {
    let service = test_service();
    assert!(matches!(
        service.redeem_token("aGVsbG8gd29ybGQgZnJvbSB0ZXNzZXJh+/==", CALLER_SECRET),
        Err(TokenError::MalformedEnvelope)
    ));
}

#[test]
fn test_issuer_spoofing_rejected() {
    let spoofer = TokenService::new(fast_config("attacker")).unwrap();
    let service = test_service();

    let token = spoofer
        .issue_token(CALLER_SECRET, "admin", "Root", None)
        .unwrap();

    assert!(matches!(
        service.redeem_token(&token, CALLER_SECRET),
        Err(TokenError::InvalidIssuer)
    ));
}

#[test]
fn test_token_signed_with_other_caller_secret() {
    let service = test_service();
    let token = service
        .issue_token("tenant-a-secret", "u1", "Alice", None)
        .unwrap();

    assert!(matches!(
        service.redeem_token(&token, "tenant-b-secret"),
        Err(TokenError::InvalidSignature)
    ));
    assert!(service.redeem_token(&token, "tenant-a-secret").is_ok());
}

#[test]
fn test_wrong_service_secret_is_decryption_failure() {
    let service = test_service();
    let other = TokenService::new(
        tessera_core::ServiceConfig::new("other-secret", SALT, ISSUER)
            .with_kdf_iterations(tessera_core::MIN_KDF_ITERATIONS),
    )
    .unwrap();

    let token = service
        .issue_token(CALLER_SECRET, "u1", "Alice", None)
        .unwrap();

    let wrong_key = other.redeem_token(&token, CALLER_SECRET).unwrap_err();
    assert!(matches!(wrong_key, TokenError::DecryptionFailed));

    // Same message as tampering, so callers learn nothing about the cause
    let mut raw = envelope_bytes(&token);
    let last = raw.len() - 1;
    raw[last] ^= 1;
    let tampered = service
        .redeem_token(&envelope_text(&raw), CALLER_SECRET)
        .unwrap_err();
    assert_eq!(wrong_key.to_string(), tampered.to_string());
}

#[test]
fn test_expiry_after_clock_advance() {
    let clock = ManualClock::at(T0);
    let service = clocked_service(clock.clone());
    let token = service
        .issue_token(CALLER_SECRET, "u1", "Alice", None)
        .unwrap();

    assert!(service.redeem_token(&token, CALLER_SECRET).is_ok());

    clock.advance(service.timeout().as_secs() as i64);
    assert!(matches!(
        service.redeem_token(&token, CALLER_SECRET),
        Err(TokenError::InvalidToken)
    ));
}

#[test]
fn test_zero_timeout_rejected() {
    let service = TokenService::new(fast_config(ISSUER).with_timeout_minutes(0)).unwrap();
    let token = service
        .issue_token(CALLER_SECRET, "u1", "Alice", None)
        .unwrap();

    assert!(matches!(
        service.redeem_token(&token, CALLER_SECRET),
        Err(TokenError::InvalidToken)
    ));
}

#[test]
fn test_error_messages_leak_nothing() {
    let service = test_service();
    let token = service
        .issue_token(CALLER_SECRET, "u1", "Alice", None)
        .unwrap();

    let err = service.redeem_token(&token, "wrong").unwrap_err();
    let message = err.to_string();
    assert!(!message.contains(CALLER_SECRET));
    assert!(!message.contains(SHARED_SECRET));
    assert!(!message.contains(&token));
    assert!(!message.contains("u1"));
}
