//! Concurrent issuance and redemption against one shared service
//!
//! The service holds no mutable state, so these tests share a plain
//! `Arc<TokenService>` with no lock between tasks.

use crate::test_utils::*;
use std::collections::HashSet;
use std::sync::Arc;
use tessera_identity::{TokenAuthority, TokenError};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_redemption_of_one_token() {
    let service = Arc::new(test_service());
    let token = Arc::new(
        service
            .issue_token(CALLER_SECRET, "u1", "Alice", None)
            .unwrap(),
    );

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = Arc::clone(&service);
        let token = Arc::clone(&token);
        handles.push(tokio::task::spawn_blocking(move || {
            service.redeem_token(&token, CALLER_SECRET)
        }));
    }

    for handle in handles {
        let identity = handle.await.unwrap().unwrap();
        assert_eq!(identity, ("u1".to_string(), "Alice".to_string()));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_issuance_yields_distinct_envelopes() {
    let service = Arc::new(test_service());

    let mut handles = Vec::new();
    for n in 0..16 {
        let service = Arc::clone(&service);
        handles.push(tokio::task::spawn_blocking(move || {
            let subject = format!("user-{n}");
            let token = service.issue_token(CALLER_SECRET, &subject, "Parallel", None)?;
            let (redeemed, _) = service.redeem_token(&token, CALLER_SECRET)?;
            assert_eq!(redeemed, subject);
            Ok::<_, TokenError>(token)
        }));
    }

    let mut envelopes = HashSet::new();
    for handle in handles {
        envelopes.insert(handle.await.unwrap().unwrap());
    }
    assert_eq!(envelopes.len(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failures_do_not_disturb_other_callers() {
    let service = Arc::new(test_service());
    let token = service
        .issue_token(CALLER_SECRET, "u1", "Alice", None)
        .unwrap();

    let mut handles = Vec::new();
    for n in 0..12 {
        let service = Arc::clone(&service);
        let token = token.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let secret = if n % 2 == 0 { CALLER_SECRET } else { "wrong" };
            (n, service.redeem_token(&token, secret))
        }));
    }

    for handle in handles {
        let (n, result) = handle.await.unwrap();
        if n % 2 == 0 {
            assert!(result.is_ok());
        } else {
            assert!(matches!(result, Err(TokenError::InvalidSignature)));
        }
    }
}
