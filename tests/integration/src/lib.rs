//! Integration tests for the token envelope across crate boundaries
//!
//! This test suite validates:
//! - Issuance and redemption through the public service API
//! - Adversarial envelopes: tampering, truncation, splicing, issuer spoofing
//! - Concurrent redemption from many tasks against one shared service
//! - Configuration loading feeding a working service
//! - The `TokenAuthority` seam with a substitute implementation

pub mod test_utils;

#[cfg(test)]
mod envelope_attack_tests;

#[cfg(test)]
mod concurrency_tests;
