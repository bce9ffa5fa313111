//! Test utilities for token integration tests

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Once};
use tessera_core::{ServiceConfig, MIN_KDF_ITERATIONS};
use tessera_identity::{Clock, TokenService};

pub const SHARED_SECRET: &str = "s3cr3t";
pub const SALT: &str = "pepper";
pub const ISSUER: &str = "svc";
pub const CALLER_SECRET: &str = "s3cr3t";

/// Fixed starting point for clock-driven tests
pub const T0: i64 = 1_700_000_000;

static TRACING: Once = Once::new();

/// Install a test subscriber once per process so rejections show up with
/// `--nocapture`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("warn")
            .with_test_writer()
            .try_init();
    });
}

/// Configuration with the minimum KDF cost so tests stay fast
pub fn fast_config(issuer: &str) -> ServiceConfig {
    ServiceConfig::new(SHARED_SECRET, SALT, issuer)
        .with_timeout_minutes(60)
        .with_kdf_iterations(MIN_KDF_ITERATIONS)
}

/// Service for the default issuer on the system clock
pub fn test_service() -> TokenService {
    init_tracing();
    TokenService::new(fast_config(ISSUER)).expect("valid test config")
}

/// Clock that only moves when told to
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn at(now: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(now)))
    }

    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Service for the default issuer on a manual clock
pub fn clocked_service(clock: Arc<ManualClock>) -> TokenService {
    init_tracing();
    TokenService::with_clock(fast_config(ISSUER), clock).expect("valid test config")
}

/// Decode an envelope to its raw bytes
pub fn envelope_bytes(envelope: &str) -> Vec<u8> {
    URL_SAFE_NO_PAD.decode(envelope).expect("envelope is base64url")
}

/// Encode raw bytes as envelope text
pub fn envelope_text(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}
