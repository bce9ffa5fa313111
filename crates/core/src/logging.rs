//! Structured logging setup for Tessera services and tools.
//!
//! Token operations emit `tracing` events; this module installs the
//! subscriber that renders them. Secrets, derived keys and token text are
//! never recorded by any Tessera crate, so either output format is safe to
//! ship to a log aggregator.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install a human-readable subscriber.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// Returns `false` if a global subscriber was already installed.
///
/// # Example
/// ```no_run
/// use tessera_core::logging;
///
/// logging::init();
/// tracing::info!("token service started");
/// ```
pub fn init() -> bool {
    tracing_subscriber::registry()
        .with(env_filter(DEFAULT_FILTER))
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init()
        .is_ok()
}

/// Install a JSON subscriber for production log pipelines.
///
/// # Example
/// ```no_run
/// use tessera_core::logging;
///
/// logging::init_json();
/// tracing::info!(issuer = "svc", "token service started");
/// ```
pub fn init_json() -> bool {
    tracing_subscriber::registry()
        .with(env_filter(DEFAULT_FILTER))
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .try_init()
        .is_ok()
}

/// Install a compact subscriber on stderr for command-line tools.
///
/// Keeps stdout free for command output. Defaults to `warn` when `RUST_LOG`
/// is unset.
pub fn init_cli() -> bool {
    tracing_subscriber::registry()
        .with(env_filter("warn"))
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
