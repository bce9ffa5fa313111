//! Core functionality shared by the Tessera token crates.
//!
//! This crate provides service configuration, logging initialization and the
//! configuration error type used across the workspace.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    ServiceConfig, DEFAULT_KDF_ITERATIONS, DEFAULT_TIMEOUT_MINUTES, ENV_PREFIX, KDF_VERSION,
    MIN_KDF_ITERATIONS,
};
pub use error::{ConfigError, ConfigResult};
