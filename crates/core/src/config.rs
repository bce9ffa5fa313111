//! Configuration management for the token service.
//!
//! A [`ServiceConfig`] can be built directly, parsed from TOML, or read from
//! `TESSERA_*` environment variables. Whatever the source, call
//! [`ServiceConfig::validate`] before handing it to a service.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[cfg(feature = "file-config")]
use std::path::Path;

/// PBKDF2 iteration count for key derivation version 1.
///
/// Changing this value changes every derived key, which invalidates all
/// previously issued tokens. Bump [`KDF_VERSION`] alongside it.
pub const DEFAULT_KDF_ITERATIONS: u32 = 600_000;

/// Lowest iteration count accepted by [`ServiceConfig::validate`].
pub const MIN_KDF_ITERATIONS: u32 = 1_000;

/// Version tag of the key derivation parameters above.
pub const KDF_VERSION: u16 = 1;

/// Default token lifetime in minutes.
pub const DEFAULT_TIMEOUT_MINUTES: u64 = 60;

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "TESSERA_";

/// Service configuration consumed by the token service.
///
/// `shared_secret` is a capability: anyone holding it together with `salt`
/// can decrypt every issued envelope. `salt` must stay stable for the
/// lifetime of the deployment; changing it invalidates issued tokens.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ServiceConfig {
    pub shared_secret: String,
    pub salt: String,
    pub issuer: String,
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u64,
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,
}

fn default_timeout_minutes() -> u64 {
    DEFAULT_TIMEOUT_MINUTES
}

fn default_kdf_iterations() -> u32 {
    DEFAULT_KDF_ITERATIONS
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("shared_secret", &"<redacted>")
            .field("salt", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("timeout_minutes", &self.timeout_minutes)
            .field("kdf_iterations", &self.kdf_iterations)
            .finish()
    }
}

impl ServiceConfig {
    /// Build a configuration with the default timeout and KDF iteration count.
    pub fn new(
        shared_secret: impl Into<String>,
        salt: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            shared_secret: shared_secret.into(),
            salt: salt.into(),
            issuer: issuer.into(),
            timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
        }
    }

    pub fn with_timeout_minutes(mut self, minutes: u64) -> Self {
        self.timeout_minutes = minutes;
        self
    }

    pub fn with_kdf_iterations(mut self, iterations: u32) -> Self {
        self.kdf_iterations = iterations;
        self
    }

    /// Token lifetime as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_minutes.saturating_mul(60))
    }

    /// Check that every required field is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.shared_secret.is_empty() {
            return Err(ConfigError::MissingField {
                field: "shared_secret",
            });
        }

        if self.salt.is_empty() {
            return Err(ConfigError::MissingField { field: "salt" });
        }

        if self.issuer.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "issuer" });
        }

        if self.kdf_iterations < MIN_KDF_ITERATIONS {
            return Err(ConfigError::InvalidField {
                field: "kdf_iterations",
                reason: format!(
                    "{} is below the minimum of {}",
                    self.kdf_iterations, MIN_KDF_ITERATIONS
                ),
            });
        }

        Ok(())
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "file-config")]
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    #[cfg(feature = "file-config")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            issuer = %config.issuer,
            "Loaded token service configuration"
        );
        Ok(config)
    }

    /// Read configuration from `TESSERA_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// `lookup` receives full variable names such as `TESSERA_SALT`.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{ENV_PREFIX}{suffix}"));

        let shared_secret = var("SHARED_SECRET").ok_or(ConfigError::MissingField {
            field: "shared_secret",
        })?;
        let salt = var("SALT").ok_or(ConfigError::MissingField { field: "salt" })?;
        let issuer = var("ISSUER").ok_or(ConfigError::MissingField { field: "issuer" })?;

        let timeout_minutes = match var("TIMEOUT_MINUTES") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidField {
                field: "timeout_minutes",
                reason: "expected a non-negative integer".to_string(),
            })?,
            None => DEFAULT_TIMEOUT_MINUTES,
        };

        let kdf_iterations = match var("KDF_ITERATIONS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidField {
                field: "kdf_iterations",
                reason: "expected a positive integer".to_string(),
            })?,
            None => DEFAULT_KDF_ITERATIONS,
        };

        let config = Self {
            shared_secret,
            salt,
            issuer,
            timeout_minutes,
            kdf_iterations,
        };
        config.validate()?;
        Ok(config)
    }
}
