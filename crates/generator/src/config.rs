//! Configuration loading and validation for the token service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Hard ceiling for batch worker pools.
pub const CONCURRENCY_CEILING: usize = 200;

/// Validated service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// AES key text: hex, Base64 or literal. Decoded at startup.
    #[serde(default)]
    pub aes_key: String,

    /// AES IV text: hex, Base64 or literal. Its decoded length picks the mode.
    #[serde(default)]
    pub aes_iv: String,

    /// Base URL used to assemble verification URLs. **Required.**
    pub api_base: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Product used when a request does not name one.
    #[serde(default = "default_product")]
    pub default_product: String,

    /// Batch worker count when a request does not specify one.
    #[serde(default = "default_concurrency")]
    pub default_concurrency: usize,

    /// Largest batch worker count a request may ask for.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Completions between batch progress updates.
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,

    /// File-name prefix for CSV downloads.
    #[serde(default = "default_csv_file_prefix")]
    pub csv_file_prefix: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_port() -> u16 {
    8080
}
fn default_product() -> String {
    "maron".into()
}
fn default_concurrency() -> usize {
    50
}
fn default_max_concurrency() -> usize {
    CONCURRENCY_CEILING
}
fn default_progress_every() -> usize {
    25
}
fn default_csv_file_prefix() -> String {
    "koas_urls".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    ///
    /// Key and IV texts are checked later by the secret decoder.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.api_base, "API_BASE")?;
        ensure_non_empty(&self.default_product, "DEFAULT_PRODUCT")?;

        if self.max_concurrency == 0 || self.max_concurrency > CONCURRENCY_CEILING {
            anyhow::bail!("MAX_CONCURRENCY must be between 1 and {CONCURRENCY_CEILING}");
        }
        if self.default_concurrency == 0 || self.default_concurrency > self.max_concurrency {
            anyhow::bail!("DEFAULT_CONCURRENCY must be between 1 and MAX_CONCURRENCY");
        }
        if self.progress_every == 0 {
            anyhow::bail!("PROGRESS_EVERY must be > 0");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("aes_key", &"[REDACTED]")
            .field("aes_iv", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("listen_port", &self.listen_port)
            .field("default_product", &self.default_product)
            .field("default_concurrency", &self.default_concurrency)
            .field("max_concurrency", &self.max_concurrency)
            .field("progress_every", &self.progress_every)
            .field("csv_file_prefix", &self.csv_file_prefix)
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        aes_key: "0123456789abcdef0123456789abcdef".into(),
        aes_iv: "a0a1a2a3a4a5a6a7a8a9aaab".into(),
        api_base: "https://verify.example.com/".into(),
        listen_port: default_listen_port(),
        default_product: default_product(),
        default_concurrency: default_concurrency(),
        max_concurrency: default_max_concurrency(),
        progress_every: default_progress_every(),
        csv_file_prefix: default_csv_file_prefix(),
        log_level: default_log_level(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_listen_port(), 8080);
        assert_eq!(default_product(), "maron");
        assert_eq!(default_concurrency(), 50);
        assert_eq!(default_max_concurrency(), 200);
        assert_eq!(default_progress_every(), 25);
        assert_eq!(default_csv_file_prefix(), "koas_urls");
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn test_config_is_valid() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_api_base() {
        let cfg = Config {
            api_base: "  ".into(),
            ..test_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_default_concurrency() {
        let cfg = Config {
            default_concurrency: 0,
            ..test_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_default_above_max() {
        let cfg = Config {
            default_concurrency: 60,
            max_concurrency: 40,
            ..test_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_max_above_ceiling() {
        let cfg = Config {
            max_concurrency: 201,
            ..test_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_progress_cadence() {
        let cfg = Config {
            progress_every: 0,
            ..test_config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let printed = format!("{:?}", test_config());
        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains("0123456789abcdef"));
        assert!(!printed.contains("a0a1a2"));
    }
}
