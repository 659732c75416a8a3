//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::batch::{BatchScheduler, BatchSlot};
use crate::config::Config;
use crate::crypto::TokenCipher;

/// Request-facing settings copied out of [`Config`].
///
/// Secret texts are not carried here; only the decoded cipher is kept.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base: String,
    pub default_product: String,
    pub default_concurrency: usize,
    pub max_concurrency: usize,
    pub csv_file_prefix: String,
}

impl Settings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            api_base: cfg.api_base.clone(),
            default_product: cfg.default_product.clone(),
            default_concurrency: cfg.default_concurrency,
            max_concurrency: cfg.max_concurrency,
            csv_file_prefix: cfg.csv_file_prefix.clone(),
        }
    }

    /// The request's product, or the default when absent or blank.
    pub fn product_or_default(&self, product: Option<&str>) -> String {
        match product.map(str::trim) {
            Some(p) if !p.is_empty() => p.to_owned(),
            _ => self.default_product.clone(),
        }
    }
}

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-wrapped or already `Arc`-backed) so
/// that Axum can clone the state for each request without copying expensive data.
#[derive(Clone)]
pub struct AppState {
    /// Process-lifetime token cipher.
    pub cipher: Arc<TokenCipher>,
    /// The single current batch run.
    pub batches: BatchSlot,
    /// Worker-pool runner for new batches.
    pub scheduler: BatchScheduler,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new [`AppState`] from the loaded cipher and configuration.
    pub fn new(cipher: TokenCipher, cfg: &Config) -> Self {
        let settings = Settings::from_config(cfg);
        Self {
            cipher: Arc::new(cipher),
            batches: BatchSlot::new(),
            scheduler: BatchScheduler::new(settings.api_base.as_str(), cfg.progress_every),
            settings: Arc::new(settings),
        }
    }
}

#[cfg(test)]
impl Default for AppState {
    /// State built from the test configuration: 16-byte hex key, 12-byte IV (GCM).
    fn default() -> Self {
        let cfg = crate::config::test_config();
        let cipher = crate::secret::load_cipher(&cfg.aes_key, &cfg.aes_iv).unwrap();
        Self::new(cipher, &cfg)
    }
}
