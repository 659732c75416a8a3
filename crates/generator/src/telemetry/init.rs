//! Tracing subscriber initialisation.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// Outputs structured JSON logs to stdout. The filter comes from `RUST_LOG`
/// when set, otherwise from `log_level`.
///
/// # Errors
///
/// Returns an error if the subscriber has already been set.
pub fn init_telemetry(log_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter(log_level))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing subscriber: {e}"))
}

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_an_error() {
        // Another test may have installed a subscriber first; either way the
        // last call must fail.
        let _ = init_telemetry("info");
        assert!(init_telemetry("info").is_err());
    }

    #[test]
    fn falls_back_to_configured_level() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(env_filter("debug").to_string(), "debug");
        }
    }
}
