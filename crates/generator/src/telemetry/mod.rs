//! Structured logging for the token service.
//!
//! # Telemetry invariants
//!
//! - **No key or IV material** may appear in any span attribute or log field,
//!   in raw or decoded form.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   takes precedence when set.

pub mod init;

pub use init::init_telemetry;
