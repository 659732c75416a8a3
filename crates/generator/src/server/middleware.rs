//! Axum middleware layers applied to the router.
//!
//! Includes request tracing, timeout enforcement, and response compression.

use std::time::Duration;

/// Default per-request timeout applied to all routes.
///
/// Batch generation runs on a background task, so no handler comes close to it.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
