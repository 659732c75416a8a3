//! Request and response types exchanged over the public HTTP API.
//!
//! All bodies are JSON. Serials are always carried as 4-digit zero-padded text
//! (`"0001"`..`"9999"`), never as numbers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value written into `token` and `url` of a batch row whose encryption failed.
pub const ERROR_SENTINEL: &str = "ERROR";

// ---------------------------------------------------------------------------
// Single token
// ---------------------------------------------------------------------------

/// Request body for `POST /token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    /// Product path segment; the configured default is used when absent.
    #[serde(default)]
    pub product: Option<String>,
    /// 4-digit serial, e.g. `"0042"`.
    pub serial: String,
}

/// One generated token together with its verification URL.
///
/// Returned by `POST /token` and used as the row type of a batch table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRow {
    pub product: String,
    pub serial: String,
    pub token: String,
    pub url: String,
}

impl TokenRow {
    /// Build the sentinel row recorded when encrypting `serial` failed.
    pub fn failed(product: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            serial: serial.into(),
            token: ERROR_SENTINEL.into(),
            url: ERROR_SENTINEL.into(),
        }
    }

    /// Returns `true` if this row is a failure sentinel.
    pub fn is_failed(&self) -> bool {
        self.token == ERROR_SENTINEL
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Request body for `POST /batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub product: Option<String>,
    /// First serial of the inclusive range, 4 digits.
    pub start: String,
    /// Last serial of the inclusive range, 4 digits.
    pub end: String,
    /// Worker pool size; the configured default is used when absent.
    #[serde(default)]
    pub concurrency: Option<usize>,
}

/// `202 Accepted` body for `POST /batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAccepted {
    pub id: Uuid,
    /// Number of serials in the range.
    pub total: usize,
    /// Effective worker count after clamping to `1..=total`.
    pub workers: usize,
}

/// Lifecycle state of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Response body for `GET /batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatus {
    pub id: Uuid,
    pub state: BatchState,
    /// Last published progress percentage, `0..=100`.
    pub progress: u8,
    /// Number of rows written so far (successful or sentinel).
    pub completed: usize,
    pub total: usize,
    pub product: String,
    pub start: String,
    pub end: String,
}

/// Response body for `GET /batch/rows`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRowsResponse {
    pub rows: Vec<TokenRow>,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` once the process is serving; secrets are loaded before bind.
    pub status: String,
    /// Cipher mode selected from the IV length, e.g. `"aes-gcm"`.
    pub mode: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_request_product_is_optional() {
        let req: TokenRequest = serde_json::from_value(json!({"serial": "0042"})).unwrap();
        assert!(req.product.is_none());
        assert_eq!(req.serial, "0042");
    }

    #[test]
    fn failed_row_uses_sentinel() {
        let row = TokenRow::failed("maron", "0007");
        assert!(row.is_failed());
        assert_eq!(row.url, ERROR_SENTINEL);
        assert_eq!(row.serial, "0007");
    }

    #[test]
    fn batch_state_serialises_snake_case() {
        let s = serde_json::to_string(&BatchState::Cancelled).unwrap();
        assert_eq!(s, "\"cancelled\"");
    }

    #[test]
    fn batch_request_defaults() {
        let req: BatchRequest =
            serde_json::from_value(json!({"start": "0001", "end": "0010"})).unwrap();
        assert!(req.concurrency.is_none());
        assert!(req.product.is_none());
    }

    #[test]
    fn error_response_new() {
        let e = ErrorResponse::new("bad_request", "serial must be 4 digits");
        assert_eq!(e.code, "bad_request");
        assert!(e.message.contains("4 digits"));
    }
}
