//! Mapping of domain errors onto HTTP error responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{protocol::ErrorResponse, ServiceError};

use crate::batch::BatchError;
use crate::crypto::CipherError;
use crate::serial::SerialError;

/// Handler error: a [`ServiceError`] rendered as a JSON [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match &self.0 {
            ServiceError::BadRequest(m)
            | ServiceError::NotFound(m)
            | ServiceError::Conflict(m)
            | ServiceError::EncryptionFailure(m)
            | ServiceError::Internal(m) => m.clone(),
        };
        (status, Json(ErrorResponse::new(self.0.code(), message))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

/// Malformed or mistyped JSON bodies are client errors like any other.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ServiceError::BadRequest(rejection.body_text()))
    }
}

impl From<SerialError> for ApiError {
    fn from(e: SerialError) -> Self {
        Self(ServiceError::BadRequest(e.to_string()))
    }
}

impl From<CipherError> for ApiError {
    fn from(_: CipherError) -> Self {
        // Cipher details stay in the logs.
        Self(ServiceError::EncryptionFailure("token encryption failed".into()))
    }
}

impl From<BatchError> for ApiError {
    fn from(e: BatchError) -> Self {
        match e {
            BatchError::NoBatch => Self(ServiceError::NotFound(e.to_string())),
            BatchError::AlreadyRunning | BatchError::NotRunning | BatchError::NotCompleted => {
                Self(ServiceError::Conflict(e.to_string()))
            }
        }
    }
}
