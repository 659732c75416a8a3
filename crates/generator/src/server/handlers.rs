//! Axum request handlers for all service endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use common::{
    protocol::{
        BatchAccepted, BatchRequest, BatchRowsResponse, BatchStatus, ErrorResponse,
        HealthResponse, TokenRequest, TokenRow,
    },
    ServiceError,
};
use tracing::warn;

use super::{error::ApiError, state::AppState};
use crate::batch::BatchJob;
use crate::crypto::SerialEncryptor;
use crate::export::{build_check_url, csv_file_name, render_csv, render_url_list};
use crate::serial::Serial;

/// `POST /token`: encrypt one serial and return its token and URL.
///
/// Surrounding whitespace in the serial is ignored; what remains must be
/// exactly four digits.
pub async fn token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenRow>, ApiError> {
    let Json(req) = payload?;
    let serial = Serial::parse(req.serial.trim())?;
    let product = state.settings.product_or_default(req.product.as_deref());

    let token = state.cipher.encrypt_serial(serial).map_err(|e| {
        warn!(serial = %serial, error = %e, "token encryption failed");
        e
    })?;

    let serial = serial.to_string();
    let url = build_check_url(&state.settings.api_base, &product, &serial, &token);
    Ok(Json(TokenRow {
        product,
        serial,
        token,
        url,
    }))
}

/// `POST /batch`: validate the range and start a background batch.
///
/// Returns `202 Accepted` with the batch id. Nothing is spawned if the range
/// or concurrency is invalid.
pub async fn start_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BatchAccepted>), ApiError> {
    let Json(req) = payload?;
    let max = state.settings.max_concurrency;
    let concurrency = req.concurrency.unwrap_or(state.settings.default_concurrency);
    if !(1..=max).contains(&concurrency) {
        return Err(ServiceError::BadRequest(format!(
            "concurrency must be between 1 and {max}, got {concurrency}"
        ))
        .into());
    }

    let product = state.settings.product_or_default(req.product.as_deref());
    let job = BatchJob::new(product, req.start.trim(), req.end.trim(), concurrency)?;
    let handle = state
        .batches
        .start(job, &state.scheduler, state.cipher.clone())
        .await?;

    Ok((StatusCode::ACCEPTED, Json(handle.accepted())))
}

/// `GET /batch`: status of the current batch.
pub async fn batch_status(State(state): State<AppState>) -> Result<Json<BatchStatus>, ApiError> {
    let handle = state.batches.current().await?;
    Ok(Json(handle.status()))
}

/// `DELETE /batch`: request cancellation of the running batch.
///
/// Cancellation is cooperative; the returned status may still read `running`.
pub async fn cancel_batch(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<BatchStatus>), ApiError> {
    let handle = state.batches.current().await?;
    handle.cancel()?;
    Ok((StatusCode::ACCEPTED, Json(handle.status())))
}

/// `GET /batch/rows`: the result table of a completed batch.
pub async fn batch_rows(
    State(state): State<AppState>,
) -> Result<Json<BatchRowsResponse>, ApiError> {
    let handle = state.batches.current().await?;
    let rows = handle.rows()?.to_vec();
    Ok(Json(BatchRowsResponse { rows }))
}

/// `GET /batch/csv`: the result table as a CSV download.
pub async fn batch_csv(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let handle = state.batches.current().await?;
    let body = render_csv(handle.rows()?);
    let file_name = csv_file_name(
        &state.settings.csv_file_prefix,
        handle.product(),
        handle.range(),
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", header_safe(&file_name)),
            ),
        ],
        body,
    ))
}

/// Replace characters that cannot appear inside a quoted header parameter.
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' '..='~' if c != '"' && c != '\\' => c,
            _ => '_',
        })
        .collect()
}

/// `GET /batch/urls`: newline-joined URLs of a completed batch.
pub async fn batch_urls(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let handle = state.batches.current().await?;
    let body = render_url_list(handle.rows()?);
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body))
}

/// `GET /health`: liveness check.
///
/// Secrets are decoded before the listener binds, so a serving process is
/// always ready.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        mode: state.cipher.mode().as_str().into(),
    })
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}
