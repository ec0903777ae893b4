//! Axum request handlers for all service endpoints.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{
    ErrorResponse, HealthResponse, RecordBody, RecordPayload, RotateResponse,
};
use common::ServiceError;
use tracing::warn;

use super::state::AppState;
use crate::store::{Record, StoreError};

/// Pagination defaults matching the list endpoint's query parameters.
const DEFAULT_PAGE: usize = 1;
const DEFAULT_PER_PAGE: usize = 10;

/// JSON-rendering wrapper around [`ServiceError`] for handler return values.
pub struct ApiError(ServiceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse::new(self.0.code(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError(ServiceError::NotFound(err.to_string())),
            StoreError::Crypto(e) => {
                // Field values never appear in the log; the error carries none.
                warn!(error = %e, "field crypto operation failed");
                ApiError(ServiceError::EncryptionFailure(e.to_string()))
            }
        }
    }
}

/// `POST /records` — create a record with its protected fields encrypted at
/// rest.
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<RecordPayload>,
) -> Result<(StatusCode, Json<RecordBody>), ApiError> {
    let created = state.store.create(record_from_payload(0, payload)).await?;
    Ok((StatusCode::CREATED, Json(body_from_record(created)?)))
}

/// `GET /records/{id}` — fetch one record, decrypted.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RecordBody>, ApiError> {
    let record = state.store.get(id).await?;
    Ok(Json(body_from_record(record)?))
}

/// `GET /records` — list records with `page` / `per_page` pagination.
///
/// Missing or unparseable parameters fall back to page 1, 10 per page.
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<RecordBody>>, ApiError> {
    let page = positive_param(&params, "page", DEFAULT_PAGE);
    let per_page = positive_param(&params, "per_page", DEFAULT_PER_PAGE);

    let records = state.store.list((page - 1) * per_page, per_page).await?;
    let bodies = records
        .into_iter()
        .map(body_from_record)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(bodies))
}

/// `PUT /records/{id}` — replace a record's protected fields.
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RecordPayload>,
) -> Result<Json<RecordBody>, ApiError> {
    let updated = state.store.update(record_from_payload(id, payload)).await?;
    Ok(Json(body_from_record(updated)?))
}

/// `DELETE /records/{id}` — remove a record.
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /rotate` — re-seal every stored record under the current key version.
pub async fn rotate(State(state): State<AppState>) -> Result<Json<RotateResponse>, ApiError> {
    let reencrypted = state.store.reencrypt_all().await?;
    Ok(Json(RotateResponse { reencrypted }))
}

/// `GET /health` — liveness check with key-catalog and store facts.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        current_key_version: state.cipher.current_version(),
        key_versions: state.cipher.key_versions(),
        records_stored: state.store.count().await,
    })
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

// ---------------------------------------------------------------------------
// DTO conversions
// ---------------------------------------------------------------------------

fn record_from_payload(id: i64, payload: RecordPayload) -> Record {
    Record {
        id,
        name: payload.name.into_bytes(),
        email: payload.email.into_bytes(),
    }
}

fn body_from_record(record: Record) -> Result<RecordBody, ApiError> {
    let Record { id, name, email } = record;
    Ok(RecordBody {
        id,
        name: utf8_field(name, "name")?,
        email: utf8_field(email, "email")?,
    })
}

fn utf8_field(bytes: Vec<u8>, field: &str) -> Result<String, ApiError> {
    String::from_utf8(bytes).map_err(|_| {
        ApiError(ServiceError::Internal(format!(
            "stored {field} is not valid UTF-8"
        )))
    })
}

fn positive_param(params: &HashMap<String, String>, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(|v| v.parse().ok())
        .filter(|&v| v >= 1)
        .unwrap_or(default)
}
