use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::store::StoreError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub code: String,
    pub message: String,
    pub trace_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl AppError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn bad_request(code: &str, message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn payload_too_large(message: &str) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", message)
    }

    fn internal(err: &StoreError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Server-side faults are logged in full but never echoed to the caller.
        let status = self.status;
        let exposed_message = if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(code = %self.code, error = %self.message, "Storage unavailable");
            "Storage is unavailable".to_string()
        } else if status.is_server_error() {
            tracing::error!(status = %status, code = %self.code, error = %self.message, "Internal API error");
            "Internal server error".to_string()
        } else {
            tracing::warn!(status = %status, code = %self.code, error = %self.message, "API error");
            self.message
        };

        let body = ErrorBody {
            success: false,
            code: self.code,
            message: exposed_message,
            trace_id: None,
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match &value {
            StoreError::Validation(msg) => Self::bad_request("VALIDATION_ERROR", msg),
            StoreError::MalformedSnapshot(msg) => Self::bad_request("MALFORMED_SNAPSHOT", msg),
            StoreError::NotFound { entity, key } => {
                Self::not_found(&format!("{entity} {key} not found"))
            }
            StoreError::StorageUnavailable(msg) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE", msg.as_str())
            }
            StoreError::BulkInsertFailed { source } => match source.as_ref() {
                StoreError::Validation(msg) => Self::bad_request("BULK_INSERT_FAILED", msg),
                _ => Self::internal(&value),
            },
            _ => Self::internal(&value),
        }
    }
}

fn envelope<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(ApiResponse { success: true, data })).into_response()
}

pub fn ok<T: Serialize>(data: T) -> Response {
    envelope(StatusCode::OK, data)
}

pub fn created<T: Serialize>(data: T) -> Response {
    envelope(StatusCode::CREATED, data)
}

pub fn paginated<T: Serialize>(data: Vec<T>, total: u64, page: u64, per_page: u64) -> Response {
    let total_pages = if per_page > 0 { total.div_ceil(per_page) } else { 0 };
    ok(PaginatedResponse {
        data,
        total,
        page,
        per_page,
        total_pages,
    })
}
