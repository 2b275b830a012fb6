//! Response encoding
//!
//! Records are written flattened; errors become a `{status, message}` body.
//! Only operational errors reveal their message to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ConfkvError;
use crate::record::ConfigRecord;

/// Message sent in place of any unexpected failure
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong!";

/// Error class reported in the `status` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStatus {
    /// 4xx: the request was at fault
    Fail,
    /// 5xx: the server was at fault
    Error,
}

impl ErrorStatus {
    pub fn for_status(code: StatusCode) -> Self {
        if code.is_client_error() {
            ErrorStatus::Fail
        } else {
            ErrorStatus::Error
        }
    }
}

/// JSON error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: ErrorStatus,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: ErrorStatus::for_status(code),
            message: message.into(),
        }
    }
}

/// Serialize a record with its entries spread at the top level
pub fn record_response(code: StatusCode, record: &ConfigRecord) -> Response {
    (code, Json(record.flatten())).into_response()
}

impl IntoResponse for ConfkvError {
    fn into_response(self) -> Response {
        let err = self.into_operational();
        let code = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if err.is_operational() {
            err.to_string()
        } else {
            tracing::error!(error = %err, "Request failed");
            INTERNAL_ERROR_MESSAGE.to_string()
        };

        (code, Json(ErrorBody::new(code, message))).into_response()
    }
}
