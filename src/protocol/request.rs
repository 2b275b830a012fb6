//! Request body decoding

use axum::extract::rejection::BytesRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use bytes::Bytes;
use serde_json::{Map, Value};

use crate::error::ConfkvError;

/// Message for bodies over the configured size limit
pub const BODY_TOO_LARGE_MESSAGE: &str = "Request body is too large";

/// Request body decoded with `parse_body`
///
/// Failing to read the body (for example past the size limit) rejects with
/// a `ConfkvError`, so it reaches the client as the usual error body.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ConfkvError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let raw = Bytes::from_request(req, state).await.map_err(body_rejection)?;
        Ok(JsonBody(parse_body(&raw)))
    }
}

fn body_rejection(rejection: BytesRejection) -> ConfkvError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ConfkvError::PayloadTooLarge(BODY_TOO_LARGE_MESSAGE.to_string())
    } else {
        ConfkvError::InvalidInput(rejection.body_text())
    }
}

/// Decode a raw request body into a JSON object
///
/// A missing, malformed or non-object body decodes to `{}`, so validation
/// reports every required field instead of failing on the transport.
pub fn parse_body(raw: &Bytes) -> Value {
    if raw.is_empty() {
        return Value::Object(Map::new());
    }

    match serde_json::from_slice::<Value>(raw) {
        Ok(body @ Value::Object(_)) => body,
        Ok(_) => {
            tracing::debug!("Request body is not a JSON object");
            Value::Object(Map::new())
        }
        Err(e) => {
            tracing::debug!(error = %e, "Request body is not valid JSON");
            Value::Object(Map::new())
        }
    }
}
