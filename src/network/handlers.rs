//! HTTP handlers
//!
//! Each handler decodes and validates its input, then runs the service call
//! on the blocking pool since the store does synchronous file I/O.

use std::sync::Arc;

use axum::extract::{OriginalUri, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::{ConfkvError, Result};
use crate::protocol::{record_response, JsonBody};
use crate::service::ConfigService;
use crate::validation::{parse_path_version, ConfigChange, VersionedChange};

use super::routes::AppState;

async fn run_blocking<T, F>(state: &AppState, op: F) -> Result<T>
where
    F: FnOnce(&ConfigService) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    tokio::task::spawn_blocking(move || op(&service))
        .await
        .map_err(|e| ConfkvError::Task(e.to_string()))?
}

/// A path version that is not a number can never match a stored record
fn path_version(raw: &str) -> Result<i64> {
    parse_path_version(raw).ok_or_else(|| {
        ConfkvError::NotFound("No configs found for requested client and version".to_string())
    })
}

/// `POST /config`
pub(super) async fn create_config(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody,
) -> Result<Response> {
    let request = VersionedChange::from_body(&body)?;
    let record = run_blocking(&state, move |service| service.create(request)).await?;
    Ok(record_response(StatusCode::CREATED, &record))
}

/// `PATCH /config`
pub(super) async fn update_config(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody,
) -> Result<Response> {
    let request = VersionedChange::from_body(&body)?;
    let record = run_blocking(&state, move |service| {
        service.merge_update(request.client.trim(), request.version, request.change)
    })
    .await?;
    Ok(record_response(StatusCode::OK, &record))
}

/// `GET /config/{client}`
pub(super) async fn get_latest_config(
    State(state): State<Arc<AppState>>,
    Path(client): Path<String>,
) -> Result<Response> {
    let record = run_blocking(&state, move |service| service.get_latest(&client)).await?;
    Ok(record_response(StatusCode::OK, &record))
}

/// `GET /config/{client}/{version}`
pub(super) async fn get_config(
    State(state): State<Arc<AppState>>,
    Path((client, version)): Path<(String, String)>,
) -> Result<Response> {
    let version = path_version(&version)?;
    let record = run_blocking(&state, move |service| service.get_exact(&client, version)).await?;
    Ok(record_response(StatusCode::OK, &record))
}

/// `PATCH /config/{client}/{version}`
pub(super) async fn update_config_for_version(
    State(state): State<Arc<AppState>>,
    Path((client, version)): Path<(String, String)>,
    JsonBody(body): JsonBody,
) -> Result<Response> {
    let change = ConfigChange::from_body(&body)?;
    let version = path_version(&version)?;
    let record = run_blocking(&state, move |service| {
        service.merge_update(&client, version, change)
    })
    .await?;
    Ok(record_response(StatusCode::OK, &record))
}

/// `PUT /config/{client}/{version}`
pub(super) async fn replace_config(
    State(state): State<Arc<AppState>>,
    Path((client, version)): Path<(String, String)>,
    JsonBody(body): JsonBody,
) -> Result<Response> {
    let change = ConfigChange::from_body(&body)?;
    let version = path_version(&version)?;
    let record = run_blocking(&state, move |service| service.replace(&client, version, change)).await?;
    Ok(record_response(StatusCode::OK, &record))
}

/// `DELETE /config/{client}/{version}`
pub(super) async fn delete_config(
    State(state): State<Arc<AppState>>,
    Path((client, version)): Path<(String, String)>,
) -> Result<StatusCode> {
    let version = path_version(&version)?;
    run_blocking(&state, move |service| service.delete(&client, version)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Any path or method with no route
pub(super) async fn route_not_found(OriginalUri(uri): OriginalUri) -> Response {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    tracing::debug!(%target, "No route matched");

    ConfkvError::NotFound(format!(
        "Can't find {} on this server for given request type!",
        target
    ))
    .into_response()
}
