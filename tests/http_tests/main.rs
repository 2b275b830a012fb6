//! HTTP API tests
//!
//! Requests go through the full router (validation, service, error mapping)
//! via `oneshot`; one test drives a real listener with reqwest.


use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use confkv::network::{create_router, AppState};
use confkv::store::MemoryStore;
use confkv::ConfigService;
use serde_json::{json, Value};
use tower::ServiceExt;

pub fn memory_app() -> Router {
    app_with_limit(64 * 1024)
}

fn app_with_limit(max_body_bytes: usize) -> Router {
    let service = ConfigService::new(Arc::new(MemoryStore::new()));
    create_router(Arc::new(AppState::new(service, max_body_bytes)))
}

/// Send one request; returns the status and the JSON body (if any)
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Option<Value>) {
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    if bytes.is_empty() {
        (status, None)
    } else {
        (status, Some(serde_json::from_slice(&bytes).unwrap()))
    }
}

async fn seed(app: &Router, client: &str, version: i64, key: &str, value: &str) {
    let (status, _) = send(
        app,
        Method::POST,
        "/config",
        Some(json!({"client": client, "version": version, "key": key, "value": value})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

fn fail(message: &str) -> Option<Value> {
    Some(json!({"status": "fail", "message": message}))
}

const NO_CLIENT: &str = "No configs found for requested client";
const NO_VERSION: &str = "No configs found for requested client and version";

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_returns_flattened_record() {
    let app = memory_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/config",
        Some(json!({"client": "ios", "version": 109, "key": "theme", "value": "dark"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, Some(json!({"client": "ios", "version": 109, "theme": "dark"})));
}

#[tokio::test]
async fn test_create_duplicate_is_rejected() {
    let app = memory_app();
    seed(&app, "ios", 109, "theme", "dark").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/config",
        Some(json!({"client": "ios", "version": 109, "key": "font", "value": "big"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        fail("Duplicate value for fields: client, version. Please use another value!")
    );
}

#[tokio::test]
async fn test_create_with_empty_body_lists_every_violation() {
    let app = memory_app();

    let (status, body) = send(&app, Method::POST, "/config", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        fail(
            "Invalid input data. Client name has to be provided - type: string. \
             Proper version has to be provided - type: number. \
             Proper key parameter for config change has to be provided - type: string. \
             Proper value parameter for config change has to be provided - type: string"
        )
    );
}

#[tokio::test]
async fn test_create_rejects_bad_fields() {
    let app = memory_app();

    for body in [
        json!({"client": "ios", "version": 0, "key": "k", "value": "v"}),
        json!({"client": "ios", "version": "109", "key": "k", "value": "v"}),
        json!({"client": "ios", "version": 1.5, "key": "k", "value": "v"}),
        json!({"client": "ios", "version": 1, "key": "version", "value": "v"}),
        json!({"client": "ios", "version": 1, "key": "", "value": "v"}),
        json!({"client": "ios", "version": 1, "key": "k", "value": 7}),
        json!({"client": 12, "version": 1, "key": "k", "value": "v"}),
        json!({"client": "   ", "version": 1, "key": "k", "value": "v"}),
    ] {
        let (status, response) = send(&app, Method::POST, "/config", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(response.unwrap()["status"], "fail");
    }

    let (status, _) = send(&app, Method::GET, "/config/ios", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_malformed_json_is_invalid_input() {
    let app = memory_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/config")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_get_latest_picks_highest_version() {
    let app = memory_app();
    seed(&app, "ios", 110, "theme", "light").await;
    seed(&app, "ios", 109, "theme", "dark").await;

    let (status, body) = send(&app, Method::GET, "/config/ios", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Some(json!({"client": "ios", "version": 110, "theme": "light"})));
}

#[tokio::test]
async fn test_get_latest_with_versions_out_of_order() {
    let app = memory_app();
    seed(&app, "ios", 108, "configA", "valueA").await;
    send(
        &app,
        Method::PATCH,
        "/config/ios/108",
        Some(json!({"key": "configB", "value": "valueB"})),
    )
    .await;
    seed(&app, "ios", 109, "configC", "valueC").await;
    seed(&app, "ios", 105, "configD", "valueD").await;

    let (status, body) = send(&app, Method::GET, "/config/ios", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        Some(json!({"client": "ios", "version": 109, "configC": "valueC"}))
    );

    let (_, older) = send(&app, Method::GET, "/config/ios/108", None).await;
    assert_eq!(
        older,
        Some(json!({"client": "ios", "version": 108, "configA": "valueA", "configB": "valueB"}))
    );
}

#[tokio::test]
async fn test_get_latest_unknown_client() {
    let app = memory_app();

    let (status, body) = send(&app, Method::GET, "/config/unknown", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, fail(NO_CLIENT));
}

#[tokio::test]
async fn test_get_exact_version() {
    let app = memory_app();
    seed(&app, "ios", 109, "theme", "dark").await;
    seed(&app, "ios", 110, "theme", "light").await;

    let (status, body) = send(&app, Method::GET, "/config/ios/109", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Some(json!({"client": "ios", "version": 109, "theme": "dark"})));

    let (status, body) = send(&app, Method::GET, "/config/ios/111", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, fail(NO_VERSION));
}

#[tokio::test]
async fn test_non_numeric_path_version_is_not_found() {
    let app = memory_app();
    seed(&app, "ios", 109, "theme", "dark").await;

    let (status, body) = send(&app, Method::GET, "/config/ios/latest", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, fail(NO_VERSION));

    let (status, _) = send(&app, Method::GET, "/config/ios/109.0", None).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Updates
// =============================================================================

#[tokio::test]
async fn test_patch_by_body_merges_entry() {
    let app = memory_app();
    seed(&app, "ios", 109, "theme", "dark").await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/config",
        Some(json!({"client": "ios", "version": 109, "key": "font", "value": "big"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        Some(json!({"client": "ios", "version": 109, "theme": "dark", "font": "big"}))
    );
}

#[tokio::test]
async fn test_patch_by_body_unknown_record() {
    let app = memory_app();

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/config",
        Some(json!({"client": "ios", "version": 1, "key": "k", "value": "v"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, fail(NO_VERSION));
}

#[tokio::test]
async fn test_repeated_merge_leaves_same_state() {
    let app = memory_app();
    seed(&app, "ios", 109, "theme", "dark").await;
    let update = json!({"client": "ios", "version": 109, "key": "font", "value": "big"});

    let (first_status, first) = send(&app, Method::PATCH, "/config", Some(update.clone())).await;
    let (second_status, second) = send(&app, Method::PATCH, "/config", Some(update)).await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first, second);

    let (_, stored) = send(&app, Method::GET, "/config/ios/109", None).await;
    assert_eq!(
        stored,
        Some(json!({"client": "ios", "version": 109, "theme": "dark", "font": "big"}))
    );
}

#[tokio::test]
async fn test_patch_by_path_overwrites_existing_key() {
    let app = memory_app();
    seed(&app, "android", 7, "theme", "dark").await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/config/android/7",
        Some(json!({"key": "theme", "value": "light"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Some(json!({"client": "android", "version": 7, "theme": "light"})));
}

#[tokio::test]
async fn test_put_replaces_all_entries() {
    let app = memory_app();
    seed(&app, "ios", 109, "theme", "dark").await;
    send(
        &app,
        Method::PATCH,
        "/config/ios/109",
        Some(json!({"key": "font", "value": "big"})),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/config/ios/109",
        Some(json!({"key": "lang", "value": "en"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Some(json!({"client": "ios", "version": 109, "lang": "en"})));

    let (_, stored) = send(&app, Method::GET, "/config/ios/109", None).await;
    assert_eq!(stored, body);
}

#[tokio::test]
async fn test_path_updates_validate_before_lookup() {
    let app = memory_app();

    let (status, body) = send(
        &app,
        Method::PUT,
        "/config/nobody/1",
        Some(json!({"key": "version", "value": "x"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        fail("Invalid input data. Proper key parameter for config change has to be provided - type: string")
    );
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_then_missing() {
    let app = memory_app();
    seed(&app, "ios", 109, "theme", "dark").await;

    let (status, body) = send(&app, Method::DELETE, "/config/ios/109", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, None);

    let (status, body) = send(&app, Method::DELETE, "/config/ios/109", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, fail(NO_VERSION));

    let (status, _) = send(&app, Method::GET, "/config/ios", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Unmatched Routes
// =============================================================================

#[tokio::test]
async fn test_unknown_path() {
    let app = memory_app();

    let (status, body) = send(&app, Method::GET, "/health?verbose=1", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        fail("Can't find /health?verbose=1 on this server for given request type!")
    );
}

#[tokio::test]
async fn test_unsupported_method_on_known_path() {
    let app = memory_app();

    let (status, body) = send(&app, Method::DELETE, "/config/ios", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        fail("Can't find /config/ios on this server for given request type!")
    );

    let (status, _) = send(&app, Method::GET, "/config", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let app = app_with_limit(64);
    let body = json!({"client": "ios", "version": 1, "key": "k", "value": "x".repeat(256)});

    let (status, response) = send(&app, Method::POST, "/config", Some(body.clone())).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response, fail("Request body is too large"));

    let (status, response) = send(&app, Method::PUT, "/config/ios/1", Some(body)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response, fail("Request body is too large"));
}
