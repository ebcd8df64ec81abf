// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::{DateTime, Utc};
use haven_api::config::Config;
use haven_api::db::FirestoreDb;
use haven_api::middleware::auth::create_token;
use haven_api::routes::create_router;
use haven_api::time_utils::FixedClock;
use haven_api::validation::RuleSets;
use haven_api::AppState;
use serde_json::Value;
use std::sync::Arc;

/// Instant the test server's clock is pinned to.
#[allow(dead_code)]
pub const TEST_NOW: &str = "2026-03-01T12:00:00Z";

#[allow(dead_code)]
pub fn test_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(TEST_NOW)
        .unwrap()
        .with_timezone(&Utc)
}

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Connect to the emulator under a project id of its own, so every test
/// starts from an empty `stories` collection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    test_db_for(&format!("haven-test-{}", nanos)).await
}

/// Connect to the emulator for an existing test project.
#[allow(dead_code)]
pub async fn test_db_for(project_id: &str) -> FirestoreDb {
    FirestoreDb::new(project_id)
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app over `db` with the clock pinned to `now`.
#[allow(dead_code)]
pub fn create_app_with(db: FirestoreDb, now: DateTime<Utc>) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        config: Config::default(),
        db,
        rules: RuleSets::build().expect("rule tables are valid"),
        clock: Arc::new(FixedClock(now)),
    });

    (create_router(state.clone()), state)
}

/// Create a test app with an offline database and a fixed clock.
/// Returns the router and the shared state.
///
/// Requests that pass validation reach the handler and fail there with a
/// 500 database error, which is how tests tell "accepted" from "rejected".
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_app_with(FirestoreDb::new_mock(), test_now())
}

/// Create a bearer token accepted by the test app.
#[allow(dead_code)]
pub fn create_test_token(uid: &str, signing_key: &[u8]) -> String {
    create_token(uid, signing_key, 86400).expect("Failed to create token")
}

/// Build an authenticated request with an optional JSON body.
#[allow(dead_code)]
pub fn authed_request(
    state: &AppState,
    method: &str,
    uri: &str,
    body: Option<String>,
) -> Request<Body> {
    let token = create_test_token("case-worker-1", &state.config.token_signing_key);
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Field names reported in a validation error body.
#[allow(dead_code)]
pub fn error_fields(body: &Value) -> Vec<String> {
    body["fields"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// A create payload that passes every rule.
#[allow(dead_code)]
pub fn valid_story() -> Value {
    serde_json::json!({
        "rescueDate": "2025-11-20",
        "location": "Kathmandu, Nepal",
        "exploitationType": "sex",
        "duration": "18 months",
        "currentStatus": "Reunited with family, attending school",
        "aspirations": "Become a social worker",
        "livingConditions": "Lives with aunt in a two-room apartment",
        "age": 17,
        "gender": "Female",
        "source": "Border monitoring team"
    })
}
