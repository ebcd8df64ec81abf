// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request validation middleware.
//!
//! Each story route is layered with the middleware for its rule set. The
//! request is checked before the handler runs; on success it is forwarded
//! unchanged (the buffered body is put back).

use crate::error::{AppError, Result};
use crate::validation::{FieldError, RequestInput, RuleSet, Source};
use crate::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

type PathParams = HashMap<String, String>;

pub async fn validate_create(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response> {
    check(&state, &state.rules.create, PathParams::new(), request, next).await
}

pub async fn validate_update(
    State(state): State<Arc<AppState>>,
    Path(path): Path<PathParams>,
    request: Request,
    next: Next,
) -> Result<Response> {
    check(&state, &state.rules.update, path, request, next).await
}

pub async fn validate_list(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response> {
    check(&state, &state.rules.list, PathParams::new(), request, next).await
}

pub async fn validate_search(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response> {
    check(&state, &state.rules.search, PathParams::new(), request, next).await
}

pub async fn validate_id(
    State(state): State<Arc<AppState>>,
    Path(path): Path<PathParams>,
    request: Request,
    next: Next,
) -> Result<Response> {
    check(&state, &state.rules.id, path, request, next).await
}

async fn check(
    state: &AppState,
    rules: &RuleSet,
    path: PathParams,
    request: Request,
    next: Next,
) -> Result<Response> {
    let mut errors = Vec::new();
    let mut input = RequestInput {
        path,
        ..Default::default()
    };

    let mut repeated: Vec<String> = Vec::new();
    match Query::<Vec<(String, String)>>::try_from_uri(request.uri()) {
        Ok(Query(pairs)) => {
            for (key, value) in pairs {
                if input.query.contains_key(&key) {
                    if let Some(rule) = rules.rule_for(Source::Query, &key) {
                        if !repeated.contains(&key) {
                            errors.push(FieldError {
                                field: key.clone(),
                                message: format!("{} must not be repeated", rule.label),
                            });
                            repeated.push(key);
                        }
                    }
                    continue;
                }
                input.query.insert(key, value);
            }
        }
        Err(_) => errors.push(FieldError {
            field: "query".to_string(),
            message: "Query string could not be parsed".to_string(),
        }),
    }

    let request = if rules.reads_body() {
        let json_content_type = has_json_content_type(request.headers());

        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, state.config.max_body_bytes)
            .await
            .map_err(|_| AppError::BadRequest("Request body too large or unreadable".to_string()))?;

        // An unusable body still gets a per-field report against what could be read
        let parsed = serde_json::from_slice::<Value>(&bytes);
        if !json_content_type {
            errors.push(FieldError {
                field: "body".to_string(),
                message: "Request body must be sent as application/json".to_string(),
            });
        }
        match parsed {
            Ok(Value::Object(map)) => input.body = map,
            _ if !json_content_type => {}
            _ => errors.push(FieldError {
                field: "body".to_string(),
                message: "Request body must be a JSON object".to_string(),
            }),
        }

        Request::from_parts(parts, Body::from(bytes))
    } else {
        request
    };

    if let Err(field_errors) = rules.validate(&input, state.clock.now()) {
        // A repeated key has already been reported for that field
        errors.extend(
            field_errors
                .into_iter()
                .filter(|e| !repeated.contains(&e.field)),
        );
    }

    if !errors.is_empty() {
        tracing::debug!(
            kind = ?rules.kind(),
            fields = ?errors.iter().map(|e| e.field.as_str()).collect::<Vec<_>>(),
            "Request rejected by validation"
        );
        return Err(AppError::Validation(errors));
    }

    Ok(next.run(request).await)
}

/// `application/json` or an `application/*+json` subtype, as the `Json`
/// extractor requires.
fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}
