// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Survivor story routes.
//!
//! Every route is layered with the validation middleware for its rule set,
//! so handlers only ever see requests that passed validation.

use crate::db::new_document_id;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::middleware::validate::{
    validate_create, validate_id, validate_list, validate_search, validate_update,
};
use crate::models::{ListQuery, NewStory, SearchQuery, Story, StoryPatch};
use crate::services::search::StoryFilter;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Story routes (require authentication).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/stories",
            post(create_story)
                .route_layer(from_fn_with_state(state.clone(), validate_create))
                .merge(
                    get(list_stories)
                        .route_layer(from_fn_with_state(state.clone(), validate_list)),
                ),
        )
        .route(
            "/api/stories/search",
            get(search_stories).route_layer(from_fn_with_state(state.clone(), validate_search)),
        )
        .route(
            "/api/stories/{id}",
            get(get_story)
                .route_layer(from_fn_with_state(state.clone(), validate_id))
                .merge(
                    put(update_story)
                        .route_layer(from_fn_with_state(state.clone(), validate_update)),
                )
                .merge(
                    delete(delete_story).route_layer(from_fn_with_state(state, validate_id)),
                ),
        )
}

// ─── Responses ───────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StoriesResponse {
    pub stories: Vec<Story>,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SearchResponse {
    pub stories: Vec<Story>,
    pub total: u32,
}

// ─── Handlers ────────────────────────────────────────────────

/// Record a new survivor story.
async fn create_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(new_story): Json<NewStory>,
) -> Result<(StatusCode, Json<Story>)> {
    let id = new_document_id()?;
    let now = format_utc_rfc3339(state.clock.now());
    let story = new_story.into_story(id, user.uid.clone(), now);

    state.db.upsert_story(&story).await?;

    tracing::info!(
        story_id = %story.id,
        created_by = %user.uid,
        exploitation_type = story.exploitation_type.as_str(),
        "Story created"
    );

    Ok((StatusCode::CREATED, Json(story)))
}

/// List stories with optional filtering, sorting and pagination.
async fn list_stories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> Result<Json<StoriesResponse>> {
    tracing::debug!(
        page = params.page(),
        limit = params.limit(),
        filter_type = ?params.filter_type,
        sort_by = ?params.sort_by,
        sort_order = ?params.sort_order,
        "Listing stories"
    );

    let stories = state.db.list_stories(&params).await?;

    Ok(Json(StoriesResponse {
        stories,
        page: params.page(),
        limit: params.limit(),
    }))
}

/// Search stories by text, type, location and age range.
async fn search_stories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    let exploitation_type = params.story_type.unwrap_or_default().exploitation_type();
    let candidates = state.db.search_candidates(exploitation_type).await?;
    let scanned = candidates.len();

    let stories = StoryFilter::from_query(&params).apply(candidates);

    tracing::debug!(scanned, matched = stories.len(), "Story search");

    Ok(Json(SearchResponse {
        total: stories.len() as u32,
        stories,
    }))
}

async fn get_story(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Story>> {
    let story = state
        .db
        .get_story(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Story {} not found", id)))?;

    Ok(Json(story))
}

/// Update the fields present in the body.
///
/// Fetch-modify-write so absent fields keep their stored values.
async fn update_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(patch): Json<StoryPatch>,
) -> Result<Json<Story>> {
    let mut story = state
        .db
        .get_story(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Story {} not found", id)))?;

    patch.apply(&mut story, format_utc_rfc3339(state.clock.now()));
    state.db.upsert_story(&story).await?;

    tracing::info!(story_id = %id, updated_by = %user.uid, "Story updated");

    Ok(Json(story))
}

async fn delete_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if state.db.get_story(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("Story {} not found", id)));
    }

    state.db.delete_story(&id).await?;

    tracing::info!(story_id = %id, deleted_by = %user.uid, "Story deleted");

    Ok(StatusCode::NO_CONTENT)
}
