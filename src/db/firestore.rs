// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for survivor stories.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{ExploitationType, ListQuery, SortOrder, Story};
use ring::rand::{SecureRandom, SystemRandom};

/// Upper bound on documents scanned by one search.
const SEARCH_SCAN_LIMIT: u32 = 1000;

/// Generate a 24-character hex document id.
pub fn new_document_id() -> Result<String, AppError> {
    let mut bytes = [0u8; 12];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System random generator failed")))?;
    Ok(hex::encode(bytes))
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Story Operations ────────────────────────────────────────

    /// Get a story by document id.
    pub async fn get_story(&self, id: &str) -> Result<Option<Story>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::STORIES)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a story.
    pub async fn upsert_story(&self, story: &Story) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::STORIES)
            .document_id(&story.id)
            .object(story)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a story.
    pub async fn delete_story(&self, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::STORIES)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List one page of stories, filtered by type and sorted.
    pub async fn list_stories(&self, query: &ListQuery) -> Result<Vec<Story>, AppError> {
        let exploitation_type = query.filter_type.unwrap_or_default().exploitation_type();
        let direction = match query.sort_order.unwrap_or_default() {
            SortOrder::Asc => firestore::FirestoreQueryDirection::Ascending,
            SortOrder::Desc => firestore::FirestoreQueryDirection::Descending,
        };
        let sort_field = query.sort_by.unwrap_or_default().field_name();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::STORIES)
            .filter(move |q| {
                q.for_all([exploitation_type
                    .and_then(|t| q.field("exploitationType").eq(t.as_str()))])
            })
            .order_by([(sort_field, direction)])
            .limit(query.limit())
            .offset(query.offset())
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Newest stories, optionally restricted to one exploitation type.
    ///
    /// Used as the candidate set for in-memory search.
    pub async fn search_candidates(
        &self,
        exploitation_type: Option<ExploitationType>,
    ) -> Result<Vec<Story>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::STORIES)
            .filter(move |q| {
                q.for_all([exploitation_type
                    .and_then(|t| q.field("exploitationType").eq(t.as_str()))])
            })
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .limit(SEARCH_SCAN_LIMIT)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
