// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed HTTP client for the story API.
//!
//! Credentials come from a [`SessionStore`]; every request carries whatever
//! `SessionStore::authorization_header` yields at the time it is built.

use crate::models::{ListQuery, NewStory, SearchQuery, Story, StoryPatch, UserProfile};
use crate::routes::stories::{SearchResponse, StoriesResponse};
use crate::session::{KeyValueStore, SessionStore};
use crate::time_utils::{Clock, SystemClock};
use crate::validation::FieldError;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found")]
    NotFound,

    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Error body as produced by the server.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    fields: Option<Vec<FieldError>>,
}

/// Story API client bound to one session.
pub struct ApiClient<S, C = SystemClock> {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore<S, C>,
}

impl<S: KeyValueStore> ApiClient<S, SystemClock> {
    pub fn new(base_url: &str, storage: S) -> Self {
        Self::with_session(base_url, SessionStore::new(storage))
    }
}

impl<S: KeyValueStore, C: Clock> ApiClient<S, C> {
    pub fn with_session(base_url: &str, session: SessionStore<S, C>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &SessionStore<S, C> {
        &self.session
    }

    // ─── Session ─────────────────────────────────────────────────

    /// Persist the credential issued by the identity provider and the
    /// signed-in user's profile.
    pub fn sign_in(&self, token: &str, ttl_seconds: i64, profile: &UserProfile) {
        self.session.store_credential_with_ttl(token, ttl_seconds);
        self.session.store_user_profile(profile);
        tracing::info!(uid = %profile.uid, "Signed in");
    }

    pub fn sign_out(&self) {
        self.session.clear_session();
        tracing::info!("Signed out");
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        if !self.session.is_credential_valid() {
            return None;
        }
        self.session.get_user_profile()
    }

    // ─── Stories ─────────────────────────────────────────────────

    pub async fn create_story(&self, story: &NewStory) -> Result<Story, ClientError> {
        let response = self
            .request(Method::POST, "/api/stories")
            .json(story)
            .send()
            .await?;
        self.decode(response).await
    }

    pub async fn list_stories(&self, query: &ListQuery) -> Result<StoriesResponse, ClientError> {
        let response = self
            .request(Method::GET, "/api/stories")
            .query(query)
            .send()
            .await?;
        self.decode(response).await
    }

    pub async fn search_stories(
        &self,
        query: &SearchQuery,
    ) -> Result<SearchResponse, ClientError> {
        let response = self
            .request(Method::GET, "/api/stories/search")
            .query(query)
            .send()
            .await?;
        self.decode(response).await
    }

    pub async fn get_story(&self, id: &str) -> Result<Story, ClientError> {
        let response = self
            .request(Method::GET, &format!("/api/stories/{}", id))
            .send()
            .await?;
        self.decode(response).await
    }

    pub async fn update_story(&self, id: &str, patch: &StoryPatch) -> Result<Story, ClientError> {
        let response = self
            .request(Method::PUT, &format!("/api/stories/{}", id))
            .json(patch)
            .send()
            .await?;
        self.decode(response).await
    }

    pub async fn delete_story(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, &format!("/api/stories/{}", id))
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    // ─── Plumbing ────────────────────────────────────────────────

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .headers(self.session.authorization_header())
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, ClientError> {
        Ok(self.check(response).await?.json().await?)
    }

    /// Map non-success statuses to errors. A 401 means the server no longer
    /// accepts our token, so the stored credential is dropped.
    async fn check(&self, response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => {
                self.session.remove_credential();
                Err(ClientError::Unauthorized)
            }
            StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            _ => {
                let body = response.text().await.unwrap_or_default();
                if status == StatusCode::BAD_REQUEST {
                    if let Ok(ErrorBody {
                        fields: Some(fields),
                    }) = serde_json::from_str(&body)
                    {
                        return Err(ClientError::Validation(fields));
                    }
                }
                Err(ClientError::Status { status, body })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryStore, CREDENTIAL_KEY};
    use reqwest::header::AUTHORIZATION;

    fn response(status: u16, body: &'static str) -> Response {
        axum::http::Response::builder()
            .status(status)
            .body(body)
            .unwrap()
            .into()
    }

    fn profile() -> UserProfile {
        UserProfile {
            uid: "case-worker-7".to_string(),
            email: Some("worker@example.org".to_string()),
            display_name: None,
            organization: Some("Shelter Network".to_string()),
        }
    }

    #[test]
    fn test_request_carries_bearer_after_sign_in() {
        let client = ApiClient::new("http://localhost:8080/", MemoryStore::new());
        client.sign_in("tok-123", 3600, &profile());

        let request = client
            .request(Method::GET, "/api/stories")
            .build()
            .unwrap();

        assert_eq!(request.url().as_str(), "http://localhost:8080/api/stories");
        assert_eq!(request.headers().get(AUTHORIZATION).unwrap(), "Bearer tok-123");
        assert_eq!(client.current_user(), Some(profile()));
    }

    #[test]
    fn test_request_without_session_has_no_auth_header() {
        let client = ApiClient::new("http://localhost:8080", MemoryStore::new());
        let request = client.request(Method::GET, "/health").build().unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
        assert_eq!(client.current_user(), None);
    }

    #[test]
    fn test_sign_out_clears_both_records() {
        let client = ApiClient::new("http://localhost:8080", MemoryStore::new());
        client.sign_in("tok-123", 3600, &profile());
        client.sign_out();

        assert!(client.session().storage().is_empty());
        assert_eq!(client.current_user(), None);
    }

    #[tokio::test]
    async fn test_unauthorized_drops_credential() {
        let client = ApiClient::new("http://localhost:8080", MemoryStore::new());
        client.sign_in("tok-123", 3600, &profile());

        let err = client.check(response(401, "")).await.unwrap_err();

        assert!(matches!(err, ClientError::Unauthorized));
        assert_eq!(client.session().storage().get(CREDENTIAL_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_bad_request_decodes_field_errors() {
        let client = ApiClient::new("http://localhost:8080", MemoryStore::new());
        let body = r#"{"error":"validation_failed","fields":[{"field":"age","message":"Age must be an integer between 0 and 120"}]}"#;

        let err = client.check(response(400, body)).await.unwrap_err();

        match err {
            ClientError::Validation(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "age");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_other_status_keeps_body() {
        let client = ApiClient::new("http://localhost:8080", MemoryStore::new());
        let err = client
            .check(response(500, r#"{"error":"database_error"}"#))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ClientError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
    }
}
