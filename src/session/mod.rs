// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side session store.
//!
//! Holds exactly one bearer credential and one user profile in a
//! [`KeyValueStore`]. Expiry is checked lazily on every read; there is no
//! background timer. Storage faults are logged and degrade to "absent", so
//! no operation here ever returns an error to the caller.

pub mod storage;

pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};

use crate::time_utils::{Clock, SystemClock};
use axum::http::{header, HeaderMap, HeaderValue};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Storage key for the credential record.
pub const CREDENTIAL_KEY: &str = "auth_token";
/// Storage key for the user profile record.
pub const PROFILE_KEY: &str = "user_profile";
/// Credential lifetime used by [`SessionStore::store_credential`].
pub const DEFAULT_TTL_SECONDS: i64 = 3600;

/// Stored bearer token plus its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub token: String,
    /// Epoch milliseconds after which the token is invalid.
    pub expires_at: i64,
}

impl CredentialRecord {
    pub fn is_expired(&self, now_millis: i64) -> bool {
        now_millis > self.expires_at
    }
}

/// Credential and profile persistence over an injected store and clock.
pub struct SessionStore<S, C = SystemClock> {
    storage: S,
    clock: C,
}

impl<S: KeyValueStore> SessionStore<S, SystemClock> {
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> SessionStore<S, C> {
    pub fn with_clock(storage: S, clock: C) -> Self {
        Self { storage, clock }
    }

    /// Borrow the underlying store.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ─── Credential ──────────────────────────────────────────────

    /// Store `token` with the default one-hour lifetime.
    pub fn store_credential(&self, token: &str) {
        self.store_credential_with_ttl(token, DEFAULT_TTL_SECONDS);
    }

    /// Store `token`, valid for `ttl_seconds` from now. Overwrites any prior
    /// credential.
    pub fn store_credential_with_ttl(&self, token: &str, ttl_seconds: i64) {
        let record = CredentialRecord {
            token: token.to_string(),
            expires_at: self
                .clock
                .now_millis()
                .saturating_add(ttl_seconds.saturating_mul(1000)),
        };

        let serialized = match serde_json::to_string(&record) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize credential record");
                return;
            }
        };

        if let Err(e) = self.storage.set(CREDENTIAL_KEY, &serialized) {
            tracing::warn!(error = %e, "Failed to store credential");
            // Don't leave an older credential readable after a failed overwrite
            self.remove_key(CREDENTIAL_KEY);
        }
    }

    /// The stored token, if present and unexpired.
    ///
    /// Expired or malformed records are deleted as a side effect.
    pub fn get_credential(&self) -> Option<String> {
        let raw = self.read_key(CREDENTIAL_KEY)?;

        let record: CredentialRecord = match serde_json::from_str(&raw) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed credential record");
                self.remove_key(CREDENTIAL_KEY);
                return None;
            }
        };

        if record.is_expired(self.clock.now_millis()) {
            tracing::debug!(expires_at = record.expires_at, "Evicting expired credential");
            self.remove_key(CREDENTIAL_KEY);
            return None;
        }

        Some(record.token)
    }

    /// Delete the credential. Idempotent.
    pub fn remove_credential(&self) {
        self.remove_key(CREDENTIAL_KEY);
    }

    /// Whether [`Self::get_credential`] yields a token (evicting on expiry).
    pub fn is_credential_valid(&self) -> bool {
        self.get_credential().is_some()
    }

    // ─── User Profile ────────────────────────────────────────────

    /// Store the user profile. It does not expire with the credential.
    pub fn store_user_profile<P: Serialize + ?Sized>(&self, profile: &P) {
        let serialized = match serde_json::to_string(profile) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize user profile");
                return;
            }
        };

        if let Err(e) = self.storage.set(PROFILE_KEY, &serialized) {
            tracing::warn!(error = %e, "Failed to store user profile");
            self.remove_key(PROFILE_KEY);
        }
    }

    /// The stored profile, if present and decodable as `P`.
    pub fn get_user_profile<P: DeserializeOwned>(&self) -> Option<P> {
        let raw = self.read_key(PROFILE_KEY)?;

        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed user profile");
                self.remove_key(PROFILE_KEY);
                None
            }
        }
    }

    pub fn remove_user_profile(&self) {
        self.remove_key(PROFILE_KEY);
    }

    // ─── Session ─────────────────────────────────────────────────

    /// Remove both the credential and the profile.
    pub fn clear_session(&self) {
        self.remove_credential();
        self.remove_user_profile();
    }

    /// `Authorization: Bearer <token>` for a valid credential, else empty.
    pub fn authorization_header(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Some(token) = self.get_credential() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(_) => {
                    tracing::warn!("Stored credential is not a valid header value");
                }
            }
        }

        headers
    }

    // ─── Storage helpers ─────────────────────────────────────────

    fn read_key(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read session storage");
                None
            }
        }
    }

    fn remove_key(&self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            tracing::warn!(key, error = %e, "Failed to clear session storage");
        }
    }
}
