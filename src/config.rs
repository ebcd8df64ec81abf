//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development. In production the
//! signing key is injected as an environment variable by the deployment.

use std::env;

/// Request bodies above this size are rejected before validation.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,

    // --- Secrets ---
    /// HS256 key for verifying bearer tokens (raw bytes)
    pub token_signing_key: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            token_signing_key: b"test_signing_key_32_bytes_long!!".to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let token_signing_key = env::var("TOKEN_SIGNING_KEY")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("TOKEN_SIGNING_KEY"))?;
        if token_signing_key.is_empty() {
            return Err(ConfigError::Invalid("TOKEN_SIGNING_KEY", "must not be empty"));
        }

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            max_body_bytes: env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
            token_signing_key: token_signing_key.into_bytes(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid environment variable {0}: {1}")]
    Invalid(&'static str, &'static str),
}
