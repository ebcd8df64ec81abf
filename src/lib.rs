// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Haven: case-work backend for anti-trafficking survivor stories
//!
//! This crate provides the REST API for recording and querying survivor
//! stories, the request validation that guards it, and the client-side
//! session store and API client used by front-ends and tools.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod time_utils;
pub mod validation;

use config::Config;
use db::FirestoreDb;
use std::sync::Arc;
use time_utils::Clock;
use validation::RuleSets;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub rules: RuleSets,
    pub clock: Arc<dyn Clock>,
}
