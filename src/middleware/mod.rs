// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, validation, security).

pub mod auth;
pub mod security;
pub mod validate;

pub use auth::require_auth;
