// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod query;
pub mod story;
pub mod user;

pub use query::{FilterType, ListQuery, SearchQuery, SortField, SortOrder};
pub use story::{ExploitationType, Gender, NewStory, Story, StoryPatch};
pub use user::UserProfile;
