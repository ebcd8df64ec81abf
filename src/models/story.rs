// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Survivor story model for storage and API.
//!
//! Field names are camelCase both on the wire and in Firestore, so query
//! parameters such as `sortBy=rescueDate` name document fields directly.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ExploitationType {
    Sex,
    Labor,
}

impl ExploitationType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExploitationType::Sex => "sex",
            ExploitationType::Labor => "labor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Gender {
    Female,
    Male,
    #[serde(rename = "Non-binary")]
    NonBinary,
    Other,
}

/// Stored story document in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// 24-character hex id (also used as document ID)
    pub id: String,
    /// Rescue date (ISO 8601, as submitted)
    pub rescue_date: String,
    pub location: String,
    pub exploitation_type: ExploitationType,
    /// Free-text duration of exploitation ("3 years")
    pub duration: String,
    pub current_status: String,
    pub aspirations: String,
    pub living_conditions: String,
    pub age: u8,
    pub gender: Gender,
    /// Where the account was collected
    pub source: String,
    /// Subject of the token that created the story
    pub created_by: String,
    /// When the story was created (RFC 3339)
    pub created_at: String,
    /// Last modification (RFC 3339)
    pub updated_at: String,
}

/// Create request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct NewStory {
    pub rescue_date: String,
    pub location: String,
    pub exploitation_type: ExploitationType,
    pub duration: String,
    pub current_status: String,
    pub aspirations: String,
    pub living_conditions: String,
    pub age: u8,
    pub gender: Gender,
    pub source: String,
}

impl NewStory {
    pub fn into_story(self, id: String, created_by: String, now: String) -> Story {
        Story {
            id,
            rescue_date: self.rescue_date,
            location: self.location,
            exploitation_type: self.exploitation_type,
            duration: self.duration,
            current_status: self.current_status,
            aspirations: self.aspirations,
            living_conditions: self.living_conditions,
            age: self.age,
            gender: self.gender,
            source: self.source,
            created_by,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Update request body; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct StoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rescue_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exploitation_type: Option<ExploitationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspirations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub living_conditions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl StoryPatch {
    /// Apply present fields to `story` and bump `updated_at`.
    pub fn apply(self, story: &mut Story, now: String) {
        if let Some(v) = self.rescue_date {
            story.rescue_date = v;
        }
        if let Some(v) = self.location {
            story.location = v;
        }
        if let Some(v) = self.exploitation_type {
            story.exploitation_type = v;
        }
        if let Some(v) = self.duration {
            story.duration = v;
        }
        if let Some(v) = self.current_status {
            story.current_status = v;
        }
        if let Some(v) = self.aspirations {
            story.aspirations = v;
        }
        if let Some(v) = self.living_conditions {
            story.living_conditions = v;
        }
        if let Some(v) = self.age {
            story.age = v;
        }
        if let Some(v) = self.gender {
            story.gender = v;
        }
        if let Some(v) = self.source {
            story.source = v;
        }
        story.updated_at = now;
    }
}
