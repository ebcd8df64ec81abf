// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Table-driven request validation.
//!
//! A [`RuleSet`] is a list of [`FieldRule`]s, each naming where a field comes
//! from, whether it is required, and an ordered list of checks with their
//! messages. [`RuleSet::validate`] evaluates every rule and collects all
//! violations. Within a single field evaluation stops at the first failing
//! check, so each field reports at most one error.

pub mod rules;

pub use rules::RuleSets;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use validator::ValidateLength;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

static AGE_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(-[0-9]+)?$").expect("valid age range pattern"));

static DOCUMENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{24}$").expect("valid document id pattern"));

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Which operation a rule set guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Create,
    Update,
    List,
    Search,
    IdOnly,
}

/// Where a field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Body,
    Query,
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// A single format or bounds check.
#[derive(Debug, Clone)]
pub enum Check {
    /// Text length in characters, inclusive.
    Length { min: u64, max: u64 },
    /// Integer within optional inclusive bounds. Body values must be JSON
    /// integers, so `30.0` fails like `"30"`.
    Integer { min: Option<i64>, max: Option<i64> },
    /// Exact, case-sensitive membership.
    OneOf(&'static [&'static str]),
    /// `YYYY-MM-DD` date or RFC 3339 date-time.
    Iso8601,
    /// Date not strictly after the validation instant.
    NotInFuture,
    /// `N` or `N-M` with non-negative integers. Order of bounds is not checked.
    AgeRange,
    /// 24-character hexadecimal document id.
    DocumentId,
}

/// Value of a field as found in the request.
#[derive(Debug, Clone, Copy)]
enum FieldValue<'a> {
    Json(&'a Value),
    Text(&'a str),
}

impl<'a> FieldValue<'a> {
    fn as_text(self) -> Option<&'a str> {
        match self {
            FieldValue::Json(Value::String(s)) => Some(s.as_str()),
            FieldValue::Json(_) => None,
            FieldValue::Text(s) => Some(s),
        }
    }

    fn as_integer(self) -> Option<i64> {
        match self {
            FieldValue::Json(Value::Number(n)) => n.as_i64(),
            FieldValue::Json(_) => None,
            FieldValue::Text(s) => s.parse().ok(),
        }
    }
}

/// Parse an ISO 8601 date or date-time into a UTC instant.
///
/// Bare dates and zone-less date-times are taken as UTC.
pub fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

impl Check {
    fn passes(&self, value: FieldValue<'_>, now: DateTime<Utc>) -> bool {
        match self {
            Check::Length { min, max } => value
                .as_text()
                .is_some_and(|s| s.validate_length(Some(*min), Some(*max), None)),
            Check::Integer { min, max } => value.as_integer().is_some_and(|n| {
                min.is_none_or(|lo| n >= lo) && max.is_none_or(|hi| n <= hi)
            }),
            Check::OneOf(allowed) => value
                .as_text()
                .is_some_and(|s| allowed.iter().any(|a| *a == s)),
            Check::Iso8601 => value.as_text().and_then(parse_iso8601).is_some(),
            Check::NotInFuture => value
                .as_text()
                .and_then(parse_iso8601)
                .is_some_and(|date| date <= now),
            Check::AgeRange => value.as_text().is_some_and(|s| AGE_RANGE.is_match(s)),
            Check::DocumentId => value.as_text().is_some_and(|s| DOCUMENT_ID.is_match(s)),
        }
    }

    fn bounds_are_ordered(&self) -> bool {
        match self {
            Check::Length { min, max } => min <= max,
            Check::Integer {
                min: Some(lo),
                max: Some(hi),
            } => lo <= hi,
            Check::OneOf(allowed) => !allowed.is_empty(),
            _ => true,
        }
    }
}

/// Rules for one field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: &'static str,
    /// Human-readable name used in the "is required" message.
    pub label: &'static str,
    pub source: Source,
    pub presence: Presence,
    pub checks: Vec<(Check, &'static str)>,
}

impl FieldRule {
    fn new(source: Source, field: &'static str, label: &'static str) -> Self {
        Self {
            field,
            label,
            source,
            presence: Presence::Optional,
            checks: Vec::new(),
        }
    }

    pub fn body(field: &'static str, label: &'static str) -> Self {
        Self::new(Source::Body, field, label)
    }

    pub fn query(field: &'static str, label: &'static str) -> Self {
        Self::new(Source::Query, field, label)
    }

    pub fn path(field: &'static str, label: &'static str) -> Self {
        Self::new(Source::Path, field, label)
    }

    pub fn presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    pub fn required(self) -> Self {
        self.presence(Presence::Required)
    }

    pub fn check(mut self, check: Check, message: &'static str) -> Self {
        self.checks.push((check, message));
        self
    }

    fn extract<'a>(&self, input: &'a RequestInput) -> Option<FieldValue<'a>> {
        match self.source {
            Source::Body => input
                .body
                .get(self.field)
                .filter(|v| !v.is_null())
                .map(FieldValue::Json),
            Source::Query => input.query.get(self.field).map(|s| FieldValue::Text(s)),
            Source::Path => input.path.get(self.field).map(|s| FieldValue::Text(s)),
        }
    }

    fn evaluate(&self, input: &RequestInput, now: DateTime<Utc>) -> Option<FieldError> {
        let Some(value) = self.extract(input) else {
            return match self.presence {
                Presence::Required => Some(FieldError {
                    field: self.field.to_string(),
                    message: format!("{} is required", self.label),
                }),
                Presence::Optional => None,
            };
        };

        self.checks
            .iter()
            .find(|(check, _)| !check.passes(value, now))
            .map(|(_, message)| FieldError {
                field: self.field.to_string(),
                message: message.to_string(),
            })
    }
}

/// Body, query and path parameters of one request.
#[derive(Debug, Clone, Default)]
pub struct RequestInput {
    pub body: Map<String, Value>,
    pub query: HashMap<String, String>,
    pub path: HashMap<String, String>,
}

impl RequestInput {
    /// Input with a JSON body. Non-object bodies are treated as empty.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_path(mut self, key: &str, value: &str) -> Self {
        self.path.insert(key.to_string(), value.to_string());
        self
    }
}

/// Rule table misconfiguration, detected when a [`RuleSet`] is built.
#[derive(Debug, thiserror::Error)]
pub enum RuleTableError {
    #[error("{kind:?} rules declare field '{field}' more than once")]
    DuplicateField { kind: OperationKind, field: &'static str },

    #[error("{kind:?} rule for '{field}' has no checks")]
    NoChecks { kind: OperationKind, field: &'static str },

    #[error("{kind:?} rule for '{field}' has inverted or empty bounds")]
    InvalidBounds { kind: OperationKind, field: &'static str },
}

/// The fixed collection of field rules for one operation kind.
#[derive(Debug, Clone)]
pub struct RuleSet {
    kind: OperationKind,
    rules: Vec<FieldRule>,
}

impl RuleSet {
    pub fn new(kind: OperationKind, rules: Vec<FieldRule>) -> Result<Self, RuleTableError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert((rule.source, rule.field)) {
                return Err(RuleTableError::DuplicateField {
                    kind,
                    field: rule.field,
                });
            }
            if rule.checks.is_empty() {
                return Err(RuleTableError::NoChecks {
                    kind,
                    field: rule.field,
                });
            }
            if !rule.checks.iter().all(|(c, _)| c.bounds_are_ordered()) {
                return Err(RuleTableError::InvalidBounds {
                    kind,
                    field: rule.field,
                });
            }
        }
        Ok(Self { kind, rules })
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// The rule for `field` read from `source`, if the table has one.
    pub fn rule_for(&self, source: Source, field: &str) -> Option<&FieldRule> {
        self.rules
            .iter()
            .find(|r| r.source == source && r.field == field)
    }

    /// Whether any rule reads the request body.
    pub fn reads_body(&self) -> bool {
        self.rules.iter().any(|r| r.source == Source::Body)
    }

    /// Evaluate every rule against `input`, collecting all errors in table
    /// order.
    pub fn validate(
        &self,
        input: &RequestInput,
        now: DateTime<Utc>,
    ) -> Result<(), Vec<FieldError>> {
        let errors: Vec<FieldError> = self
            .rules
            .iter()
            .filter_map(|rule| rule.evaluate(input, now))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
