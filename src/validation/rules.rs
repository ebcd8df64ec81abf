// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rule tables for the survivor-story resource.

use super::{Check, FieldRule, OperationKind, Presence, RuleSet, RuleTableError};

pub const EXPLOITATION_TYPES: &[&str] = &["sex", "labor"];
pub const GENDERS: &[&str] = &["Female", "Male", "Non-binary", "Other"];
pub const FILTER_TYPES: &[&str] = &["all", "sex", "labor"];
pub const SORT_FIELDS: &[&str] = &["rescueDate", "age", "location", "createdAt"];
pub const SORT_ORDERS: &[&str] = &["asc", "desc"];

pub const MAX_LIMIT: i64 = 100;
/// Largest page number the listing query can represent.
pub const MAX_PAGE: i64 = u32::MAX as i64;

/// The five rule sets, built and checked once at startup.
#[derive(Debug, Clone)]
pub struct RuleSets {
    pub create: RuleSet,
    pub update: RuleSet,
    pub list: RuleSet,
    pub search: RuleSet,
    pub id: RuleSet,
}

impl RuleSets {
    pub fn build() -> Result<Self, RuleTableError> {
        Ok(Self {
            create: create_rules()?,
            update: update_rules()?,
            list: list_rules()?,
            search: search_rules()?,
            id: id_rules()?,
        })
    }
}

fn id_rule() -> FieldRule {
    FieldRule::path("id", "Story ID")
        .required()
        .check(Check::DocumentId, "Invalid story ID format")
}

fn story_fields(presence: Presence) -> Vec<FieldRule> {
    vec![
        FieldRule::body("rescueDate", "Rescue date")
            .presence(presence)
            .check(Check::Iso8601, "Rescue date must be a valid ISO 8601 date")
            .check(Check::NotInFuture, "Rescue date cannot be in the future"),
        FieldRule::body("location", "Location")
            .presence(presence)
            .check(
                Check::Length { min: 1, max: 200 },
                "Location must be between 1 and 200 characters",
            ),
        FieldRule::body("exploitationType", "Exploitation type")
            .presence(presence)
            .check(
                Check::OneOf(EXPLOITATION_TYPES),
                "Exploitation type must be either sex or labor",
            ),
        FieldRule::body("duration", "Duration")
            .presence(presence)
            .check(
                Check::Length { min: 1, max: 100 },
                "Duration must be between 1 and 100 characters",
            ),
        FieldRule::body("currentStatus", "Current status")
            .presence(presence)
            .check(
                Check::Length { min: 1, max: 500 },
                "Current status must be between 1 and 500 characters",
            ),
        FieldRule::body("aspirations", "Aspirations")
            .presence(presence)
            .check(
                Check::Length { min: 1, max: 1000 },
                "Aspirations must be between 1 and 1000 characters",
            ),
        FieldRule::body("livingConditions", "Living conditions")
            .presence(presence)
            .check(
                Check::Length { min: 1, max: 1000 },
                "Living conditions must be between 1 and 1000 characters",
            ),
        FieldRule::body("age", "Age")
            .presence(presence)
            .check(
                Check::Integer {
                    min: Some(0),
                    max: Some(120),
                },
                "Age must be an integer between 0 and 120",
            ),
        FieldRule::body("gender", "Gender")
            .presence(presence)
            .check(
                Check::OneOf(GENDERS),
                "Gender must be one of Female, Male, Non-binary, Other",
            ),
        FieldRule::body("source", "Source")
            .presence(presence)
            .check(
                Check::Length { min: 1, max: 300 },
                "Source must be between 1 and 300 characters",
            ),
    ]
}

pub fn create_rules() -> Result<RuleSet, RuleTableError> {
    RuleSet::new(OperationKind::Create, story_fields(Presence::Required))
}

pub fn update_rules() -> Result<RuleSet, RuleTableError> {
    let mut rules = vec![id_rule()];
    rules.extend(story_fields(Presence::Optional));
    RuleSet::new(OperationKind::Update, rules)
}

pub fn list_rules() -> Result<RuleSet, RuleTableError> {
    RuleSet::new(
        OperationKind::List,
        vec![
            FieldRule::query("page", "Page").check(
                Check::Integer {
                    min: Some(1),
                    max: Some(MAX_PAGE),
                },
                "Page must be a positive integer",
            ),
            FieldRule::query("limit", "Limit").check(
                Check::Integer {
                    min: Some(1),
                    max: Some(MAX_LIMIT),
                },
                "Limit must be between 1 and 100",
            ),
            FieldRule::query("filterType", "Filter type").check(
                Check::OneOf(FILTER_TYPES),
                "Filter type must be one of all, sex, labor",
            ),
            FieldRule::query("sortBy", "Sort field").check(
                Check::OneOf(SORT_FIELDS),
                "Sort field must be one of rescueDate, age, location, createdAt",
            ),
            FieldRule::query("sortOrder", "Sort order")
                .check(Check::OneOf(SORT_ORDERS), "Sort order must be asc or desc"),
        ],
    )
}

pub fn search_rules() -> Result<RuleSet, RuleTableError> {
    RuleSet::new(
        OperationKind::Search,
        vec![
            FieldRule::query("q", "Search query").check(
                Check::Length { min: 1, max: 100 },
                "Search query must be between 1 and 100 characters",
            ),
            FieldRule::query("type", "Type").check(
                Check::OneOf(FILTER_TYPES),
                "Type must be one of all, sex, labor",
            ),
            FieldRule::query("location", "Location").check(
                Check::Length { min: 1, max: 100 },
                "Location must be between 1 and 100 characters",
            ),
            FieldRule::query("ageRange", "Age range").check(
                Check::AgeRange,
                "Age range must be a number or a range like 18-25",
            ),
        ],
    )
}

pub fn id_rules() -> Result<RuleSet, RuleTableError> {
    RuleSet::new(OperationKind::IdOnly, vec![id_rule()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{FieldError, RequestInput};
    use chrono::{DateTime, Duration, Utc};
    use serde_json::{json, Value};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn valid_story() -> Value {
        json!({
            "rescueDate": "2025-11-20",
            "location": "Mumbai, India",
            "exploitationType": "labor",
            "duration": "3 years",
            "currentStatus": "Living in a shelter and attending vocational training",
            "aspirations": "Open a tailoring shop",
            "livingConditions": "Shared room in a supervised shelter",
            "age": 19,
            "gender": "Female",
            "source": "Partner NGO intake interview"
        })
    }

    fn with_field(field: &str, value: Value) -> RequestInput {
        let mut body = valid_story();
        body[field] = value;
        RequestInput::default().with_body(body)
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_all_rule_sets_build() {
        let sets = RuleSets::build().unwrap();
        assert_eq!(sets.create.kind(), OperationKind::Create);
        assert_eq!(sets.create.rules().len(), 10);
        assert_eq!(sets.update.rules().len(), 11);
        assert!(sets.create.reads_body());
        assert!(!sets.list.reads_body());
        assert!(!sets.id.reads_body());
    }

    #[test]
    fn test_valid_create_passes() {
        let rules = create_rules().unwrap();
        let input = RequestInput::default().with_body(valid_story());
        assert_eq!(rules.validate(&input, now()), Ok(()));
    }

    #[test]
    fn test_age_out_of_range_is_single_error() {
        let rules = create_rules().unwrap();
        let errors = rules
            .validate(&with_field("age", json!(121)), now())
            .unwrap_err();
        assert_eq!(fields(&errors), vec!["age"]);
        assert_eq!(errors[0].message, "Age must be an integer between 0 and 120");
    }

    #[test]
    fn test_age_bounds_inclusive() {
        let rules = create_rules().unwrap();
        assert!(rules.validate(&with_field("age", json!(0)), now()).is_ok());
        assert!(rules.validate(&with_field("age", json!(120)), now()).is_ok());
        assert!(rules.validate(&with_field("age", json!(-1)), now()).is_err());
    }

    #[test]
    fn test_missing_gender_reports_only_gender() {
        let rules = create_rules().unwrap();
        let mut body = valid_story();
        body.as_object_mut().unwrap().remove("gender");

        let errors = rules
            .validate(&RequestInput::default().with_body(body), now())
            .unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError {
                field: "gender".to_string(),
                message: "Gender is required".to_string(),
            }]
        );
    }

    #[test]
    fn test_all_violations_collected_in_table_order() {
        let rules = create_rules().unwrap();
        let body = json!({
            "location": "",
            "exploitationType": "Labor",
            "age": 200,
        });

        let errors = rules
            .validate(&RequestInput::default().with_body(body), now())
            .unwrap_err();
        assert_eq!(
            fields(&errors),
            vec![
                "rescueDate",
                "location",
                "exploitationType",
                "duration",
                "currentStatus",
                "aspirations",
                "livingConditions",
                "age",
                "gender",
                "source",
            ]
        );
    }

    #[test]
    fn test_text_bounds() {
        let rules = create_rules().unwrap();
        let cases = [
            ("location", 200),
            ("duration", 100),
            ("currentStatus", 500),
            ("aspirations", 1000),
            ("livingConditions", 1000),
            ("source", 300),
        ];
        for (field, max) in cases {
            let at_max = with_field(field, json!("x".repeat(max)));
            assert!(rules.validate(&at_max, now()).is_ok(), "{field} at max");

            let over = with_field(field, json!("x".repeat(max + 1)));
            let errors = rules.validate(&over, now()).unwrap_err();
            assert_eq!(fields(&errors), vec![field]);
        }
    }

    #[test]
    fn test_rescue_date_future_rejected_now_accepted() {
        let rules = create_rules().unwrap();

        let tomorrow = (now() + Duration::days(1)).to_rfc3339();
        let errors = rules
            .validate(&with_field("rescueDate", json!(tomorrow)), now())
            .unwrap_err();
        assert_eq!(errors[0].message, "Rescue date cannot be in the future");

        let exactly_now = now().to_rfc3339();
        assert!(rules
            .validate(&with_field("rescueDate", json!(exactly_now)), now())
            .is_ok());

        let one_second_later = (now() + Duration::seconds(1)).to_rfc3339();
        assert!(rules
            .validate(&with_field("rescueDate", json!(one_second_later)), now())
            .is_err());
    }

    #[test]
    fn test_rescue_date_bad_format() {
        let rules = create_rules().unwrap();
        let errors = rules
            .validate(&with_field("rescueDate", json!("20/11/2025")), now())
            .unwrap_err();
        assert_eq!(errors[0].message, "Rescue date must be a valid ISO 8601 date");
    }

    #[test]
    fn test_update_with_single_field_passes() {
        let rules = update_rules().unwrap();
        let input = RequestInput::default()
            .with_path("id", "507f1f77bcf86cd799439011")
            .with_body(json!({ "location": "X" }));
        assert_eq!(rules.validate(&input, now()), Ok(()));
    }

    #[test]
    fn test_update_keeps_bounds_for_present_fields() {
        let rules = update_rules().unwrap();
        let tomorrow = (now() + Duration::days(1)).format("%Y-%m-%d").to_string();
        let input = RequestInput::default()
            .with_path("id", "507f1f77bcf86cd799439011")
            .with_body(json!({ "rescueDate": tomorrow, "gender": "unknown" }));

        let errors = rules.validate(&input, now()).unwrap_err();
        assert_eq!(fields(&errors), vec!["rescueDate", "gender"]);
    }

    #[test]
    fn test_update_requires_valid_id() {
        let rules = update_rules().unwrap();
        let missing = RequestInput::default().with_body(json!({ "location": "X" }));
        assert_eq!(fields(&rules.validate(&missing, now()).unwrap_err()), vec!["id"]);

        let bad = missing.clone().with_path("id", "42");
        let errors = rules.validate(&bad, now()).unwrap_err();
        assert_eq!(errors[0].message, "Invalid story ID format");
    }

    #[test]
    fn test_list_query_rules() {
        let rules = list_rules().unwrap();
        let reject = |key: &str, value: &str| {
            let input = RequestInput::default().with_query(key, value);
            fields(&rules.validate(&input, now()).unwrap_err()) == vec![key]
        };

        assert!(reject("page", "0"));
        assert!(reject("page", "4294967296"));
        assert!(reject("page", "5000000000"));
        assert!(reject("limit", "150"));
        assert!(reject("limit", "0"));
        assert!(reject("sortBy", "name"));
        assert!(reject("sortOrder", "ASC"));
        assert!(reject("filterType", "other"));

        let accepted = RequestInput::default()
            .with_query("page", "4294967295")
            .with_query("filterType", "sex")
            .with_query("sortOrder", "asc");
        assert!(rules.validate(&accepted, now()).is_ok());
        assert!(rules.validate(&RequestInput::default(), now()).is_ok());
    }

    #[test]
    fn test_search_age_range_pattern() {
        let rules = search_rules().unwrap();
        for ok in ["25", "18-25", "30-20", "0-0"] {
            let input = RequestInput::default().with_query("ageRange", ok);
            assert!(rules.validate(&input, now()).is_ok(), "rejected {ok:?}");
        }
        for bad in ["18-", "-25", "18-25-30", "a-b", " 18", "18 - 25", "١٨"] {
            let input = RequestInput::default().with_query("ageRange", bad);
            assert!(rules.validate(&input, now()).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_search_text_bounds() {
        let rules = search_rules().unwrap();
        let too_long = "q".repeat(101);
        let input = RequestInput::default()
            .with_query("q", &too_long)
            .with_query("location", "")
            .with_query("type", "sex");
        assert_eq!(
            fields(&rules.validate(&input, now()).unwrap_err()),
            vec!["q", "location"]
        );
    }
}
