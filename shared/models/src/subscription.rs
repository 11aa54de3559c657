use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::month::{validate_month, MonthYear};

static HYPHENATED_UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid pattern compiles")
});

/// Parse a UUID written in the canonical 36-character hyphenated form.
///
/// `Uuid::parse_str` also takes the simple, braced and `urn:uuid:` forms;
/// the API only accepts the hyphenated one.
pub fn parse_uuid(value: &str) -> Option<Uuid> {
    if !HYPHENATED_UUID.is_match(value) {
        return None;
    }
    Uuid::parse_str(value).ok()
}

/// `validator` hook for string fields that must hold a UUID.
pub fn validate_uuid(value: &str) -> Result<(), ValidationError> {
    parse_uuid(value).map(|_| ()).ok_or_else(|| {
        let mut error = ValidationError::new("uuid");
        error.message = Some(format!("'{}' is not a valid UUID", value).into());
        error
    })
}

/// `validator` hook rejecting empty and whitespace-only text.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}

/// Body of `POST /create-subscription`.
///
/// Missing required fields decode to their empty value and are rejected by
/// validation, so the caller gets a field-level reason instead of a decode error.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct CreateSubscriptionRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub service_name: String,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub price: i32,
    #[serde(default)]
    #[validate(custom(function = "validate_uuid"))]
    pub user_id: String,
    #[serde(default)]
    #[validate(custom(function = "validate_month"))]
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_month"))]
    pub end_date: Option<String>,
}

/// Body of `PUT /update-subscription`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct UpdateSubscriptionRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub service_name: String,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub price: i32,
    #[serde(default)]
    #[validate(custom(function = "validate_uuid"))]
    pub subscription_id: String,
    #[serde(default)]
    #[validate(custom(function = "validate_month"))]
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_month"))]
    pub end_date: Option<String>,
}

/// Query string of `GET /get-subscription`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct UserQuery {
    #[serde(rename = "user-id")]
    pub user_id: Option<String>,
}

/// Query string of `DELETE /delete-subscription`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct SubscriptionIdQuery {
    #[serde(rename = "subscription-id")]
    pub subscription_id: Option<String>,
}

/// Query string of `GET /calculate-cost`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, JsonSchema)]
pub struct CostQuery {
    #[serde(rename = "user-id", default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_uuid"))]
    pub user_id: Option<String>,
    #[serde(rename = "service-name", default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(rename = "start-date", default)]
    #[validate(custom(function = "validate_month"))]
    pub start_date: String,
    #[serde(rename = "end-date", default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_month"))]
    pub end_date: Option<String>,
}

/// A stored subscription as returned by `GET /get-subscription`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    pub start_date: MonthYear,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<MonthYear>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CreatedResponse {
    pub id: Uuid,
    pub status: String,
}

impl CreatedResponse {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            status: "created".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn updated() -> Self {
        Self {
            status: "updated".to_string(),
        }
    }

    pub fn deleted() -> Self {
        Self {
            status: "deleted".to_string(),
        }
    }
}

/// Period echoed back by the cost endpoint, in the caller's `MM-YYYY` text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CostPeriod {
    pub start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CostResponse {
    pub total_cost: i64,
    pub period: CostPeriod,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const USER: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    fn create_request() -> CreateSubscriptionRequest {
        serde_json::from_value(json!({
            "service_name": "Yandex Plus",
            "price": 400,
            "user_id": USER,
            "start_date": "07-2025"
        }))
        .unwrap()
    }

    #[test]
    fn create_request_without_end_date_is_valid() {
        let request = create_request();
        assert!(request.validate().is_ok());
        assert!(request.end_date.is_none());
    }

    #[test]
    fn create_request_missing_fields_fail_validation() {
        let request: CreateSubscriptionRequest = serde_json::from_value(json!({})).unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("service_name"));
        assert!(fields.contains_key("price"));
        assert!(fields.contains_key("user_id"));
        assert!(fields.contains_key("start_date"));
        assert!(!fields.contains_key("end_date"));
    }

    #[test]
    fn create_request_rejects_bad_values() {
        let mut request = create_request();
        request.price = 0;
        request.user_id = "not-a-uuid".to_string();
        request.end_date = Some("2025-12".to_string());

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("price"));
        assert!(fields.contains_key("user_id"));
        assert!(fields.contains_key("end_date"));
    }

    #[test]
    fn blank_service_name_is_rejected() {
        let mut request = create_request();
        request.service_name = "   ".to_string();

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("service_name"));
    }

    #[test]
    fn only_hyphenated_uuids_parse() {
        assert_eq!(parse_uuid(USER).map(|id| id.to_string()), Some(USER.to_string()));
        assert!(parse_uuid(&USER.to_uppercase()).is_some());

        for form in [
            "urn:uuid:3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "{3fa85f64-5717-4562-b3fc-2c963f66afa6}",
            "3fa85f6457174562b3fc2c963f66afa6",
            "3fa85f64-5717-4562-b3fc-2c963f66afa",
            "",
        ] {
            assert!(parse_uuid(form).is_none(), "accepted {}", form);
            assert!(validate_uuid(form).is_err(), "validated {}", form);
        }
    }

    #[test]
    fn update_request_requires_subscription_id() {
        let request: UpdateSubscriptionRequest = serde_json::from_value(json!({
            "service_name": "Netflix",
            "price": 999,
            "start_date": "01-2024"
        }))
        .unwrap();

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("subscription_id"));
    }

    #[test]
    fn cost_query_uses_dashed_names() {
        let query: CostQuery = serde_json::from_value(json!({
            "user-id": USER,
            "service-name": "Netflix",
            "start-date": "01-2024",
            "end-date": "12-2024"
        }))
        .unwrap();

        assert!(query.validate().is_ok());
        assert_eq!(query.service_name.as_deref(), Some("Netflix"));
        assert_eq!(query.end_date.as_deref(), Some("12-2024"));
    }

    #[test]
    fn cost_query_requires_start_date() {
        let query = CostQuery::default();
        let errors = query.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("start_date"));
    }

    #[test]
    fn response_omits_missing_end_date() {
        let response = SubscriptionResponse {
            id: Uuid::new_v4(),
            service_name: "Spotify".to_string(),
            price: 500,
            user_id: Uuid::parse_str(USER).unwrap(),
            start_date: MonthYear::parse("01-2024").unwrap(),
            end_date: None,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["start_date"], "01-2024");
        assert!(value.get("end_date").is_none());
    }

    #[test]
    fn cost_response_shape() {
        let response = CostResponse {
            total_cost: 1500,
            period: CostPeriod {
                start: "01-2024".to_string(),
                end: None,
            },
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "total_cost": 1500, "period": { "start": "01-2024" } })
        );
    }
}
