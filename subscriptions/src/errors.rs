use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;
use validator::ValidationErrors;

use crate::services::SubscriptionError;

#[derive(Debug)]
pub enum ServiceError {
    InternalError(String),
    BadRequest(String),
    NotFound(String),
    ValidationError(String),
    UnprocessableEntity(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            ServiceError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ServiceError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ServiceError::UnprocessableEntity(msg) => write!(f, "Unprocessable entity: {}", msg),
        }
    }
}

impl ServiceError {
    /// Turn `validator` output into a single readable line, fields sorted.
    pub fn describe_validation(errors: &ValidationErrors) -> String {
        let mut parts: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let reasons: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{}: {}", field, reasons.join(", "))
            })
            .collect();
        parts.sort();
        parts.join("; ")
    }

    pub fn validation(errors: &ValidationErrors) -> Self {
        ServiceError::ValidationError(Self::describe_validation(errors))
    }

    pub fn unprocessable(errors: &ValidationErrors) -> Self {
        ServiceError::UnprocessableEntity(Self::describe_validation(errors))
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::BadRequest(_) | ServiceError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            // detail stays in the logs
            ServiceError::InternalError(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Internal server error"
                }))
            }
            ServiceError::BadRequest(msg) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "Bad request",
                    "message": msg
                }))
            }
            ServiceError::NotFound(msg) => {
                HttpResponse::NotFound().json(serde_json::json!({
                    "error": "Not found",
                    "message": msg
                }))
            }
            ServiceError::ValidationError(msg) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "Validation error",
                    "message": msg
                }))
            }
            ServiceError::UnprocessableEntity(msg) => {
                HttpResponse::UnprocessableEntity().json(serde_json::json!({
                    "error": "Validation error",
                    "message": msg
                }))
            }
        }
    }
}

impl From<SubscriptionError> for ServiceError {
    fn from(err: SubscriptionError) -> Self {
        match err {
            SubscriptionError::InvalidDate { .. } | SubscriptionError::InvalidId { .. } => {
                ServiceError::ValidationError(err.to_string())
            }
            SubscriptionError::NotFound(_) => ServiceError::NotFound(err.to_string()),
            // already logged by the service
            SubscriptionError::Storage { .. } => ServiceError::InternalError(err.to_string()),
        }
    }
}
