// HTTP API Error Types
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::database::DatabaseError;
use crate::services::ServiceError;

/// HTTP API error with a status, a stable `error` code and a client-safe message
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest {
        code: &'static str,
        message: String,
    },
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),
    InvalidId(String),

    // 401 Unauthorized
    Unauthorized {
        code: &'static str,
        message: String,
    },

    // 403 Forbidden
    Forbidden {
        code: &'static str,
        message: String,
    },

    // 404 Not Found
    NotFound {
        code: &'static str,
        message: String,
    },

    // 409 Conflict
    Conflict {
        code: &'static str,
        message: String,
    },

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest { .. } => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::InvalidId(_) => 400,
            ApiError::Unauthorized { .. } => 401,
            ApiError::Forbidden { .. } => 403,
            ApiError::NotFound { .. } => 404,
            ApiError::Conflict { .. } => 409,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. } => message,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::InvalidId(msg) => msg,
            ApiError::Unauthorized { message, .. } => message,
            ApiError::Forbidden { message, .. } => message,
            ApiError::NotFound { message, .. } => message,
            ApiError::Conflict { message, .. } => message,
            ApiError::PayloadTooLarge(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { code, .. } => *code,
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::InvalidId(_) => "INVALID_ID",
            ApiError::Unauthorized { code, .. } => *code,
            ApiError::Forbidden { code, .. } => *code,
            ApiError::NotFound { code, .. } => *code,
            ApiError::Conflict { code, .. } => *code,
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.error_code(),
            "message": self.message(),
        });

        if let ApiError::ValidationError {
            field_errors: Some(field_errors),
            ..
        } = self
        {
            response["fieldErrors"] = json!(field_errors);
        }

        response
    }

    /// Replace the default code of a coded variant
    pub fn with_code(mut self, new_code: &'static str) -> Self {
        match &mut self {
            ApiError::BadRequest { code, .. }
            | ApiError::Unauthorized { code, .. }
            | ApiError::Forbidden { code, .. }
            | ApiError::NotFound { code, .. }
            | ApiError::Conflict { code, .. } => *code = new_code,
            _ => {}
        }
        self
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            code: "BAD_REQUEST",
            message: message.into(),
        }
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn invalid_id(message: impl Into<String>) -> Self {
        ApiError::InvalidId(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            code: "UNAUTHORIZED",
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden {
            code: "FORBIDDEN",
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            code: "NOT_FOUND",
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict {
            code: "CONFLICT",
            message: message.into(),
        }
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        ApiError::PayloadTooLarge(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Validation { message, field_errors } => ApiError::validation_error(message, field_errors),
            ServiceError::InvalidId => ApiError::invalid_id(message),

            ServiceError::NoContacts | ServiceError::NoMatchingContacts => {
                ApiError::not_found(message).with_code("NO_CONTACTS_FOUND")
            }
            ServiceError::NoFavorites => ApiError::not_found(message).with_code("NO_FAVORITES_FOUND"),
            ServiceError::ContactNotFound => ApiError::not_found(message).with_code("CONTACT_NOT_FOUND"),

            ServiceError::NoTags => ApiError::not_found(message).with_code("NO_TAGS_FOUND"),
            ServiceError::TagNotFound => ApiError::not_found(message).with_code("TAG_NOT_FOUND"),
            ServiceError::DuplicateTag(_) => ApiError::conflict(message).with_code("TAG_ALREADY_EXISTS"),

            ServiceError::NoContactsForTag { .. } => ApiError::not_found(message).with_code("NO_CONTACTS_FOR_TAG"),
            ServiceError::AlreadyAssigned => ApiError::bad_request(message).with_code("TAG_ALREADY_ASSIGNED"),
            ServiceError::NotAssigned => ApiError::bad_request(message).with_code("TAG_NOT_ASSIGNED"),

            ServiceError::DuplicateEmail => ApiError::conflict(message).with_code("USER_ALREADY_EXISTS"),
            ServiceError::InvalidCredentials => ApiError::unauthorized(message).with_code("INVALID_CREDENTIALS"),
            ServiceError::UserNotFound => ApiError::not_found(message).with_code("USER_NOT_FOUND"),
            ServiceError::WrongCurrentPassword => {
                ApiError::unauthorized(message).with_code("WRONG_CURRENT_PASSWORD")
            }
            ServiceError::SamePassword => ApiError::bad_request(message).with_code("SAME_PASSWORD"),

            ServiceError::Password(e) => {
                tracing::error!("Password hashing error: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            ServiceError::Token(e) => {
                tracing::error!("Token issuing error: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            ServiceError::Database(e) => e.into(),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Conflict(constraint) => {
                tracing::warn!("Unhandled unique violation on {}", constraint);
                ApiError::conflict("The resource already exists")
            }
            DatabaseError::Unavailable(msg) => {
                tracing::error!("Database unavailable: {}", msg);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
            other => {
                tracing::error!("Database error: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::payload_too_large("Request body is too large");
        }
        ApiError::invalid_json(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Path rejected: {}", rejection.body_text());
        ApiError::invalid_id("The provided ID is not valid")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
