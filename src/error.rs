use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::error;

use crate::auth::AuthError;
use crate::booking::BookingError;
use crate::identity::IdentityError;
use crate::scheduling::ScheduleError;

/// Error taxonomy exposed at the HTTP boundary. Every variant maps to one
/// status code and serializes as the failure envelope
/// `{ success: false, message, errorDetails, data: null }`.
#[derive(Debug)]
pub enum ApiError {
    InvalidInput {
        message: String,
        details: Option<Value>,
    },
    Unauthenticated(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::InvalidInput {
            message: message.into(),
            details: None,
        }
    }

    pub fn validation(field: &str, message: &str) -> Self {
        ApiError::InvalidInput {
            message: "Validation error occurred.".into(),
            details: Some(json!({ "field": field, "message": message })),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            ApiError::InvalidInput { message, details } => {
                (StatusCode::BAD_REQUEST, message, details)
            }
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::Internal(msg) => {
                error!("internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
        };

        let body = json!({
            "success": false,
            "message": message,
            "errorDetails": details,
            "data": null,
        });
        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_input(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::invalid_input(rejection.body_text())
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::MissingToken | AuthError::InvalidToken => {
                ApiError::Unauthenticated(value.to_string())
            }
            AuthError::Encoding(err) => ApiError::Internal(format!("token encoding: {err}")),
        }
    }
}

impl From<ScheduleError> for ApiError {
    fn from(value: ScheduleError) -> Self {
        match value {
            ScheduleError::MissingFields => ApiError::invalid_input(value.to_string()),
            ScheduleError::DayFull(_) | ScheduleError::Duplicate => {
                ApiError::Conflict(value.to_string())
            }
            ScheduleError::NotFound => ApiError::NotFound(value.to_string()),
            ScheduleError::Store(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(value: BookingError) -> Self {
        match value {
            BookingError::ClassMissing | BookingError::NotFound => {
                ApiError::NotFound(value.to_string())
            }
            BookingError::AlreadyBooked | BookingError::ClassFull => {
                ApiError::Conflict(value.to_string())
            }
            BookingError::NotOwner => ApiError::Forbidden(value.to_string()),
            BookingError::Store(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::MissingFields => ApiError::invalid_input(value.to_string()),
            IdentityError::InvalidEmail => ApiError::validation("email", "Invalid email format."),
            IdentityError::InvalidOldPassword => ApiError::invalid_input(value.to_string()),
            IdentityError::EmailTaken => ApiError::Conflict(value.to_string()),
            IdentityError::UserMissing | IdentityError::NoTrainers => {
                ApiError::NotFound(value.to_string())
            }
            IdentityError::InvalidCredentials
            | IdentityError::InvalidRefresh
            | IdentityError::RefreshReused => ApiError::Unauthenticated(value.to_string()),
            IdentityError::Hash(err) => ApiError::Internal(format!("password hashing: {err}")),
            IdentityError::Token(err) => err.into(),
            IdentityError::Store(err) => ApiError::Internal(err.to_string()),
        }
    }
}
