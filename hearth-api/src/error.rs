/// Error handling for the API server
///
/// All handlers return `ApiResult<T>`. Domain errors from the core convert into
/// [`ApiError`] through `From<DomainError>`, which is the single place where
/// error kinds are mapped to status codes.
///
/// # Example
///
/// ```
/// use hearth_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(ok: bool) -> ApiResult<Json<Value>> {
///     if !ok {
///         return Err(ApiError::BadRequest("Nope".to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hearth_shared::services::{DomainError, FieldError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Not found (404)
    NotFound(String),

    /// Field-level validation failures (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500); the message is logged, never returned
    InternalError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<FieldError> for ValidationErrorDetail {
    fn from(err: FieldError) -> Self {
        Self {
            field: err.field,
            message: err.message,
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Field errors, present only for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::ValidationError(errors) => {
                // A single failure is reported with its own message.
                let message = match errors.as_slice() {
                    [only] => only.message.clone(),
                    _ => "Request validation failed".to_string(),
                };
                (StatusCode::BAD_REQUEST, "validation_error", message, Some(errors))
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg, None)
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::DuplicateEmail(_)
            | DomainError::AlreadyMember
            | DomainError::DuplicateInvitation => ApiError::BadRequest(err.to_string()),
            DomainError::InvalidName(msg) => {
                ApiError::ValidationError(vec![ValidationErrorDetail::new("name", msg)])
            }
            DomainError::ValidationFailed(fields) => {
                ApiError::ValidationError(fields.into_iter().map(Into::into).collect())
            }
            DomainError::InvalidCredentials | DomainError::Unauthenticated => {
                ApiError::Unauthorized(err.to_string())
            }
            DomainError::UserNotFound | DomainError::HouseholdNotFound => {
                ApiError::NotFound(err.to_string())
            }
            DomainError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_domain_error_status_mapping() {
        let cases = [
            (DomainError::DuplicateEmail("a@b.c".to_string()), StatusCode::BAD_REQUEST),
            (DomainError::AlreadyMember, StatusCode::BAD_REQUEST),
            (DomainError::DuplicateInvitation, StatusCode::BAD_REQUEST),
            (DomainError::InvalidName("Name is required".to_string()), StatusCode::BAD_REQUEST),
            (DomainError::ValidationFailed(vec![]), StatusCode::BAD_REQUEST),
            (DomainError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (DomainError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (DomainError::UserNotFound, StatusCode::NOT_FOUND),
            (DomainError::HouseholdNotFound, StatusCode::NOT_FOUND),
            (DomainError::Internal("db down".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            let label = format!("{:?}", err);
            assert_eq!(ApiError::from(err).into_response().status(), status, "{}", label);
        }
    }

    #[tokio::test]
    async fn test_invalid_name_reports_field_and_message() {
        let (status, body) =
            body_json(DomainError::InvalidName("Name cannot be blank".to_string()).into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "Name cannot be blank");
        assert_eq!(body["details"][0]["field"], "name");
    }

    #[tokio::test]
    async fn test_internal_error_is_not_echoed() {
        let (status, body) =
            body_json(DomainError::Internal("connection refused".to_string()).into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "An internal error occurred");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_multiple_validation_errors_use_generic_message() {
        let (_, body) = body_json(ApiError::ValidationError(vec![
            ValidationErrorDetail::new("email", "Invalid email format"),
            ValidationErrorDetail::new("password", "Password must be at least 8 characters"),
        ]))
        .await;

        assert_eq!(body["message"], "Request validation failed");
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
    }
}
