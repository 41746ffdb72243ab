/// Error types for Blog Service
///
/// Every failure a handler can produce is one of these variants; each maps to
/// exactly one HTTP status. Internal details are logged, never returned.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use crypto_core::TokenError;
use serde::Serialize;
use thiserror::Error;

/// Result type for blog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// One field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Why a request could not be authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("No token, authorization denied")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,
}

impl AuthFailure {
    /// Label used for the auth failure counter
    pub fn reason(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "missing_token",
            AuthFailure::InvalidToken => "invalid_token",
            AuthFailure::TokenExpired => "token_expired",
            AuthFailure::UserNotFound => "user_not_found",
            AuthFailure::InvalidCredentials => "invalid_credentials",
        }
    }
}

impl From<TokenError> for AuthFailure {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthFailure::TokenExpired,
            TokenError::Invalid | TokenError::Signing(_) => AuthFailure::InvalidToken,
        }
    }
}

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    /// Duplicate unique value (email). Served as 400 to match the public API.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(AuthFailure),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a [FieldError]>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Database(msg) | AppError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed with internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let details = match self {
            AppError::Validation(details) => Some(details.as_slice()),
            _ => None,
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: &message,
            details,
        })
    }
}

impl From<AuthFailure> for AppError {
    fn from(failure: AuthFailure) -> Self {
        AppError::Unauthorized(failure)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<crypto_core::PasswordError> for AppError {
    fn from(err: crypto_core::PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(crate::validators::field_errors(&errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.error_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_validation_body_lists_details() {
        let (status, json) = body_json(AppError::Validation(vec![FieldError::new(
            "title",
            "Title must be at least 3 characters",
        )]))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Validation failed");
        assert_eq!(json["details"][0]["field"], "title");
    }

    #[actix_web::test]
    async fn test_internal_details_are_hidden() {
        let (status, json) = body_json(AppError::Database("relation missing".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Internal server error");
        assert!(json.get("details").is_none());
    }

    #[actix_web::test]
    async fn test_auth_failures_keep_distinct_messages() {
        let (status, json) = body_json(AuthFailure::TokenExpired.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Token expired");

        let (_, json) = body_json(AuthFailure::UserNotFound.into()).await;
        assert_eq!(json["error"], "User not found");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_token_error_mapping() {
        assert_eq!(AuthFailure::from(TokenError::Expired), AuthFailure::TokenExpired);
        assert_eq!(AuthFailure::from(TokenError::Invalid), AuthFailure::InvalidToken);
    }
}
