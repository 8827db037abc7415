// src/common/error.rs

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid stage: {0}")]
    InvalidStage(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    UniqueConstraintViolation(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    // Anything unexpected. `anyhow::Error` keeps the context for the log.
    #[error("Internal server error")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidStage(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a unique-violation into a 409 with `message`, everything else stays a database error.
    pub fn from_unique_violation(e: sqlx::Error, message: impl Into<String>) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AppError::UniqueConstraintViolation(message.into());
            }
        }
        e.into()
    }

    /// Maps a foreign-key violation into a 400 with `message`, everything else stays a database error.
    pub fn from_foreign_key_violation(e: sqlx::Error, message: impl Into<String>) -> Self {
        if is_foreign_key_violation(&e) {
            return AppError::BadRequest(message.into());
        }
        e.into()
    }
}

pub fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db_err| db_err.is_foreign_key_violation())
}

// Extractor rejections become 400s with the usual `{error}` body.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_message = match self {
            // Field-level details for the form.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "One or more fields are invalid.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::InvalidCredentials => "Invalid email or password.".to_string(),
            AppError::InvalidToken => "Missing or invalid authentication token.".to_string(),
            AppError::UserNotFound => "User not found.".to_string(),
            AppError::Forbidden(msg) => msg,
            AppError::ResourceNotFound(msg) => msg,
            AppError::InvalidStage(stage) => format!("Invalid stage '{}'.", stage),
            AppError::BadRequest(msg) => msg,
            AppError::UniqueConstraintViolation(msg) => msg,

            // 500s: log the detail, return a generic message.
            ref e => {
                tracing::error!("Internal server error: {:?}", e);
                "An unexpected error occurred.".to_string()
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn invalid_stage_is_a_bad_request() {
        let err = AppError::InvalidStage("SHIPPED".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_and_conflict_codes() {
        assert_eq!(
            AppError::ResourceNotFound("Deal".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::UniqueConstraintViolation("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[derive(Debug)]
    struct ConstraintError(sqlx::error::ErrorKind);

    impl std::fmt::Display for ConstraintError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "constraint violated")
        }
    }

    impl std::error::Error for ConstraintError {}

    impl sqlx::error::DatabaseError for ConstraintError {
        fn message(&self) -> &str {
            "constraint violated"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            match &self.0 {
                sqlx::error::ErrorKind::UniqueViolation => sqlx::error::ErrorKind::UniqueViolation,
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    sqlx::error::ErrorKind::ForeignKeyViolation
                }
                _ => sqlx::error::ErrorKind::Other,
            }
        }
    }

    pub(crate) fn db_error(kind: sqlx::error::ErrorKind) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ConstraintError(kind)))
    }

    #[test]
    fn missing_reference_is_a_bad_request() {
        let err = AppError::from_foreign_key_violation(
            db_error(sqlx::error::ErrorKind::ForeignKeyViolation),
            "Owner does not exist.",
        );
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Owner does not exist."));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AppError::from_foreign_key_violation(
            db_error(sqlx::error::ErrorKind::UniqueViolation),
            "Owner does not exist.",
        );
        assert!(matches!(err, AppError::DatabaseError(_)));
    }

    #[test]
    fn duplicate_key_is_a_conflict() {
        let err = AppError::from_unique_violation(
            db_error(sqlx::error::ErrorKind::UniqueViolation),
            "This email is already in use.",
        );
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(!is_foreign_key_violation(&db_error(sqlx::error::ErrorKind::Other)));
    }
}
