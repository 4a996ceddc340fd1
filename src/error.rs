//! Error taxonomy shared by the store, the workflows and the HTTP layer

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, error};

use crate::auth::api_key::ErrorResponse;

/// Hub errors
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Database error: {0}")]
    Database(sqlx::Error),
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type HubResult<T> = Result<T, HubError>;

impl HubError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(why: impl Into<String>) -> Self {
        Self::Forbidden(why.into())
    }

    pub fn conflict(why: impl Into<String>) -> Self {
        Self::Conflict(why.into())
    }

    pub fn bad_request(why: impl Into<String>) -> Self {
        Self::BadRequest(why.into())
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Database(_) | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for HubError {
    /// Constraint violations surface as domain outcomes: a duplicate unique
    /// key is a conflict, a dangling foreign key is a missing referent.
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                debug!(
                    constraint = db.constraint().unwrap_or("unknown"),
                    detail = db.message(),
                    "Unique violation"
                );
                return Self::conflict("duplicate value");
            }
            if db.is_foreign_key_violation() {
                debug!(
                    constraint = db.constraint().unwrap_or("unknown"),
                    detail = db.message(),
                    "Foreign key violation"
                );
                return Self::not_found("Referenced row");
            }
        }
        if matches!(e, sqlx::Error::RowNotFound) {
            return Self::NotFound("row".to_string());
        }
        Self::Database(e)
    }
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Database(e) => {
                error!(error = %e, "Database error");
                "Database error".to_string()
            }
            Self::Storage(e) => {
                error!(error = %e, "Storage error");
                "Storage error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(HubError::not_found("Report").status(), StatusCode::NOT_FOUND);
        assert_eq!(HubError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(HubError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(HubError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            HubError::Storage("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    /// Minimal driver error carrying a constraint-violation kind.
    #[derive(Debug)]
    struct ConstraintViolation(sqlx::error::ErrorKind);

    impl std::fmt::Display for ConstraintViolation {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(sqlx::error::DatabaseError::message(self))
        }
    }

    impl std::error::Error for ConstraintViolation {}

    impl sqlx::error::DatabaseError for ConstraintViolation {
        fn message(&self) -> &str {
            r#"duplicate key value violates unique constraint "users_email_key""#
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

        fn constraint(&self) -> Option<&str> {
            Some("users_email_key")
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            match self.0 {
                sqlx::error::ErrorKind::UniqueViolation => sqlx::error::ErrorKind::UniqueViolation,
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    sqlx::error::ErrorKind::ForeignKeyViolation
                }
                _ => sqlx::error::ErrorKind::Other,
            }
        }
    }

    #[tokio::test]
    async fn test_unique_violation_hides_driver_text() {
        let err = HubError::from(sqlx::Error::Database(Box::new(ConstraintViolation(
            sqlx::error::ErrorKind::UniqueViolation,
        ))));
        assert!(matches!(err, HubError::Conflict(_)));

        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let message = v["error"].as_str().unwrap();
        assert!(!message.contains("users_email_key"));
        assert!(!message.contains("duplicate key"));
    }

    #[test]
    fn test_foreign_key_violation_maps_to_not_found() {
        let err = HubError::from(sqlx::Error::Database(Box::new(ConstraintViolation(
            sqlx::error::ErrorKind::ForeignKeyViolation,
        ))));
        assert!(matches!(err, HubError::NotFound(_)));
        assert!(!err.to_string().contains("users_email_key"));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = HubError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, HubError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let resp = HubError::Storage("disk on fire".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["error"], "Storage error");
    }

    #[tokio::test]
    async fn test_domain_errors_carry_message() {
        let resp = HubError::not_found("Report").into_response();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["error"], "Report not found");
    }
}
