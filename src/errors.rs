use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::comments::TreeError;
use crate::repositories::StoreError;

/// Errors surfaced at the request boundary. Each maps to one status code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Stored data breaks an invariant (cycle or corrupt parent chain).
    #[error("inconsistent data: {0}")]
    Inconsistent(#[from] TreeError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidArgument(message.into())
    }

    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{} not found", what))
    }

    pub fn forbidden() -> Self {
        AppError::PermissionDenied("Unauthorized".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(StoreError::InvalidQuery(_)) => StatusCode::BAD_REQUEST,
            AppError::Storage(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
            AppError::Inconsistent(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Storage(StoreError::Database(e)) => {
                error!(error = %e, "Storage failure");
                "Server error".to_string()
            }
            AppError::Inconsistent(e) => {
                error!(error = %e, "Comment tree failed consistency checks");
                "Server error".to_string()
            }
            AppError::Internal(e) => {
                error!(error = %e, "Internal failure");
                "Server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use uuid::Uuid;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(AppError::invalid("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::not_found("Post").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::forbidden().status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Inconsistent(TreeError::Cycle(Uuid::nil())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(StoreError::Duplicate("email")).status(),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn storage_errors_hide_details() {
        let response = AppError::from(StoreError::Database(sqlx::Error::PoolTimedOut)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], "Server error");
    }
}
