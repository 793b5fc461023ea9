//! Central error-to-HTTP mapping.
//!
//! Every route funnels failures through `ApiError` so clients always
//! receive the same JSON shape: `{"error": {"code", "message"}}`.
//! Backend and IO causes are logged raw and returned sanitized.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use desk_common::DeskError;
use serde::Serialize;
use tracing::error;

#[derive(Debug)]
pub struct ApiError(pub DeskError);

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            DeskError::Unauthorized => StatusCode::UNAUTHORIZED,
            DeskError::Forbidden(_) => StatusCode::FORBIDDEN,
            DeskError::Validation(_) => StatusCode::BAD_REQUEST,
            DeskError::NotFound(_) => StatusCode::NOT_FOUND,
            DeskError::Transient(_) => StatusCode::BAD_GATEWAY,
            DeskError::Inconsistency(_) => StatusCode::CONFLICT,
            DeskError::Backend(_) | DeskError::Io(_) | DeskError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match &self.0 {
            DeskError::Unauthorized => "unauthorized",
            DeskError::Forbidden(_) => "forbidden",
            DeskError::Validation(_) => "validation",
            DeskError::NotFound(_) => "not_found",
            DeskError::Transient(_) => "transient",
            DeskError::Inconsistency(_) => "inconsistency",
            DeskError::Backend(_) | DeskError::Io(_) | DeskError::Json(_) => "internal",
        }
    }

    /// Sanitized user-presentable message; raw causes stay in the log.
    fn message(&self) -> String {
        match &self.0 {
            DeskError::Backend(_) | DeskError::Io(_) | DeskError::Json(_) => {
                "Internal error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.message(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<DeskError> for ApiError {
    fn from(e: DeskError) -> Self {
        Self(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert_eq!(ApiError(DeskError::Unauthorized).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError(DeskError::Forbidden("role".into())).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError(DeskError::Validation("bad".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(DeskError::NotFound("ticket".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(DeskError::Transient("timeout".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError(DeskError::Backend("sql".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn backend_messages_are_sanitized() {
        let err = ApiError(DeskError::Backend("no such table: tickets".into()));
        assert_eq!(err.message(), "Internal error");

        let err = ApiError(DeskError::Validation("bad sort".into()));
        assert!(err.message().contains("bad sort"));
    }
}
