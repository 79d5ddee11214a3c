//! API error types and helpers.
//!
//! # Purpose
//! Centralizes HTTP error response construction so error shapes stay uniform
//! across endpoints, and maps gate/store failures onto the HTTP surface:
//! `Unauthenticated` is 401, `PermissionDenied` is 403, and backend failures
//! are 5xx. A failed backend is never reported as a denial.
use crate::api::types::ErrorResponse;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use warden_authz::{AuthzError, StoreError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn api_not_found(message: &str) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "not_found", message)
}

pub fn api_conflict(message: &str) -> ApiError {
    ApiError::new(StatusCode::CONFLICT, "conflict", message)
}

pub fn api_validation_error(message: &str) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "validation_error", message)
}

pub fn api_forbidden(message: &str) -> ApiError {
    ApiError::new(StatusCode::FORBIDDEN, "permission_denied", message)
}

/// Translate a store failure. Internal details are logged server-side and a
/// generic message is returned to the client.
pub fn api_store(context: &str, err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(what) => api_not_found(&what),
        StoreError::Conflict(what) => api_conflict(&what),
        StoreError::Unavailable(_) => {
            tracing::error!(error = %err, context, "storage unavailable");
            ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "unavailable", context)
        }
        StoreError::Unexpected(_) => {
            tracing::error!(error = %err, context, "storage error");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", context)
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Unauthenticated(message) => {
                ApiError::new(StatusCode::UNAUTHORIZED, "unauthenticated", message)
            }
            AuthzError::PermissionDenied(method) => ApiError::new(
                StatusCode::FORBIDDEN,
                "permission_denied",
                format!("not authorized for {method}"),
            ),
            AuthzError::Unavailable(_) => {
                tracing::error!(error = %err, "authorization backend unavailable");
                ApiError::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable",
                    "authorization could not be decided",
                )
            }
            AuthzError::Internal(_) => {
                tracing::error!(error = %err, "authorization failure");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "authorization could not be decided",
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_build_expected_codes() {
        assert_eq!(api_not_found("missing").status, StatusCode::NOT_FOUND);
        assert_eq!(api_conflict("exists").status, StatusCode::CONFLICT);
        assert_eq!(
            api_validation_error("bad").status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(api_forbidden("nope").status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn authz_errors_map_to_http_statuses() {
        let unauthenticated =
            ApiError::from(AuthzError::Unauthenticated("missing token".to_string()));
        assert_eq!(unauthenticated.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unauthenticated.body.code, "unauthenticated");

        let denied =
            ApiError::from(AuthzError::PermissionDenied("/svc.Thing/Get".to_string()));
        assert_eq!(denied.status, StatusCode::FORBIDDEN);

        let unavailable = ApiError::from(AuthzError::Unavailable("store down".to_string()));
        assert_eq!(unavailable.status, StatusCode::SERVICE_UNAVAILABLE);
        // A backend failure must be distinguishable from a denial.
        assert_ne!(unavailable.body.code, "permission_denied");
    }

    #[test]
    fn store_errors_map_to_http_statuses() {
        assert_eq!(
            api_store("ctx", StoreError::NotFound("role x".to_string())).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            api_store("ctx", StoreError::Conflict("role x".to_string())).status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            api_store("ctx", StoreError::Unavailable("pool".to_string())).status,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            api_store("ctx", StoreError::Unexpected(anyhow::anyhow!("boom"))).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
