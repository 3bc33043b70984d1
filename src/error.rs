// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Service error taxonomy.
//!
//! Every fallible service operation returns an [`ApiError`]; the
//! `IntoResponse` impl is the single place where errors are mapped to
//! HTTP status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Typed service error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No verified identity attached to the request.
    #[error("Unauthorized: {0}")]
    Unauthenticated(String),

    /// Authenticated but missing the required permissions or role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed request body or parameters.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Verified token lacks a usable subject or claim shape.
    #[error("Malformed claims: {0}")]
    MalformedClaims(String),

    /// Generated or requested username collides with an existing one.
    #[error("Username conflict: {0}")]
    UsernameConflict(String),

    /// The referenced record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage or verification collaborator failure.
    #[error("Upstream failure: {0}")]
    Upstream(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: String,
}

impl ApiError {
    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Validation(_) => "validation_error",
            ApiError::MalformedClaims(_) => "malformed_claims",
            ApiError::UsernameConflict(_) => "username_conflict",
            ApiError::NotFound(_) => "not_found",
            ApiError::Upstream(_) => "upstream_unavailable",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) | ApiError::MalformedClaims(_) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::UsernameConflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }
}

impl From<crate::storage::StoreError> for ApiError {
    fn from(err: crate::storage::StoreError) -> Self {
        match err {
            crate::storage::StoreError::UsernameTaken(name) => ApiError::UsernameConflict(name),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(ErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert_eq!(
            ApiError::unauthenticated("x").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::MalformedClaims("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::UsernameConflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Upstream("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn into_response_carries_error_code() {
        let response = ApiError::UsernameConflict("taken".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "username_conflict");
    }
}
