// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware.
//!
//! Applied to router subtrees whose every route requires a verified user
//! token. Verifies the bearer token once, extracts [`Claims`], and inserts
//! them into request extensions so that the downstream audit layer and the
//! `Auth` extractor reuse the same verification result.
//!
//! Apply with `axum::middleware::from_fn_with_state(state, auth_middleware)`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::claims::Claims;
use super::extractor::bearer_token;
use crate::state::AppState;

/// Verify the bearer token and attach claims to the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let claims = async {
        let token = bearer_token(&parts)?;
        let payload = state.verifier.verify(token).await?;
        Claims::extract(&payload, &state.claims_config)
    }
    .await;

    match claims {
        Ok(claims) => {
            parts.extensions.insert(claims);
            next.run(Request::from_parts(parts, body)).await
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{forge_jwt, test_state};
    use axum::{body::Body, http::StatusCode, middleware::from_fn_with_state, routing::get, Router};
    use tower::ServiceExt;

    async fn echo_subject(crate::auth::Auth(claims): crate::auth::Auth) -> String {
        claims.subject_id
    }

    fn app() -> (Router, tempfile::TempDir) {
        let (state, dir) = test_state();
        let router = Router::new()
            .route("/whoami", get(echo_subject))
            .layer(from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state);
        (router, dir)
    }

    #[tokio::test]
    async fn middleware_rejects_anonymous_requests() {
        let (app, _dir) = app();
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn middleware_passes_claims_to_handler() {
        let (app, _dir) = app();
        let token = forge_jwt(&serde_json::json!({
            "sub": "auth0|user1",
            "exp": 9999999999u64,
        }));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"auth0|user1");
    }
}
