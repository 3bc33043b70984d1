// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated requests.
//!
//! Use the `Auth` extractor in handlers to require a verified user token:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(claims): Auth) -> impl IntoResponse {
//!     // claims.subject_id is the verified identity-provider subject
//! }
//! ```
//!
//! `ServiceAuth` is the shared-secret counterpart for the sync callback.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::claims::Claims;
use super::error::AuthError;
use crate::state::AppState;

/// Pull the bearer credential out of the Authorization header.
pub(crate) fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Extractor requiring a verified user token.
///
/// Prefers claims already placed in request extensions by the auth
/// middleware; falls back to verifying the bearer token itself so handlers
/// stay usable on routes without the middleware stack.
pub struct Auth(pub Claims);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>().cloned() {
            return Ok(Auth(claims));
        }

        let token = bearer_token(parts)?;
        let payload = state.verifier.verify(token).await?;
        let claims = Claims::extract(&payload, &state.claims_config)?;

        Ok(Auth(claims))
    }
}

/// Extractor requiring the service-to-service shared secret.
///
/// Carries no user identity: the caller is the identity provider's backend,
/// not an end user.
pub struct ServiceAuth;

impl FromRequestParts<AppState> for ServiceAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = bearer_token(parts).ok();
        if state.sync_gate.verify(presented).is_allow() {
            Ok(ServiceAuth)
        } else {
            Err(AuthError::InvalidServiceSecret)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{forge_jwt, test_state};
    use axum::http::Request;

    #[tokio::test]
    async fn auth_requires_header() {
        let (state, _dir) = test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_succeeds_with_dev_jwt() {
        let (state, _dir) = test_state();
        let token = forge_jwt(&serde_json::json!({
            "sub": "auth0|user1",
            "exp": 9999999999u64,
            "https://api.example.com/permissions": ["read:accounts"],
        }));

        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let Auth(claims) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(claims.subject_id, "auth0|user1");
        assert!(claims.has_permission("read:accounts"));
    }

    #[tokio::test]
    async fn auth_prefers_extensions() {
        let (state, _dir) = test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let claims = Claims {
            subject_id: "auth0|from_middleware".to_string(),
            permissions: Default::default(),
            roles: Default::default(),
            extra: Default::default(),
        };
        parts.extensions.insert(claims);

        let Auth(extracted) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(extracted.subject_id, "auth0|from_middleware");
    }

    #[tokio::test]
    async fn auth_rejects_token_without_sub() {
        let (state, _dir) = test_state();
        let token = forge_jwt(&serde_json::json!({"exp": 9999999999u64}));

        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MalformedClaims(_))));
    }

    #[tokio::test]
    async fn service_auth_accepts_correct_secret() {
        let (state, _dir) = test_state();
        let mut parts = Request::builder()
            .uri("/users/sync")
            .header("Authorization", "Bearer test-sync-secret")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        assert!(ServiceAuth::from_request_parts(&mut parts, &state)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn service_auth_rejects_missing_and_wrong_secret() {
        let (state, _dir) = test_state();

        let mut bare = Request::builder()
            .uri("/users/sync")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        assert!(matches!(
            ServiceAuth::from_request_parts(&mut bare, &state).await,
            Err(AuthError::InvalidServiceSecret)
        ));

        let mut wrong = Request::builder()
            .uri("/users/sync")
            .header("Authorization", "Bearer incorrect-secret")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        assert!(matches!(
            ServiceAuth::from_request_parts(&mut wrong, &state).await,
            Err(AuthError::InvalidServiceSecret)
        ));
    }
}
