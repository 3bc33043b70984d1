// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Finance endpoints demonstrating the two authorization shapes: scoped
//! permissions on the account/transaction routes and a coarse role gate on
//! the admin dashboard. Payloads are placeholders until the ledger domain
//! lands.

use axum::{extract::Path, response::IntoResponse, Json};
use serde_json::json;

use crate::auth::{require_any_role, require_permissions, Auth, AuthError, Decision};

fn check(decision: Decision, err: impl FnOnce(String) -> AuthError) -> Result<(), AuthError> {
    match decision {
        Decision::Allow => Ok(()),
        Decision::Deny { reason } => Err(err(reason)),
    }
}

/// Account details. Requires the `read:accounts` permission.
#[utoipa::path(
    get,
    path = "/accounts/{account_id}",
    params(("account_id" = String, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Account details"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Missing read:accounts permission"),
    ),
    security(("bearer_auth" = [])),
    tag = "finance"
)]
pub async fn get_account(
    Auth(claims): Auth,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, AuthError> {
    check(
        require_permissions(&claims, &["read:accounts"]),
        AuthError::InsufficientPermissions,
    )?;

    Ok(Json(json!({
        "accountId": account_id,
        "ownerId": claims.subject_id,
        "balance": 0,
        "currency": "USD",
    })))
}

/// Record a transaction. Requires the `write:transactions` permission.
#[utoipa::path(
    post,
    path = "/transactions",
    responses(
        (status = 202, description = "Transaction accepted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Missing write:transactions permission"),
    ),
    security(("bearer_auth" = [])),
    tag = "finance"
)]
pub async fn create_transaction(Auth(claims): Auth) -> Result<impl IntoResponse, AuthError> {
    check(
        require_permissions(&claims, &["write:transactions"]),
        AuthError::InsufficientPermissions,
    )?;

    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(json!({
            "transactionId": uuid::Uuid::new_v4().to_string(),
            "status": "accepted",
        })),
    ))
}

/// Operational dashboard. Requires the `admin` role.
#[utoipa::path(
    get,
    path = "/admin/dashboard",
    responses(
        (status = 200, description = "Dashboard summary"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks the admin role"),
    ),
    security(("bearer_auth" = [])),
    tag = "finance"
)]
pub async fn admin_dashboard(Auth(claims): Auth) -> Result<impl IntoResponse, AuthError> {
    check(
        require_any_role(&claims, &["admin"]),
        AuthError::InsufficientRole,
    )?;

    Ok(Json(json!({
        "status": "ok",
        "viewer": claims.subject_id,
    })))
}

#[cfg(test)]
mod tests {
    use crate::api::router;
    use crate::test_util::{forge_jwt, test_state, TEST_AUDIENCE};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    fn token_with(permissions: &[&str], roles: &[&str]) -> String {
        forge_jwt(&json!({
            "sub": "auth0|finance",
            "exp": 9999999999u64,
            (format!("{TEST_AUDIENCE}/permissions")): permissions,
            (format!("{TEST_AUDIENCE}/roles")): roles,
        }))
    }

    async fn status_for(uri: &str, method: &str, token: &str) -> StatusCode {
        let (state, _dir) = test_state();
        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        response.status()
    }

    #[tokio::test]
    async fn account_read_needs_permission() {
        let allowed = token_with(&["read:accounts"], &[]);
        assert_eq!(status_for("/accounts/a1", "GET", &allowed).await, StatusCode::OK);

        let denied = token_with(&["write:transactions"], &[]);
        assert_eq!(
            status_for("/accounts/a1", "GET", &denied).await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn transaction_write_needs_permission() {
        let allowed = token_with(&["write:transactions"], &[]);
        assert_eq!(
            status_for("/transactions", "POST", &allowed).await,
            StatusCode::ACCEPTED
        );

        let denied = token_with(&[], &[]);
        assert_eq!(
            status_for("/transactions", "POST", &denied).await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn dashboard_needs_admin_role() {
        let allowed = token_with(&[], &["admin", "support"]);
        assert_eq!(
            status_for("/admin/dashboard", "GET", &allowed).await,
            StatusCode::OK
        );

        // Permissions do not substitute for the role gate.
        let denied = token_with(&["read:accounts"], &["support"]);
        assert_eq!(
            status_for("/admin/dashboard", "GET", &denied).await,
            StatusCode::FORBIDDEN
        );
    }
}
