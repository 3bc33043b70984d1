// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # HTTP Surface
//!
//! Route tree, middleware stack, and OpenAPI document.
//!
//! Token-authenticated routes live in one subtree wrapped by the auth
//! middleware (outer) and the audit middleware (inner), so every request
//! that reaches a handler has verified claims and an audit entry queued.
//! The sync callback sits outside that subtree: it authenticates with the
//! service secret and carries no user identity to audit.

pub mod audit_layer;
pub mod finance;
pub mod health;
pub mod users;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::middleware::auth_middleware;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::readiness,
        users::get_me,
        users::update_me,
        users::delete_me,
        users::sync_user,
        finance::get_account,
        finance::create_transaction,
        finance::admin_dashboard,
    ),
    components(schemas(
        crate::models::User,
        crate::models::AuditEntry,
        crate::models::ProfilePatch,
        crate::users::SyncProfile,
        users::SyncResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness and readiness probes"),
        (name = "users", description = "Profile operations and identity sync"),
        (name = "finance", description = "Accounts, transactions and admin"),
    ),
    info(
        title = "Finance API Server",
        description = "Backend API with identity-provider authentication, \
                       permission-based authorization and an audit trail.",
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "service_secret",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    // Outer auth, inner audit: claims must be in extensions before the
    // audit layer reads them.
    let authed = Router::new()
        .route(
            "/users/me",
            get(users::get_me)
                .patch(users::update_me)
                .delete(users::delete_me),
        )
        .route("/accounts/{account_id}", get(finance::get_account))
        .route("/transactions", post(finance::create_transaction))
        .route("/admin/dashboard", get(finance::admin_dashboard))
        .layer(from_fn_with_state(state.clone(), audit_layer::audit_middleware))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let public = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/users/sync", post(users::sync_user));

    Router::new()
        .merge(authed)
        .merge(public)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
