// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints: self-service profile operations and the
//! identity-provider sync callback.
//!
//! Bodies are taken as raw JSON and parsed explicitly so schema violations
//! (including unknown fields) map to the 400 validation error instead of
//! axum's default rejection.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Auth, ServiceAuth};
use crate::error::ApiError;
use crate::models::{ProfilePatch, User};
use crate::state::AppState;
use crate::users::{profile, sync, SyncProfile};

/// Response body for the sync callback.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// Internal id of the created or refreshed user.
    pub user_id: String,
    /// Whether this call created the user.
    pub created: bool,
}

fn parse_body<T: serde::de::DeserializeOwned>(body: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::validation(e.to_string()))
}

/// Return the caller's own profile.
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "The caller's profile", body = User),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No local user for this identity"),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_me(
    State(state): State<AppState>,
    Auth(claims): Auth,
) -> Result<Json<User>, ApiError> {
    let user = profile::get_self(&*state.store, &claims.subject_id)?;
    Ok(Json(user))
}

/// Update the caller's own profile.
#[utoipa::path(
    patch,
    path = "/users/me",
    request_body = ProfilePatch,
    responses(
        (status = 200, description = "Updated profile", body = User),
        (status = 400, description = "Invalid patch"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No local user for this identity"),
        (status = 409, description = "Username already taken"),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_me(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<User>, ApiError> {
    let patch: ProfilePatch = parse_body(body)?;
    let user = profile::update_self(&*state.store, &claims.subject_id, &patch)?;
    Ok(Json(user))
}

/// Delete the caller's own account.
#[utoipa::path(
    delete,
    path = "/users/me",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No local user for this identity"),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_me(
    State(state): State<AppState>,
    Auth(claims): Auth,
) -> Result<impl IntoResponse, ApiError> {
    profile::delete_self(&*state.store, &claims.subject_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Identity-provider sync callback. Shared-secret authenticated.
#[utoipa::path(
    post,
    path = "/users/sync",
    request_body = SyncProfile,
    responses(
        (status = 200, description = "User created or refreshed", body = SyncResponse),
        (status = 400, description = "Invalid profile payload"),
        (status = 401, description = "Missing or invalid service secret"),
        (status = 409, description = "Generated username collided"),
    ),
    security(("service_secret" = [])),
    tag = "users"
)]
pub async fn sync_user(
    State(state): State<AppState>,
    _service: ServiceAuth,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<SyncResponse>, ApiError> {
    let profile: SyncProfile = parse_body(body)?;
    let outcome = sync::sync(&*state.store, profile)?;

    tracing::info!(
        user_id = %outcome.user.id,
        created = outcome.created,
        "user sync"
    );

    Ok(Json(SyncResponse {
        user_id: outcome.user.id,
        created: outcome.created,
    }))
}
