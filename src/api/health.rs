// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Health and readiness probes. Unauthenticated by design.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// Liveness: the process is up and serving.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is alive")),
    tag = "health"
)]
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness: storage reachable, token verification configured.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready"),
        (status = 503, description = "A dependency is unavailable"),
    ),
    tag = "health"
)]
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let store_ok = state.store.count_users().is_ok();

    // In production mode the JWKS cache warms on first use; report its
    // state without failing readiness over a cold cache.
    let jwks_cached = match state.verifier.jwks() {
        Some(jwks) => Some(jwks.is_cached().await),
        None => None,
    };

    let body = json!({
        "status": if store_ok { "ready" } else { "unavailable" },
        "checks": {
            "store": store_ok,
            "jwksCached": jwks_cached,
            "auditDropped": state.audit.dropped_count(),
        },
    });

    let status = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}
