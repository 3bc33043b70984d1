// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit middleware for authenticated routes.
//!
//! Layered inside the auth middleware, so the verified [`Claims`] are
//! already in request extensions. Buffers the request body to capture it in
//! the audit metadata, then replays it downstream unchanged. Recording is
//! fire-and-forget: the response never waits on, or fails because of, the
//! audit queue.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::USER_AGENT,
    middleware::Next,
    response::Response,
};

use crate::audit::AuditEvent;
use crate::auth::Claims;
use crate::state::AppState;

/// Bodies larger than this are audited without their content.
const MAX_CAPTURED_BODY: usize = 64 * 1024;

pub async fn audit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let subject_id = parts
        .extensions
        .get::<Claims>()
        .map(|claims| claims.subject_id.clone());

    let method = parts.method.to_string();
    let path = parts.uri.path().to_string();
    let ip_address = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    let user_agent = parts
        .headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    // Buffer so the body can be both audited and replayed downstream.
    let bytes = match axum::body::to_bytes(body, MAX_CAPTURED_BODY).await {
        Ok(bytes) => bytes,
        Err(_) => {
            // Oversized or unreadable body: audit without content, let the
            // handler produce its own error.
            if let Some(subject_id) = subject_id {
                state.audit.record(AuditEvent {
                    subject_id,
                    method,
                    path,
                    ip_address,
                    user_agent,
                    body: None,
                });
            }
            return next
                .run(Request::from_parts(parts, Body::empty()))
                .await;
        }
    };

    if let Some(subject_id) = subject_id {
        let body_json = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };
        state.audit.record(AuditEvent {
            subject_id,
            method,
            path,
            ip_address,
            user_agent,
            body: body_json,
        });
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
