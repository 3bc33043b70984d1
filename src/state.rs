// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state.
//!
//! One instance is built at startup and cloned into every request via
//! axum's `State`. All fields are cheap clones (`Arc`s or small strings).

use std::sync::Arc;

use crate::audit::AuditRecorder;
use crate::auth::{ClaimsConfig, ServiceSecretGate, TokenVerifier};
use crate::storage::UserStore;

#[derive(Clone)]
pub struct AppState {
    /// Persistence for users and audit entries.
    pub store: Arc<dyn UserStore>,
    /// Enqueues audit events for the background worker.
    pub audit: AuditRecorder,
    /// Bearer token verification.
    pub verifier: TokenVerifier,
    /// Claim keys to read from verified payloads.
    pub claims_config: Arc<ClaimsConfig>,
    /// Shared-secret gate for the sync callback.
    pub sync_gate: ServiceSecretGate,
}
