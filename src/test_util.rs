// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared test fixtures: a fully wired application state on a temporary
//! database, and unsigned JWTs for the development decode path.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::audit::AuditRecorder;
use crate::auth::{ClaimsConfig, ServiceSecretGate, TokenVerifier};
use crate::config::AuditConfig;
use crate::state::AppState;
use crate::storage::{TimedStore, UserDatabase};

pub const TEST_SYNC_SECRET: &str = "test-sync-secret";
pub const TEST_AUDIENCE: &str = "https://api.example.com";

/// Application state backed by a tempdir database, with signature
/// verification disabled so tests can forge tokens.
///
/// The returned `TempDir` must outlive the state.
pub fn test_state() -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = UserDatabase::open(&dir.path().join("test.redb")).unwrap();

    let state = AppState {
        store: Arc::new(TimedStore::new(db)),
        audit: AuditRecorder::new(&AuditConfig::default()),
        verifier: TokenVerifier::insecure_dev("https://tenant.auth.example.com/", TEST_AUDIENCE),
        claims_config: Arc::new(ClaimsConfig {
            permissions_claim: format!("{TEST_AUDIENCE}/permissions"),
            roles_claim: format!("{TEST_AUDIENCE}/roles"),
        }),
        sync_gate: ServiceSecretGate::new(TEST_SYNC_SECRET).unwrap(),
    };
    (state, dir)
}

/// Forge an unsigned JWT accepted by the development verifier.
pub fn forge_jwt(claims: &serde_json::Value) -> String {
    let header = r#"{"alg":"RS256","typ":"JWT"}"#;
    let header_b64 = URL_SAFE_NO_PAD.encode(header.as_bytes());
    let claims_b64 = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{header_b64}.{claims_b64}.fake_signature")
}
